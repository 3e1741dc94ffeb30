use super::*;
use crate::types::TypeRange;

fn sample() -> Manifest {
    Manifest {
        format_version: FORMAT_VERSION,
        max_node: 10,
        max_slot: 7,
        type_ranges: vec![TypeRange {
            otype: "phrase".to_string(),
            first: 8,
            last: 9,
            level: 1,
        }],
        span_dtype: IntDtype::I8,
        min_slot_path: PathBuf::from("computed/minSlot.i8"),
        max_slot_path: PathBuf::from("computed/maxSlot.i8"),
        lev_up_offsets_path: PathBuf::from("computed/levUp.offsets"),
        lev_up_data_path: PathBuf::from("computed/levUp.data"),
        lev_down_offsets_path: PathBuf::from("computed/levDown.offsets"),
        lev_down_data_path: PathBuf::from("computed/levDown.data"),
        features: vec![
            FeatureEntry::Int {
                name: "length".to_string(),
                dtype: IntDtype::I8,
                path: PathBuf::from("features/length.i8"),
            },
            FeatureEntry::Str {
                name: "word".to_string(),
                dtype: IntDtype::I8,
                pool_path: PathBuf::from("features/word.pool"),
                idx_path: PathBuf::from("features/word.idx"),
            },
            FeatureEntry::Computed {
                name: "levUp".to_string(),
            },
        ],
        content_hash: hash_content(&[b"hello"]),
    }
}

#[test]
fn test_check_version_ok() {
    assert!(sample().check_version().is_ok());
}

#[test]
fn test_check_version_mismatch() {
    let mut m = sample();
    m.format_version = FORMAT_VERSION + 1;
    let err = m.check_version().unwrap_err();
    assert!(matches!(err, Error::VersionMismatch { .. }));
}

#[test]
fn test_feature_lookup_and_unknown() {
    let m = sample();
    assert!(m.feature("word").is_ok());
    assert!(matches!(
        m.feature("nonexistent").unwrap_err(),
        Error::UnknownFeature(_)
    ));
}

#[test]
fn test_save_load_roundtrip() {
    let m = sample();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("manifest");
    m.save(dir.path(), &path).unwrap();

    let loaded = Manifest::load(&path).unwrap();
    assert_eq!(loaded.max_node, m.max_node);
    assert_eq!(loaded.content_hash, m.content_hash);
    assert_eq!(loaded.features.len(), m.features.len());
}

#[test]
fn test_content_hash_deterministic_and_sensitive() {
    let a = hash_content(&[b"abc", b"def"]);
    let b = hash_content(&[b"abc", b"def"]);
    let c = hash_content(&[b"abcd", b"ef"]);
    assert_eq!(a, b);
    assert_ne!(a, c);
}
