use super::*;
use crate::compiler::EdgeValue;
use crate::facade::FeatureValue;
use crate::types::TypeRange;

/// Slots 1..=7, one `phrase` type (level 1) with two instances
/// (`[1,2,3]` -> node 8, `[5,6,7]` -> node 9) and one `sentence` type
/// (level 2) spanning both (`[1..7]` -> node 10). Matches the worked
/// example in locality_test.rs.
fn fixture_source() -> CorpusSource {
    CorpusSource {
        max_slot: 7,
        type_ranges: vec![
            TypeRange { otype: "phrase".to_string(), first: 8, last: 9, level: 1 },
            TypeRange { otype: "sentence".to_string(), first: 10, last: 10, level: 2 },
        ],
        node_slots: vec![
            vec![1],
            vec![2],
            vec![3],
            vec![4],
            vec![5],
            vec![6],
            vec![7],
            vec![1, 2, 3],
            vec![5, 6, 7],
            vec![1, 2, 3, 4, 5, 6, 7],
        ],
        int_features: vec![("pos".to_string(), vec![(1, 0), (2, 1), (3, 2)])],
        str_features: vec![(
            "word".to_string(),
            vec![(1, "the".to_string()), (2, "cat".to_string())],
        )],
        edges: vec![("next".to_string(), vec![vec![2], vec![3], vec![]])],
        edge_values: vec![(
            "dep".to_string(),
            vec![vec![(2, EdgeValue::Str("nsubj".to_string()))]],
        )],
        content_bytes: b"fixture v1".to_vec(),
    }
}

#[test]
fn test_compile_and_open_round_trips_node_features() {
    let dir = tempfile::tempdir().unwrap();
    let cfg = LoaderConfig::default();
    let corpus = Corpus::compile_and_open(&fixture_source(), dir.path(), &cfg).unwrap();

    assert_eq!(corpus.max_node(), 10);
    assert_eq!(corpus.max_slot(), 7);
    assert_eq!(corpus.f().v("pos", 1).unwrap(), Some(FeatureValue::Int(0)));
    assert_eq!(
        corpus.f().v("word", 2).unwrap(),
        Some(FeatureValue::Str("cat".to_string()))
    );
    assert_eq!(corpus.f().v("word", 3).unwrap(), None);
}

#[test]
fn test_compile_and_open_round_trips_edge_features() {
    let dir = tempfile::tempdir().unwrap();
    let cfg = LoaderConfig::default();
    let corpus = Corpus::compile_and_open(&fixture_source(), dir.path(), &cfg).unwrap();

    let next = corpus.e().get("next").unwrap();
    assert_eq!(next.targets(1), vec![2]);

    let dep = corpus.e().get("dep").unwrap();
    assert_eq!(
        dep.get_as_dict(1),
        vec![(2, Some(FeatureValue::Str("nsubj".to_string())))]
    );
}

#[test]
fn test_compile_and_open_builds_locality_and_computed_facades() {
    let dir = tempfile::tempdir().unwrap();
    let cfg = LoaderConfig::default();
    let corpus = Corpus::compile_and_open(&fixture_source(), dir.path(), &cfg).unwrap();

    assert_eq!(corpus.l().d(8, None), vec![1, 2, 3]);
    assert_eq!(corpus.l().u(1, Some("phrase")), vec![8]);
    assert!(corpus.c().get("levUp").is_ok());
    assert!(corpus.c().get("levDown").is_ok());
    assert!(matches!(
        corpus.c().get("bogus"),
        Err(crate::error::Error::UnknownFeature(_))
    ));
}

#[test]
fn test_open_without_prior_compile_fails() {
    let dir = tempfile::tempdir().unwrap();
    let cfg = LoaderConfig::default();
    assert!(Corpus::open(dir.path(), &cfg).is_err());
}

#[test]
fn test_reopen_reuses_cache_without_recompiling() {
    let dir = tempfile::tempdir().unwrap();
    let cfg = LoaderConfig::default();
    Corpus::compile_and_open(&fixture_source(), dir.path(), &cfg).unwrap();

    // A plain `open`, with no source, must succeed against the cache
    // a prior `compile_and_open` already produced.
    let corpus = Corpus::open(dir.path(), &cfg).unwrap();
    assert_eq!(corpus.max_node(), 10);
}

#[test]
fn test_unknown_feature_name_fails_loudly() {
    let dir = tempfile::tempdir().unwrap();
    let cfg = LoaderConfig::default();
    let corpus = Corpus::compile_and_open(&fixture_source(), dir.path(), &cfg).unwrap();
    assert!(matches!(
        corpus.f().v("nonexistent", 1),
        Err(crate::error::Error::UnknownFeature(_))
    ));
}
