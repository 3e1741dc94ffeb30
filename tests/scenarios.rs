//! End-to-end scenarios, one per seed test named in the testable
//! properties section of the specification this crate implements.

use context_fabric::compiler::CorpusSource;
use context_fabric::config::LoaderConfig;
use context_fabric::loader::Corpus;
use context_fabric::manifest::Manifest;
use context_fabric::types::TypeRange;

/// "In the beginning God created the heavens", 7 slots, tagged with a
/// `pos` string feature.
fn genesis_source(payload: &[u8]) -> CorpusSource {
    let words = ["In", "the", "beginning", "God", "created", "the", "heavens"];
    let pos = ["ADP", "DET", "NOUN", "NOUN", "VERB", "DET", "NOUN"];
    CorpusSource {
        max_slot: 7,
        type_ranges: vec![TypeRange {
            otype: "phrase".to_string(),
            first: 8,
            last: 8,
            level: 1,
        }],
        node_slots: vec![
            vec![1],
            vec![2],
            vec![3],
            vec![4],
            vec![5],
            vec![6],
            vec![7],
            vec![1, 2, 3],
        ],
        int_features: vec![],
        str_features: vec![
            (
                "word".to_string(),
                (1..=7).map(|n| (n, words[(n - 1) as usize].to_string())).collect(),
            ),
            (
                "pos".to_string(),
                (1..=7).map(|n| (n, pos[(n - 1) as usize].to_string())).collect(),
            ),
        ],
        edges: vec![("mother".to_string(), vec![
            vec![], vec![], vec![], vec![], vec![4], vec![], vec![4], vec![],
        ])],
        edge_values: vec![],
        content_bytes: payload.to_vec(),
    }
}

#[test]
fn scenario_1_mini_corpus_basic_f() {
    let dir = tempfile::tempdir().unwrap();
    let cfg = LoaderConfig::default();
    let corpus = Corpus::compile_and_open(&genesis_source(b"genesis"), dir.path(), &cfg).unwrap();

    let pos = corpus.f().string_pool("pos").unwrap();
    let nodes: Vec<u32> = (1..=7).collect();
    let mut hit = pos.filter_by_values(&nodes, &["NOUN", "VERB"]);
    hit.sort_unstable();
    assert_eq!(hit, vec![3, 4, 5, 7]);
}

#[test]
fn scenario_2_edge_csr() {
    let dir = tempfile::tempdir().unwrap();
    let cfg = LoaderConfig::default();
    let corpus = Corpus::compile_and_open(&genesis_source(b"genesis"), dir.path(), &cfg).unwrap();

    let mother = corpus.e().get("mother").unwrap();
    assert_eq!(mother.get_as_dict(5), vec![(4, None)]);

    let (sources, targets) = mother.filter_sources_with_targets_in(&[5, 6, 7], &[4]);
    assert_eq!(sources, [5u32, 7u32].into_iter().collect());
    assert_eq!(targets, [4u32].into_iter().collect());
}

#[test]
fn scenario_3_embedding_and_locality() {
    let dir = tempfile::tempdir().unwrap();
    let cfg = LoaderConfig::default();
    let corpus = Corpus::compile_and_open(&genesis_source(b"genesis"), dir.path(), &cfg).unwrap();

    let loc = corpus.l();
    assert_eq!(loc.d(8, None), vec![1, 2, 3]);
    assert_eq!(loc.u(1, Some("phrase")), vec![8]);
    // There is only one phrase in this fixture, so the next-phrase
    // query is correctly empty; a second phrase is added in
    // locality_test.rs's richer fixture to exercise a real hit.
    assert_eq!(loc.n(8, Some("phrase")), Vec::<u32>::new());
}

#[test]
fn scenario_4_preload_equivalence() {
    let dir = tempfile::tempdir().unwrap();
    let cfg = LoaderConfig::default();
    let corpus = Corpus::compile_and_open(&genesis_source(b"genesis"), dir.path(), &cfg).unwrap();

    let nodes: Vec<u32> = (1..=7).collect();
    let before_pos = corpus.f().string_pool("pos").unwrap().filter_by_values(&nodes, &["NOUN", "VERB"]);
    let before_mother = corpus.e().get("mother").unwrap().filter_sources_with_targets_in(&[5, 6, 7], &[4]);
    let before_up = corpus.c().get("levUp").unwrap().get(1);

    corpus.c().get("levUp").unwrap().preload_to_ram();

    let after_pos = corpus.f().string_pool("pos").unwrap().filter_by_values(&nodes, &["NOUN", "VERB"]);
    let after_mother = corpus.e().get("mother").unwrap().filter_sources_with_targets_in(&[5, 6, 7], &[4]);
    let after_up = corpus.c().get("levUp").unwrap().get(1);

    assert_eq!(before_pos, after_pos);
    assert_eq!(before_mother, after_mother);
    assert_eq!(before_up, after_up);
}

#[test]
fn scenario_5_cache_versioning_forces_recompile() {
    let dir = tempfile::tempdir().unwrap();
    let cfg = LoaderConfig::default();
    let source = genesis_source(b"genesis");

    let first = Corpus::compile_and_open(&source, dir.path(), &cfg).unwrap();
    let first_content_hash = {
        let manifest = Manifest::load(&cfg.cache_dir(dir.path()).join("manifest")).unwrap();
        manifest.content_hash.clone()
    };
    drop(first);

    // Simulate a stale cache by corrupting the on-disk manifest's
    // version field directly (format_version is a crate-internal
    // constant, not a configuration knob, so this is the only way to
    // manufacture a version-mismatched cache from the outside).
    let manifest_path = cfg.cache_dir(dir.path()).join("manifest");
    let body = std::fs::read_to_string(&manifest_path).unwrap();
    let corrupted = body.replacen("\"format_version\": 1", "\"format_version\": 999", 1);
    assert_ne!(body, corrupted, "manifest JSON must contain the version field verbatim");
    std::fs::write(&manifest_path, corrupted).unwrap();

    assert!(Corpus::open(dir.path(), &cfg).is_err());

    let recompiled = Corpus::compile_and_open(&source, dir.path(), &cfg).unwrap();
    assert_eq!(recompiled.max_node(), 8);
    let manifest = Manifest::load(&manifest_path).unwrap();
    assert_eq!(manifest.format_version, context_fabric::manifest::FORMAT_VERSION);
    assert_eq!(manifest.content_hash, first_content_hash);
}

#[test]
fn scenario_6_out_of_range_is_absent_never_raises() {
    let dir = tempfile::tempdir().unwrap();
    let cfg = LoaderConfig::default();
    let corpus = Corpus::compile_and_open(&genesis_source(b"genesis"), dir.path(), &cfg).unwrap();

    assert_eq!(corpus.f().v("pos", 0).unwrap(), None);
    assert_eq!(corpus.f().v("pos", 1_000_000_000).unwrap(), None);
    assert_eq!(corpus.f().v("pos", u32::MAX).unwrap(), None);
}
