use super::*;
use crate::config::EmbeddingCacheMode;
use crate::embed::build_lev_up_down;
use crate::types::{TypeRange, TypeTable};

#[test]
fn test_f_int_and_str_lookup() {
    let mut f = F::new();
    f.insert_int("length", IntColumn::build(5, &[(1, 3), (2, 7)]));
    f.insert_str(
        "word",
        StringPool::build(5, &[(1, "hello".to_string()), (2, "world".to_string())]),
    );

    assert_eq!(f.v("length", 1).unwrap(), Some(FeatureValue::Int(3)));
    assert_eq!(f.v("length", 3).unwrap(), None);
    assert_eq!(
        f.v("word", 2).unwrap(),
        Some(FeatureValue::Str("world".to_string()))
    );
}

#[test]
fn test_f_unknown_feature_fails_loudly() {
    let f = F::new();
    let err = f.v("nonexistent", 1).unwrap_err();
    assert!(matches!(err, Error::UnknownFeature(_)));
}

#[test]
fn test_f_typed_accessors_reject_wrong_kind() {
    let mut f = F::new();
    f.insert_int("length", IntColumn::build(5, &[(1, 3)]));
    assert!(f.int_column("length").is_ok());
    assert!(f.string_pool("length").is_err());
}

#[test]
fn test_e_plain_synthesizes_absent_values() {
    let mut e = E::new();
    e.insert(
        "mother",
        EdgeFeature::Plain(CSRArray::build(&[vec![], vec![], vec![], vec![4], vec![]])),
    );
    let dict = e.get("mother").unwrap().get_as_dict(4);
    assert_eq!(dict, vec![(4, None)]);
}

#[test]
fn test_e_with_value_resolves_string_codes() {
    let pool_vals = vec![(1, "subject".to_string())];
    let pool = StringPool::build(1, &pool_vals);
    let code = pool.get_value_index("subject").unwrap();

    let csr = CSRArrayWithValues::build(&[vec![(2, code)]]);
    let mut e = E::new();
    e.insert("role", EdgeFeature::WithValue(csr, Some(pool)));

    let dict = e.get("role").unwrap().get_as_dict(1);
    assert_eq!(dict, vec![(2, Some(FeatureValue::Str("subject".to_string())))]);
}

#[test]
fn test_e_filter_sources_with_targets_in_matches_spec_scenario() {
    let mut e = E::new();
    e.insert(
        "mother",
        EdgeFeature::Plain(CSRArray::build(&[
            vec![],
            vec![],
            vec![],
            vec![],
            vec![4],
            vec![],
            vec![4],
        ])),
    );
    let mother = e.get("mother").unwrap();
    let (sources, targets) = mother.filter_sources_with_targets_in(&[5, 6, 7], &[4]);
    assert_eq!(sources, [5u32, 7u32].into_iter().collect());
    assert_eq!(targets, [4u32].into_iter().collect());
}

#[test]
fn test_c_exposes_lev_up_and_down_only() {
    let types = TypeTable {
        max_slot: 3,
        max_node: 4,
        ranges: vec![TypeRange {
            otype: "phrase".to_string(),
            first: 4,
            last: 4,
            level: 1,
        }],
    };
    let node_slots = vec![vec![1], vec![2], vec![3], vec![1, 2, 3]];
    let (up, down) = build_lev_up_down(&types, &node_slots);
    let embed = EmbeddingIndex::new(up, down, EmbeddingCacheMode::Off);
    let c = C::new(&embed);

    assert_eq!(c.get("levUp").unwrap().get(1), vec![4]);
    assert_eq!(c.get("levDown").unwrap().get(4), vec![1, 2, 3]);
    assert!(matches!(c.get("nonexistent"), Err(Error::UnknownFeature(_))));
}
