use super::*;

#[test]
fn test_narrowest_for_small_range() {
    assert_eq!(IntDtype::narrowest_for_range(0, 10), IntDtype::I8);
    assert_eq!(IntDtype::narrowest_for_range(-100, 100), IntDtype::I16);
    assert_eq!(IntDtype::narrowest_for_range(0, 1_000_000), IntDtype::I32);
    assert_eq!(
        IntDtype::narrowest_for_range(0, i64::from(i32::MAX) + 1),
        IntDtype::I64
    );
}

#[test]
fn test_empty_column_picks_i8() {
    // sentinel-only column (min > max signals "no data")
    assert_eq!(IntDtype::narrowest_for_range(0, 0), IntDtype::I8);
}

#[test]
fn test_narrowest_for_count() {
    assert_eq!(IntDtype::narrowest_for_count(5), IntDtype::I8);
    assert_eq!(IntDtype::narrowest_for_count(200), IntDtype::I16);
}

#[test]
fn test_encode_decode_roundtrip_all_widths() {
    for dtype in [IntDtype::I8, IntDtype::I16, IntDtype::I32, IntDtype::I64] {
        let (lo, hi) = dtype.usable_range();
        for v in [lo, 0, hi, dtype.sentinel()] {
            let mut buf = Vec::new();
            dtype.encode_le(v, &mut buf);
            assert_eq!(buf.len(), dtype.byte_width());
            assert_eq!(dtype.decode_le(&buf), v);
        }
    }
}

#[test]
fn test_sentinel_values() {
    assert_eq!(IntDtype::I8.sentinel(), -128);
    assert_eq!(IntDtype::I16.sentinel(), -32768);
    assert_eq!(IntDtype::I32.sentinel(), -2147483648);
}
