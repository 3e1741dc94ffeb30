//! Narrowest-dtype selection for integer columns and string-pool index
//! arrays (§4.1, §4.2).
//!
//! Every stored integer column reserves its type's minimum value as the
//! "missing" sentinel, so a column's usable range is
//! `[MIN + 1, MAX]`. The loader always picks the narrowest signed width
//! that covers both the real data range and that reservation.

use serde::{Deserialize, Serialize};

/// The concrete on-disk width of an integer column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum IntDtype {
    I8,
    I16,
    I32,
    I64,
}

impl IntDtype {
    pub fn byte_width(self) -> usize {
        match self {
            IntDtype::I8 => 1,
            IntDtype::I16 => 2,
            IntDtype::I32 => 4,
            IntDtype::I64 => 8,
        }
    }

    /// The sentinel value reserved for "no value stored", always the
    /// type's minimum representable value.
    pub fn sentinel(self) -> i64 {
        match self {
            IntDtype::I8 => i64::from(i8::MIN),
            IntDtype::I16 => i64::from(i16::MIN),
            IntDtype::I32 => i64::from(i32::MIN),
            IntDtype::I64 => i64::MIN,
        }
    }

    fn usable_range(self) -> (i64, i64) {
        match self {
            IntDtype::I8 => (i64::from(i8::MIN) + 1, i64::from(i8::MAX)),
            IntDtype::I16 => (i64::from(i16::MIN) + 1, i64::from(i16::MAX)),
            IntDtype::I32 => (i64::from(i32::MIN) + 1, i64::from(i32::MAX)),
            IntDtype::I64 => (i64::MIN + 1, i64::MAX),
        }
    }

    /// Picks the narrowest dtype whose usable range (after reserving
    /// the sentinel) covers `[min_val, max_val]`. Returns `I8` for an
    /// empty column (no values at all), matching the "reserve one
    /// sentinel" contract trivially.
    pub fn narrowest_for_range(min_val: i64, max_val: i64) -> IntDtype {
        for dtype in [IntDtype::I8, IntDtype::I16, IntDtype::I32, IntDtype::I64] {
            let (lo, hi) = dtype.usable_range();
            if min_val >= lo && max_val <= hi {
                return dtype;
            }
        }
        IntDtype::I64
    }

    /// Picks the narrowest *unsigned-feeling* dtype sized only by how
    /// many distinct values must be addressable — used for string-pool
    /// index arrays and CSR offsets, where values are always `>= 0` and
    /// the count of distinct entries is what bounds the width. `0` is
    /// reserved as `MISSING_STR_INDEX`, so the usable count is
    /// `count` entries starting at index `1`.
    pub fn narrowest_for_count(count: u64) -> IntDtype {
        IntDtype::narrowest_for_range(0, count as i64)
    }

    pub fn encode_le(self, value: i64, out: &mut Vec<u8>) {
        match self {
            IntDtype::I8 => out.push(value as i8 as u8),
            IntDtype::I16 => out.extend_from_slice(&(value as i16).to_le_bytes()),
            IntDtype::I32 => out.extend_from_slice(&(value as i32).to_le_bytes()),
            IntDtype::I64 => out.extend_from_slice(&value.to_le_bytes()),
        }
    }

    pub fn decode_le(self, bytes: &[u8]) -> i64 {
        match self {
            IntDtype::I8 => bytes[0] as i8 as i64,
            IntDtype::I16 => i16::from_le_bytes([bytes[0], bytes[1]]) as i64,
            IntDtype::I32 => {
                i32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]) as i64
            }
            IntDtype::I64 => {
                let mut b = [0u8; 8];
                b.copy_from_slice(&bytes[..8]);
                i64::from_le_bytes(b)
            }
        }
    }
}

#[cfg(test)]
#[path = "dtype_test.rs"]
mod dtype_test;
