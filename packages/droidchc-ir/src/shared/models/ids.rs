//! Stable identifiers
//!
//! Classes, methods, fields and allocation sites are named by 32-bit hashes of
//! their descriptor strings so that relation names are identical across runs.

use serde::{Deserialize, Serialize};
use std::fmt;

pub type ClassId = i32;
pub type MethodId = i32;
pub type FieldId = i32;
pub type InstanceId = i32;

/// `String.hashCode` over UTF-16 code units, wrapping.
pub fn java_hash(s: &str) -> i32 {
    s.encode_utf16()
        .fold(0i32, |h, unit| h.wrapping_mul(31).wrapping_add(i32::from(unit)))
}

/// Identity of the allocation site at `(class, method, pc)`.
pub fn allocation_hash(class: ClassId, method: MethodId, pc: u32) -> InstanceId {
    [class, method, pc as i32]
        .iter()
        .fold(1i32, |h, x| h.wrapping_mul(31).wrapping_add(*x))
}

/// Two's-complement bit pattern of `value`, truncated to `width` bits.
pub fn bv_literal(value: i64, width: u32) -> u128 {
    (i128::from(value) as u128) & mask(width)
}

pub(crate) fn mask(width: u32) -> u128 {
    if width >= 128 {
        u128::MAX
    } else {
        (1u128 << width) - 1
    }
}

/// `(class, method, pc)`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ProgramPoint {
    pub class: ClassId,
    pub method: MethodId,
    pub pc: u32,
}

impl ProgramPoint {
    pub fn new(class: ClassId, method: MethodId, pc: u32) -> Self {
        Self { class, method, pc }
    }

    /// Same method, another pc
    pub fn at(&self, pc: u32) -> Self {
        Self { pc, ..*self }
    }

    /// Name of the point relation `R_<c>_<m>_<pc>`
    pub fn relation_name(&self) -> String {
        format!("R_{}_{}_{}", self.class, self.method, self.pc)
    }
}

impl fmt::Display for ProgramPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}@{}", self.class, self.method, self.pc)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_java_hash_matches_string_hash_code() {
        assert_eq!(java_hash(""), 0);
        assert_eq!(java_hash("a"), 97);
        assert_eq!(java_hash("hello"), 99162322);
        assert_eq!(java_hash("x:I"), 117191);
    }

    #[test]
    fn test_java_hash_wraps() {
        // long descriptors overflow i32 many times over
        let h = java_hash("Landroid/telephony/TelephonyManager;");
        assert_eq!(h, java_hash("Landroid/telephony/TelephonyManager;"));
    }

    #[test]
    fn test_allocation_hash() {
        assert_eq!(allocation_hash(1, 2, 3), ((31 + 1) * 31 + 2) * 31 + 3);
        assert_ne!(allocation_hash(1, 2, 3), allocation_hash(1, 2, 4));
    }

    #[test]
    fn test_bv_literal_sign_extends() {
        assert_eq!(bv_literal(-1, 8), 0xff);
        assert_eq!(bv_literal(-1, 64), u64::MAX as u128);
        assert_eq!(bv_literal(-1, 128), u128::MAX);
        assert_eq!(bv_literal(300, 8), 44);
    }

    #[test]
    fn test_relation_name() {
        let p = ProgramPoint::new(-5, 7, 2);
        assert_eq!(p.relation_name(), "R_-5_7_2");
        assert_eq!(p.at(9).pc, 9);
    }
}
