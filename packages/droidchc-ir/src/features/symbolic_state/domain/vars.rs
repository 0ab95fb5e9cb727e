//! Canonical variable names
//!
//! Every clause reuses the same names: the pre-state of an instruction is
//! always written over `v<i> h<i> l<i> g<i>` and `lhv<k> … lhf<k>`, and a
//! callee's exit heap over `lhcv<k> … lhcf<k>`. Names never collide across
//! sorts, which the exporter relies on when declaring them globally.

pub fn value(i: u32) -> String {
    format!("v{}", i)
}

pub fn high(i: u32) -> String {
    format!("h{}", i)
}

pub fn local(i: u32) -> String {
    format!("l{}", i)
}

pub fn global(i: u32) -> String {
    format!("g{}", i)
}

/// Prefix of the caller's local heap
pub const HEAP: &str = "lh";
/// Prefix of a callee's exit local heap
pub const CALLEE_HEAP: &str = "lhc";

pub fn heap_value(prefix: &str, k: usize) -> String {
    format!("{}v{}", prefix, k)
}

pub fn heap_high(prefix: &str, k: usize) -> String {
    format!("{}h{}", prefix, k)
}

pub fn heap_local(prefix: &str, k: usize) -> String {
    format!("{}l{}", prefix, k)
}

pub fn heap_global(prefix: &str, k: usize) -> String {
    format!("{}g{}", prefix, k)
}

pub fn heap_free(prefix: &str, k: usize) -> String {
    format!("{}f{}", prefix, k)
}

// Auxiliary bit-vector variables
pub const F: &str = "f";
pub const FPP: &str = "fpp";
pub const VFP: &str = "vfp";
pub const VAL: &str = "val";
pub const REZ: &str = "rez";
pub const BUF: &str = "buf";
pub const CN: &str = "cn";

// Auxiliary boolean variables
pub const LF: &str = "lf";
pub const BF: &str = "bf";
pub const LFP: &str = "lfp";
pub const BFP: &str = "bfp";
pub const LVAL: &str = "lval";
pub const BVAL: &str = "bval";
pub const HREZ: &str = "hrez";
pub const LREZ: &str = "lrez";
pub const GREZ: &str = "grez";
