//! Feature modules
//!
//! Leaves first: Horn clause storage, the Dalvik model, symbolic state, the
//! heap model and escape engine, call linkage, and the opcode compiler that
//! ties them together.

pub mod call_linkage;
pub mod chc;
pub mod compiler;
pub mod dalvik;
pub mod escape;
pub mod heap_model;
pub mod symbolic_state;
