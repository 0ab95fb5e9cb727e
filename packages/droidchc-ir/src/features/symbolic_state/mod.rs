//! Symbolic state of a program point
//!
//! - domain: register 4-tuples, local-heap slots, canonical variable names
//! - application: relation applications for points, exits and entries

pub mod application;
pub mod domain;

pub use application::PredicateBuilder;
pub use domain::{HeapSlot, RegisterState, StateBuilder, SymbolicState};
