pub mod predicate_builder;

pub use predicate_builder::{heap_terms, PredicateBuilder};
