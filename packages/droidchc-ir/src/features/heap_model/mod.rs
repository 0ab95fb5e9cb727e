// Heap model
//
// Hexagonal Architecture:
// - domain: Local-heap layout (allocation sites, slot offsets), H/HI/I/S relation builders
// - application: Layout pre-pass over the program
// - infrastructure: Field layouts of framework classes

pub mod application;
pub mod domain;
pub mod infrastructure;

pub use application::LayoutBuilder;
pub use domain::{AllocationSite, HeapRelations, LocalHeapLayout};
pub use infrastructure::stub_fields;
