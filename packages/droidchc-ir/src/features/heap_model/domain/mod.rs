pub mod layout;
pub mod relations;

pub use layout::{AllocationSite, LocalHeapLayout};
pub use relations::HeapRelations;
