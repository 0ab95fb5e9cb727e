pub mod generic_summary;
pub mod linker;
pub mod remaps;
pub mod sink_queries;
pub mod summaries;

pub use linker::{link_call, CallTarget};
