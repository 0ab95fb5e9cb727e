pub mod dispatch_cache;
pub mod program_oracle;
pub mod source_sink;

pub use dispatch_cache::DispatchCache;
pub use program_oracle::ProgramOracle;
pub use source_sink::{parse_signature, SourceSinkTable, DEFAULT_SINKS, DEFAULT_SOURCES};
