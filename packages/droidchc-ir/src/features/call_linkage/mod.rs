// Call linkage
//
// Hexagonal Architecture:
// - domain: Call sites decoded from invoke instructions
// - ports: DispatchOracle (virtual/static resolution, sources, sinks, layouts)
// - application: Entry/exit linkage, async remaps, sink queries,
//   library summaries, generic summary
// - infrastructure: ProgramOracle over the JSON model, DispatchCache,
//   source/sink signature tables

pub mod application;
pub mod domain;
pub mod infrastructure;
pub mod ports;

pub use application::link_call;
pub use domain::CallSite;
pub use infrastructure::{DispatchCache, ProgramOracle, SourceSinkTable};
pub use ports::{Definition, DispatchOracle, Implementation};
