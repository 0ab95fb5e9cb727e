// Pipeline
//
// Hexagonal Architecture:
// - entry_points: Program-wide facts (entry states, static initial values,
//   activity-result and reachability rules)
// - orchestrator: Layout pre-pass, global facts, parallel method compilation

pub mod entry_points;
pub mod orchestrator;

pub use entry_points::GlobalFacts;
pub use orchestrator::{Compilation, CompilationReport, Orchestrator};
