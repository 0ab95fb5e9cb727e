/*
 * DroidCHC IR - Dalvik to Constrained Horn Clause compiler
 *
 * Feature-First Hexagonal Architecture:
 * - shared/      : Ids, frame shape, SMT expression AST
 * - features/    : Vertical slices (dalvik → symbolic_state → heap_model → escape
 *                  → call_linkage → compiler → chc)
 * - pipeline/    : Orchestration (layout pre-pass, global facts, method workers)
 * - config/      : Presets and YAML configuration
 *
 * Performance:
 * - Methods compiled independently on a rayon pool
 * - Dispatch lookups memoized in a DashMap
 * - Deterministic SMT-LIB2 export regardless of scheduling
 */

// Crate-level lint configuration
#![allow(clippy::too_many_arguments)] // Heap relations take one argument per column
#![allow(clippy::type_complexity)] // Nested tuple results of dispatch lookups
#![allow(clippy::module_inception)] // Module naming intentional
#![allow(clippy::new_without_default)] // Default impl not always needed
#![allow(clippy::upper_case_acronyms)] // CHC, SMT naming
#![allow(clippy::manual_map)] // map_or style preference

pub mod config;
pub mod errors;
pub mod features;
pub mod pipeline;
pub mod shared;

pub use config::{AnalysisConfig, ConfigError, Preset};
pub use errors::{DroidChcError, Result};
pub use features::chc::{Clause, ClauseSink, ClauseStore, Query, QueryKey, SmtLibExporter};
pub use features::call_linkage::{DispatchCache, DispatchOracle, ProgramOracle, SourceSinkTable};
pub use features::dalvik::{Class, Field, Instruction, Method, Payload, Program};
pub use pipeline::{Compilation, CompilationReport, Orchestrator};

// ═══════════════════════════════════════════════════════════════════════════
// Convenience API
// ═══════════════════════════════════════════════════════════════════════════

/// Compile a program model with `config` into an in-memory clause store
pub fn compile_program(program: &Program, config: AnalysisConfig) -> Result<Compilation> {
    Orchestrator::new(config).compile(program)
}

/// Compile a program model and render it as an SMT-LIB2 fixedpoint problem
pub fn compile_to_smt2(program: &Program, config: AnalysisConfig) -> Result<String> {
    let orchestrator = Orchestrator::new(config);
    let compilation = orchestrator.compile(program)?;
    compilation.to_smt2(orchestrator.config())
}
