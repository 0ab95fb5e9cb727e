// Opcode semantics compiler
//
// Hexagonal Architecture:
// - domain: Compilation contexts (shared env, per-method, per-instruction)
//   and the clause/query emission buffer
// - application: Per-family opcode handlers, method compiler

pub mod application;
pub mod domain;

pub use application::{compile_instruction, MethodCompiler};
pub use domain::{CompileEnv, Emission, InstrCx, MethodContext};
