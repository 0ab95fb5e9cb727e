pub mod handlers;
pub mod method_compiler;

pub use method_compiler::{compile_instruction, MethodCompiler};
