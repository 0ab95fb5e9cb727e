pub mod context;
pub mod emission;

pub use context::{CompileEnv, InstrCx, MethodContext};
pub use emission::Emission;
