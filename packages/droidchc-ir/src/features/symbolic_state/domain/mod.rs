pub mod register_state;
pub mod state;
pub mod vars;

pub use register_state::{HeapSlot, RegisterState};
pub use state::{canonical_heap, StateBuilder, SymbolicState};
