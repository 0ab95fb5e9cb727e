//! One handler per opcode family

pub mod arithmetic;
pub mod arrays;
pub mod branches;
pub mod fields;
pub mod invoke;
pub mod moves;
pub mod objects;

pub use arithmetic::{compile_binary, compile_cmp, compile_unary};
pub use arrays::{
    compile_aget, compile_aput, compile_array_length, compile_fill_array_data,
    compile_filled_new_array, compile_new_array,
};
pub use branches::{compile_goto, compile_if, compile_switch};
pub use fields::{compile_iget, compile_iput, compile_sget, compile_sput};
pub use invoke::compile_invoke;
pub use moves::{
    compile_const, compile_identity, compile_move, compile_move_result, compile_return,
};
pub use objects::{compile_check_cast, compile_instance_of, compile_new_instance};
