pub mod descriptor;
pub mod instruction;
pub mod opcode;
pub mod program;

pub use descriptor::{field_id, is_primitive, FieldRef, MethodRef, ReturnKind};
pub use instruction::{Instruction, Payload, RegisterRange};
pub use opcode::{
    BinaryOp, ConstKind, IfCond, InvokeKind, Opcode, OperandForm, SwitchKind, UnaryOp,
};
pub use program::{Class, Field, Method, Program};
