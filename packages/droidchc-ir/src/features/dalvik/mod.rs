//! Dalvik program model
//!
//! The JSON program model, instructions with their payloads, the closed opcode
//! set and descriptor parsing.

pub mod domain;

pub use domain::{
    BinaryOp, Class, ConstKind, Field, FieldRef, IfCond, Instruction, InvokeKind, Method,
    MethodRef, Opcode, OperandForm, Payload, Program, RegisterRange, ReturnKind, SwitchKind,
    UnaryOp,
};
