//! Invoke instructions as call sites

use crate::errors::Result;
use crate::features::dalvik::domain::{Instruction, InvokeKind, MethodRef, ReturnKind};
use crate::shared::models::{ClassId, MethodId};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallSite {
    pub kind: InvokeKind,
    pub target: MethodRef,
    /// Caller registers holding the actual arguments, receiver first
    pub arguments: Vec<u32>,
}

impl CallSite {
    pub fn from_instruction(instr: &Instruction, kind: InvokeKind) -> Result<Self> {
        Ok(Self {
            kind,
            target: MethodRef::parse(instr.reference()?)?,
            arguments: instr.argument_registers(),
        })
    }

    pub fn class_id(&self) -> ClassId {
        self.target.class_id()
    }

    pub fn method_id(&self) -> MethodId {
        self.target.method_id()
    }

    pub fn return_kind(&self) -> ReturnKind {
        self.target.return_kind()
    }

    /// Receiver register of an instance call
    pub fn receiver(&self) -> Option<u32> {
        match self.kind {
            InvokeKind::Static => None,
            _ => self.arguments.first().copied(),
        }
    }

    /// Argument register `i`, receiver included
    pub fn argument(&self, i: usize) -> Option<u32> {
        self.arguments.get(i).copied()
    }
}
