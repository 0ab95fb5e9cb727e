//! Method compiler
//!
//! Dispatches every instruction of a method to its family handler. A handler
//! error on one instruction is logged and replaced by an identity edge so the
//! rest of the method still compiles; only fatal errors abort.

use super::handlers::*;
use crate::errors::Result;
use crate::features::compiler::domain::{CompileEnv, Emission, InstrCx, MethodContext};
use crate::features::dalvik::domain::{Class, Method, Opcode};
use tracing::{debug, warn};

/// Clauses of a single instruction
pub fn compile_instruction(cx: &mut InstrCx<'_>) -> Result<()> {
    match cx.instr.op() {
        Opcode::Nop
        | Opcode::Monitor
        | Opcode::MoveException
        | Opcode::Throw
        | Opcode::Payload
        | Opcode::Unsupported => compile_identity(cx),
        Opcode::Move => compile_move(cx),
        Opcode::MoveResult => compile_move_result(cx),
        Opcode::Return => compile_return(cx, false),
        Opcode::ReturnVoid => compile_return(cx, true),
        Opcode::Const(kind) => compile_const(cx, kind),
        Opcode::CheckCast => compile_check_cast(cx),
        Opcode::InstanceOf => compile_instance_of(cx),
        Opcode::ArrayLength => compile_array_length(cx),
        Opcode::NewInstance => compile_new_instance(cx),
        Opcode::NewArray => compile_new_array(cx),
        Opcode::FilledNewArray { .. } => compile_filled_new_array(cx),
        Opcode::FillArrayData => compile_fill_array_data(cx),
        Opcode::Goto => compile_goto(cx),
        Opcode::Switch(_) => compile_switch(cx),
        Opcode::Cmp => compile_cmp(cx),
        Opcode::If { cond, zero } => compile_if(cx, cond, zero),
        Opcode::ArrayGet => compile_aget(cx),
        Opcode::ArrayPut => compile_aput(cx),
        Opcode::InstanceGet => compile_iget(cx),
        Opcode::InstancePut => compile_iput(cx),
        Opcode::StaticGet => compile_sget(cx),
        Opcode::StaticPut => compile_sput(cx),
        Opcode::Invoke { kind, .. } => compile_invoke(cx, kind),
        Opcode::Unary(op) => compile_unary(cx, op),
        Opcode::Binary { op, form } => compile_binary(cx, op, form),
    }
}

pub struct MethodCompiler<'a> {
    env: &'a CompileEnv<'a>,
}

impl<'a> MethodCompiler<'a> {
    pub fn new(env: &'a CompileEnv<'a>) -> Self {
        Self { env }
    }

    /// Compile every instruction of `method`
    pub fn compile(&self, class: &Class, method: &Method) -> Result<Emission> {
        let context = MethodContext::new(self.env, class, method)?;
        let mut out = Emission::new();

        for (index, instr) in method.instructions.iter().enumerate() {
            let mut cx = InstrCx::new(self.env, &context, instr, index);
            match compile_instruction(&mut cx) {
                Ok(()) => out.extend(cx.finish()),
                Err(err) if err.is_fatal() => return Err(err),
                Err(err) => {
                    warn!(
                        class = %class.name,
                        method = %method.name,
                        pc = instr.pc,
                        opcode = %instr.opcode,
                        error = %err,
                        "instruction not compiled, identity edge instead"
                    );
                    let mut fallback = InstrCx::new(self.env, &context, instr, index);
                    fallback.identity();
                    out.extend(fallback.finish());
                }
            }
        }

        if let Some(last) = method.instructions.last() {
            let op = last.op();
            if !op.ends_block() && op != Opcode::Payload {
                warn!(
                    class = %class.name,
                    method = %method.name,
                    pc = last.pc,
                    "control falls off the end of the method"
                );
            }
        }

        debug!(
            class = %class.name,
            method = %method.name,
            clauses = out.clauses.len(),
            queries = out.queries.len(),
            "method compiled"
        );
        Ok(out)
    }
}
