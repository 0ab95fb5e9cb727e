//! Moves, constants, returns and identity edges

use crate::errors::Result;
use crate::features::compiler::domain::InstrCx;
use crate::features::dalvik::domain::{ConstKind, Opcode};
use crate::features::symbolic_state::domain::{vars, RegisterState};
use crate::shared::models::{java_hash, BoolExpr};
use tracing::debug;

/// `nop`, `monitor-*`, `move-exception`, `throw`, payloads and unsupported opcodes
pub fn compile_identity(cx: &mut InstrCx<'_>) -> Result<()> {
    if cx.instr.op() == Opcode::Unsupported {
        debug!(opcode = %cx.instr.opcode, pc = cx.instr.pc, "unsupported opcode, identity edge");
    }
    cx.identity();
    Ok(())
}

/// `move vA, vB`
pub fn compile_move(cx: &mut InstrCx<'_>) -> Result<()> {
    let dest = cx.instr.reg(0)?;
    let source = cx.operand(1)?.clone();
    let mut post = cx.builder();
    post.set(dest, source)?;
    cx.step(Vec::new(), post.state());
    Ok(())
}

/// `move-result vA`: copy of the return slot
pub fn compile_move_result(cx: &mut InstrCx<'_>) -> Result<()> {
    let dest = cx.instr.reg(0)?;
    let result = cx.reg(cx.shape().return_slot())?.clone();
    let mut post = cx.builder();
    post.set(dest, result)?;
    cx.step(Vec::new(), post.state());
    Ok(())
}

pub fn compile_const(cx: &mut InstrCx<'_>, kind: ConstKind) -> Result<()> {
    let dest = cx.instr.reg(0)?;
    let value = match kind {
        ConstKind::Literal => cx.lit(cx.instr.literal()?),
        ConstKind::String | ConstKind::Class => cx.lit(i64::from(java_hash(cx.instr.reference()?))),
    };
    let mut post = cx.builder();
    post.set(dest, RegisterState::scalar(value, BoolExpr::ff()))?;
    cx.step(Vec::new(), post.state());
    Ok(())
}

/// `return vA` / `return-void` into `RES(c, m)`
pub fn compile_return(cx: &mut InstrCx<'_>, void: bool) -> Result<()> {
    let shape = cx.shape();
    let arguments = (0..shape.num_arguments)
        .map(|i| cx.reg(shape.argument_copy(i)).cloned())
        .collect::<Result<Vec<_>>>()?;

    let result = if void {
        RegisterState::new(
            cx.var(vars::REZ),
            BoolExpr::var(vars::HREZ),
            BoolExpr::var(vars::LREZ),
            BoolExpr::var(vars::GREZ),
        )
    } else {
        cx.operand(0)?.clone()
    };

    let head = cx.env.predicates.exit(
        cx.method.class_id,
        cx.method.method_id,
        &arguments,
        &result,
        &cx.pre().heap,
    );
    cx.derive(Vec::new(), head);
    Ok(())
}
