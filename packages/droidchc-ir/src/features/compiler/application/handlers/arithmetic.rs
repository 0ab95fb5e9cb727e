//! Unary, binary and comparison instructions

use crate::errors::Result;
use crate::features::compiler::domain::InstrCx;
use crate::features::dalvik::domain::{BinaryOp, OperandForm, UnaryOp};
use crate::features::symbolic_state::domain::RegisterState;
use crate::shared::models::{BoolExpr, BvCmp, BvExpr, BvUnOp};

pub fn compile_binary(cx: &mut InstrCx<'_>, op: BinaryOp, form: OperandForm) -> Result<()> {
    let dest = cx.instr.reg(0)?;
    let (value, high) = match form {
        OperandForm::Three => {
            let b = cx.operand(1)?;
            let c = cx.operand(2)?;
            (
                BvExpr::bin(op.bv_op(), b.value.clone(), c.value.clone()),
                b.high.clone().or(c.high.clone()),
            )
        }
        OperandForm::TwoAddr => {
            let a = cx.operand(0)?;
            let b = cx.operand(1)?;
            (
                BvExpr::bin(op.bv_op(), a.value.clone(), b.value.clone()),
                a.high.clone().or(b.high.clone()),
            )
        }
        OperandForm::Literal => {
            let b = cx.operand(1)?;
            let lit = cx.lit(cx.instr.literal()?);
            let value = match op {
                BinaryOp::Rsub => BvExpr::bin(op.bv_op(), lit, b.value.clone()),
                _ => BvExpr::bin(op.bv_op(), b.value.clone(), lit),
            };
            (value, b.high.clone())
        }
    };

    let mut post = cx.builder();
    post.set(dest, RegisterState::scalar(value, high))?;
    cx.step(Vec::new(), post.state());
    Ok(())
}

pub fn compile_unary(cx: &mut InstrCx<'_>, op: UnaryOp) -> Result<()> {
    let dest = cx.instr.reg(0)?;
    let source = cx.operand(1)?;
    let value = match op {
        UnaryOp::Neg => BvExpr::un(BvUnOp::Neg, source.value.clone()),
        UnaryOp::Not => BvExpr::un(BvUnOp::Not, source.value.clone()),
        UnaryOp::Convert => source.value.clone(),
    };

    let mut post = cx.builder();
    post.set(dest, RegisterState::scalar(value, source.high.clone()))?;
    cx.step(Vec::new(), post.state());
    Ok(())
}

/// `cmp* vA, vB, vC`: 0 if equal, 1 if greater, -1 otherwise
pub fn compile_cmp(cx: &mut InstrCx<'_>) -> Result<()> {
    let dest = cx.instr.reg(0)?;
    let b = cx.operand(1)?;
    let c = cx.operand(2)?;

    let value = BvExpr::ite(
        b.value.eq_to(&c.value),
        cx.lit(0),
        BvExpr::ite(
            BoolExpr::cmp(BvCmp::Ugt, b.value.clone(), c.value.clone()),
            cx.lit(1),
            cx.lit(-1),
        ),
    );

    let mut post = cx.builder();
    post.set(dest, RegisterState::scalar(value, b.high.clone().or(c.high.clone())))?;
    cx.step(Vec::new(), post.state());
    Ok(())
}
