//! goto, if and switch

use crate::errors::Result;
use crate::features::compiler::domain::InstrCx;
use crate::features::dalvik::domain::instruction::relative_pc;
use crate::features::dalvik::domain::IfCond;
use crate::shared::models::BoolExpr;
use tracing::warn;

pub fn compile_goto(cx: &mut InstrCx<'_>) -> Result<()> {
    let target = cx.instr.branch_target()?;
    let pre = cx.pre();
    cx.jump(target, Vec::new(), pre);
    Ok(())
}

/// Exactly two clauses: taken and fallthrough
pub fn compile_if(cx: &mut InstrCx<'_>, cond: IfCond, zero: bool) -> Result<()> {
    let target = cx.instr.branch_target()?;
    let lhs = cx.operand(0)?.value.clone();
    let rhs = if zero {
        cx.lit(0)
    } else {
        cx.operand(1)?.value.clone()
    };

    let (cmp, negated) = cond.bv_cmp();
    let mut guard = BoolExpr::cmp(cmp, lhs, rhs);
    if negated {
        guard = guard.negate();
    }

    let pre = cx.pre();
    cx.jump(target, vec![guard.clone()], pre);
    cx.step(vec![guard.negate()], pre);
    Ok(())
}

/// One clause per case, plus the fallthrough when no case matches
pub fn compile_switch(cx: &mut InstrCx<'_>) -> Result<()> {
    let scrutinee = cx.operand(0)?.value.clone();
    let pre = cx.pre();

    let entries = match cx
        .method
        .method
        .payload_for(cx.instr)
        .and_then(|payload| payload.switch_entries())
    {
        Ok(entries) => entries,
        Err(e) => {
            warn!(pc = cx.instr.pc, method = %cx.method.method.name, error = %e, "switch without a usable payload");
            cx.identity();
            return Ok(());
        }
    };

    let mut matched = Vec::with_capacity(entries.len());
    for (key, offset) in entries {
        let target = match relative_pc(cx.instr.pc, offset) {
            Ok(target) => target,
            Err(e) => {
                warn!(pc = cx.instr.pc, key, error = %e, "skipping switch case");
                continue;
            }
        };
        let guard = scrutinee.eq_to(&cx.lit(i64::from(key)));
        cx.jump(target, vec![guard.clone()], pre);
        matched.push(guard);
    }

    cx.step(vec![BoolExpr::any(matched).negate()], pre);
    Ok(())
}
