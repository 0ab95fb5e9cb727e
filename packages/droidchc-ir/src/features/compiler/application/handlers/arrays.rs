//! Array allocation and access
//!
//! Arrays live on the global heap as `H(type, id, index, value, high, blocked)`.
//! Without index sensitivity every element is stored at index 0.

use crate::errors::Result;
use crate::features::compiler::domain::InstrCx;
use crate::features::symbolic_state::domain::{vars, RegisterState};
use crate::shared::models::{java_hash, BoolExpr, BvCmp, BvExpr};
use tracing::warn;

fn index(cx: &InstrCx<'_>, concrete: BvExpr) -> BvExpr {
    if cx.env.config.arrays {
        concrete
    } else {
        cx.lit(0)
    }
}

/// Element `k` of a literal initializer
fn element_index(cx: &InstrCx<'_>, k: usize) -> BvExpr {
    let concrete = cx.lit(k as i64);
    index(cx, concrete)
}

/// `new-array vA, vB, type`
pub fn compile_new_array(cx: &mut InstrCx<'_>) -> Result<()> {
    let dest = cx.instr.reg(0)?;
    let size = cx.operand(1)?.value.clone();
    let heap = cx.heap();
    let class = heap.id(java_hash(cx.instr.reference()?));
    let id = cx.lit(i64::from(cx.allocation_id()));
    let width = cx.width();

    let element = |selector: BvExpr| {
        heap.h(
            class.clone(),
            id.clone(),
            selector,
            BvExpr::zero(width),
            BoolExpr::ff(),
            BoolExpr::ff(),
        )
    };
    if cx.env.config.arrays {
        let f = cx.var(vars::F);
        let guards = vec![
            BoolExpr::cmp(BvCmp::Ule, cx.lit(0), f.clone()),
            BoolExpr::cmp(BvCmp::Ult, f.clone(), size),
        ];
        let head = element(f);
        cx.derive(guards, head);
    } else {
        let head = element(cx.lit(0));
        cx.derive(Vec::new(), head);
    }

    let mut post = cx.builder();
    post.set(dest, RegisterState::global_ref(id, BoolExpr::ff()))?;
    cx.step(Vec::new(), post.state());
    Ok(())
}

/// `filled-new-array {args}, type`: the array lands in the return slot
pub fn compile_filled_new_array(cx: &mut InstrCx<'_>) -> Result<()> {
    let heap = cx.heap();
    let class = heap.id(java_hash(cx.instr.reference()?));
    let id = cx.lit(i64::from(cx.allocation_id()));
    let return_slot = cx.shape().return_slot();

    let elements = cx.instr.argument_registers();
    let mut locals = Vec::with_capacity(elements.len());
    for (k, r) in elements.iter().enumerate() {
        let element = cx.reg(*r)?;
        let head = heap.h(
            class.clone(),
            id.clone(),
            element_index(cx, k),
            element.value.clone(),
            element.high.clone(),
            element.blocked(),
        );
        cx.derive(Vec::new(), head);
        locals.push(element.local.clone());
    }

    let array = RegisterState::global_ref(id, BoolExpr::ff());
    let mut post = cx.builder();
    post.set(return_slot, array.clone())?;
    cx.step(Vec::new(), post.state());

    let escaping = BoolExpr::any(locals);
    if !escaping.is_false() {
        cx.lift(vec![escaping], |post| {
            post.set(return_slot, array)?;
            Ok(())
        })?;
    }
    Ok(())
}

/// `fill-array-data vA, payload`: one literal write per element
pub fn compile_fill_array_data(cx: &mut InstrCx<'_>) -> Result<()> {
    let array = cx.operand(0)?.value.clone();
    let elements = match cx
        .method
        .method
        .payload_for(cx.instr)
        .and_then(|payload| payload.array_elements())
    {
        Ok(elements) => elements,
        Err(e) => {
            warn!(pc = cx.instr.pc, method = %cx.method.method.name, error = %e, "fill-array-data without array data");
            cx.identity();
            return Ok(());
        }
    };

    let heap = cx.heap();
    let class = cx.var(vars::CN);
    for (k, element) in elements.iter().enumerate() {
        let existing = heap.h(
            class.clone(),
            array.clone(),
            cx.var(vars::F),
            cx.var(vars::VFP),
            BoolExpr::var(vars::LF),
            BoolExpr::var(vars::BF),
        );
        let head = heap.h(
            class.clone(),
            array.clone(),
            element_index(cx, k),
            cx.lit(*element),
            BoolExpr::ff(),
            BoolExpr::ff(),
        );
        cx.derive(vec![existing.into()], head);
    }

    cx.identity();
    Ok(())
}

/// `aget vA, vB, vC`
pub fn compile_aget(cx: &mut InstrCx<'_>) -> Result<()> {
    let dest = cx.instr.reg(0)?;
    let array = cx.operand(1)?.value.clone();
    let selector = index(cx, cx.operand(2)?.value.clone());

    let stored = cx.heap().h(
        cx.var(vars::CN),
        array,
        selector,
        cx.var(vars::VAL),
        BoolExpr::var(vars::LVAL),
        BoolExpr::var(vars::BVAL),
    );
    let mut post = cx.builder();
    post.set(
        dest,
        RegisterState::new(
            cx.var(vars::VAL),
            BoolExpr::var(vars::LVAL),
            BoolExpr::ff(),
            BoolExpr::var(vars::BVAL),
        ),
    )?;
    cx.step(vec![stored.into()], post.state());
    Ok(())
}

/// `aput vA, vB, vC`: the array's high absorbs the stored value's
pub fn compile_aput(cx: &mut InstrCx<'_>) -> Result<()> {
    let source = cx.operand(0)?;
    let array_reg = cx.instr.reg(1)?;
    let array = cx.operand(1)?.value.clone();
    let selector = index(cx, cx.operand(2)?.value.clone());

    let mut post = cx.builder();
    post.taint(array_reg, source.high.clone())?;
    cx.step(Vec::new(), post.state());

    let heap = cx.heap();
    let existing = heap.h(
        cx.var(vars::CN),
        array.clone(),
        cx.var(vars::F),
        cx.var(vars::VFP),
        BoolExpr::var(vars::LFP),
        BoolExpr::var(vars::BFP),
    );
    let head = heap.h(
        cx.var(vars::CN),
        array,
        selector,
        source.value.clone(),
        source.high.clone(),
        source.blocked(),
    );
    cx.derive(vec![existing.into()], head);

    let taint = source.high.clone();
    cx.lift_if_local(cx.instr.reg(0)?, Vec::new(), |post| {
        post.taint(array_reg, taint)?;
        Ok(())
    })
}

/// `array-length vA, vB`: unconstrained, untainted
pub fn compile_array_length(cx: &mut InstrCx<'_>) -> Result<()> {
    let dest = cx.instr.reg(0)?;
    let mut post = cx.builder();
    post.set(dest, RegisterState::scalar(cx.var(vars::F), BoolExpr::ff()))?;
    cx.step(Vec::new(), post.state());
    Ok(())
}
