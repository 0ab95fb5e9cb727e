//! Object allocation and type tests

use crate::errors::{DroidChcError, Result};
use crate::features::compiler::domain::InstrCx;
use crate::features::symbolic_state::domain::{HeapSlot, RegisterState, StateBuilder};
use crate::shared::constants::{CLINIT_SIGNATURE, INTENT_CLASS};
use crate::shared::models::{java_hash, BoolExpr, BvCmp, ProgramPoint};

/// `new-instance vA, type`
///
/// The site's previous epoch (if any) is flushed to the global heap and every
/// register still pointing at it is promoted; the destination then points at
/// the fresh, zeroed epoch.
pub fn compile_new_instance(cx: &mut InstrCx<'_>) -> Result<()> {
    let type_name = cx.instr.reference()?;
    if type_name == INTENT_CLASS {
        cx.identity();
        return Ok(());
    }

    let dest = cx.instr.reg(0)?;
    let instance = cx.allocation_id();
    let site = cx.layout().site(instance).ok_or_else(|| DroidChcError::InconsistentAllocation {
        site: instance,
        class: cx.method.class.name.clone(),
        method: cx.method.method.name.clone(),
        pc: cx.instr.pc,
    })?;
    let id = cx.lit(i64::from(instance));
    let width = cx.width();

    let allocate = |post: &mut StateBuilder| -> Result<()> {
        post.set(dest, RegisterState::local_ref(id.clone()))?;
        for k in site.slots() {
            post.set_slot(k, HeapSlot::allocated(width))?;
        }
        Ok(())
    };

    // registers aliasing the old epoch now refer to a global object
    let registers = cx.shape().num_registers as usize + 1;
    let mut post = cx.builder();
    post.map_registers(registers, |_, reg| {
        let aliased = reg.local.clone().and(reg.value.eq_to(&id));
        RegisterState::new(
            reg.value.clone(),
            reg.high.clone(),
            reg.local.clone().and(reg.value.eq_to(&id).negate()),
            reg.global.clone().or(aliased),
        )
    });
    allocate(&mut post)?;
    cx.step(Vec::new(), post.state());

    let occupied = cx.pre().slot(site.header_slot())?.free.clone().negate();
    let body = cx.body(Vec::new());
    for clause in cx.env.lifting().flush_site(site, &body, cx.pre())? {
        cx.emit(clause);
    }

    // the old epoch held local references: they escape with it
    let nested = BoolExpr::any(
        (site.offset..site.header_slot())
            .map(|k| cx.pre().slot(k).map(|s| s.cell.local.clone()))
            .collect::<Result<Vec<_>>>()?,
    );
    if !nested.is_false() {
        cx.lift(vec![occupied, nested], allocate)?;
    }

    let class = java_hash(type_name);
    if cx.oracle().has_static_initializer(class) {
        let clinit = java_hash(CLINIT_SIGNATURE);
        if let Some(shape) = cx.oracle().method_shape(class, clinit) {
            let entry = StateBuilder::zeroed(shape, cx.pre().heap.clone(), width).finish();
            let head = cx
                .env
                .predicates
                .point(ProgramPoint::new(class, clinit, 0), &entry);
            cx.derive(Vec::new(), head);
        }
    }
    Ok(())
}

/// `check-cast vA, type`: continues only for a non-null reference
pub fn compile_check_cast(cx: &mut InstrCx<'_>) -> Result<()> {
    let object = cx.operand(0)?;
    let non_null = BoolExpr::cmp(BvCmp::Ugt, object.value.clone(), cx.lit(0));
    let pre = cx.pre();
    cx.step(vec![object.global.clone(), non_null.clone()], pre);
    cx.step(vec![object.local.clone(), non_null], pre);
    Ok(())
}

/// `instance-of vA, vB, type`: both outcomes
pub fn compile_instance_of(cx: &mut InstrCx<'_>) -> Result<()> {
    let dest = cx.instr.reg(0)?;
    for outcome in [0, 1] {
        let mut post = cx.builder();
        post.set(dest, RegisterState::scalar(cx.lit(outcome), BoolExpr::ff()))?;
        cx.step(Vec::new(), post.state());
    }
    Ok(())
}
