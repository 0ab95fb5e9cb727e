//! Instance and static field access
//!
//! An instance field lives either in a local-heap slot (the base register is
//! `local` and equals a site id declaring the field) or on the global heap.
//! Static fields live in `S`, keyed by the declaring class.

use crate::errors::Result;
use crate::features::compiler::domain::InstrCx;
use crate::features::dalvik::domain::FieldRef;
use crate::features::symbolic_state::domain::{vars, HeapSlot, RegisterState};
use crate::shared::models::{BoolExpr, IntExpr};

/// `iget vA, vB, field`
pub fn compile_iget(cx: &mut InstrCx<'_>) -> Result<()> {
    let dest = cx.instr.reg(0)?;
    let object = cx.operand(1)?;
    let field = FieldRef::parse(cx.instr.reference()?)?;
    let fid = field.field_id();

    let stored = cx.heap().h(
        cx.var(vars::CN),
        object.value.clone(),
        cx.heap().id(fid),
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

    for (site, k) in cx.layout().sites_with_field(fid) {
        let slot = cx.pre().slot(k)?;
        let guards = vec![
            object.local.clone(),
            object.value.eq_to(&cx.lit(i64::from(site.instance))),
        ];
        let mut post = cx.builder();
        post.set(
            dest,
            RegisterState::new(
                slot.cell.value.clone(),
                slot.cell.high.clone(),
                BoolExpr::ff(),
                slot.cell.global.clone(),
            ),
        )?;
        cx.step(guards, post.state());
    }
    Ok(())
}

/// `iput vA, vB, field`
pub fn compile_iput(cx: &mut InstrCx<'_>) -> Result<()> {
    let source = cx.operand(0)?;
    let object_reg = cx.instr.reg(1)?;
    let object = cx.operand(1)?;
    let field = FieldRef::parse(cx.instr.reference()?)?;
    let fid = field.field_id();

    let mut post = cx.builder();
    post.taint(object_reg, source.high.clone())?;
    cx.step(Vec::new(), post.state());

    // global object
    let head = cx.heap().h(
        cx.heap().id(field.class_id()),
        object.value.clone(),
        cx.heap().id(fid),
        source.value.clone(),
        source.high.clone(),
        source.blocked(),
    );
    cx.derive(vec![object.global.clone()], head);

    let taint = source.high.clone();
    cx.lift_if_local(cx.instr.reg(0)?, vec![object.global.clone()], |post| {
        post.taint(object_reg, taint)?;
        Ok(())
    })?;

    // local object, one clause per site declaring the field
    for (site, k) in cx.layout().sites_with_field(fid) {
        let guards = vec![
            object.local.clone(),
            object.value.eq_to(&cx.lit(i64::from(site.instance))),
        ];
        let mut post = cx.builder();
        post.set_slot(k, HeapSlot::new(source.clone(), BoolExpr::ff()))?;
        post.taint(object_reg, source.high.clone())?;
        cx.step(guards, post.state());
    }
    Ok(())
}

fn static_key(cx: &InstrCx<'_>, field: &FieldRef) -> (IntExpr, IntExpr) {
    let fid = field.field_id();
    let owner = cx
        .oracle()
        .static_field_owner(field.class_id(), fid)
        .unwrap_or_else(|| field.class_id());
    (IntExpr::Lit(i64::from(owner)), IntExpr::Lit(i64::from(fid)))
}

/// `sget vA, field`: the stored value, or the default when never written
pub fn compile_sget(cx: &mut InstrCx<'_>) -> Result<()> {
    let dest = cx.instr.reg(0)?;
    let field = FieldRef::parse(cx.instr.reference()?)?;
    let (class, fid) = static_key(cx, &field);

    let mut post = cx.builder();
    post.set(
        dest,
        RegisterState::new(cx.lit(0), BoolExpr::ff(), BoolExpr::ff(), BoolExpr::var(vars::BF)),
    )?;
    cx.step(Vec::new(), post.state());

    let stored = cx.heap().s(
        class,
        fid,
        cx.var(vars::F),
        BoolExpr::var(vars::LF),
        BoolExpr::var(vars::BF),
    );
    let mut post = cx.builder();
    post.set(
        dest,
        RegisterState::new(
            cx.var(vars::F),
            BoolExpr::var(vars::LF),
            BoolExpr::ff(),
            BoolExpr::var(vars::BF),
        ),
    )?;
    cx.step(vec![stored.into()], post.state());
    Ok(())
}

/// `sput vA, field`
pub fn compile_sput(cx: &mut InstrCx<'_>) -> Result<()> {
    let source_reg = cx.instr.reg(0)?;
    let source = cx.operand(0)?;
    let field = FieldRef::parse(cx.instr.reference()?)?;
    let (class, fid) = static_key(cx, &field);

    cx.identity();
    let head = cx.heap().s(
        class,
        fid,
        source.value.clone(),
        source.high.clone(),
        source.blocked(),
    );
    cx.derive(Vec::new(), head);
    cx.lift_if_local(source_reg, Vec::new(), |_| Ok(()))
}
