//! Generic summary for unresolved calls
//!
//! The result is labelled with the join of the argument labels (or high when
//! the method is a configured source). Global arguments absorb the labels of
//! the other arguments, since the callee may store any of them into any
//! other. Arguments holding local references escape into the callee, so a
//! second, lifted transition covers that case.

use crate::errors::Result;
use crate::features::call_linkage::domain::CallSite;
use crate::features::compiler::domain::InstrCx;
use crate::features::dalvik::domain::ReturnKind;
use crate::features::symbolic_state::domain::{vars, RegisterState, StateBuilder};
use crate::shared::models::{java_hash, BoolExpr};

pub fn apply(cx: &mut InstrCx<'_>, call: &CallSite) -> Result<()> {
    let arguments = call
        .arguments
        .iter()
        .map(|r| cx.reg(*r).map(|state| (*r, state)))
        .collect::<Result<Vec<_>>>()?;

    let label = if cx.oracle().is_source(call.class_id(), call.method_id()) {
        BoolExpr::tt()
    } else {
        BoolExpr::any(arguments.iter().map(|(_, s)| s.high.clone()))
    };

    let result = summarize_result(cx, call, &label);

    // h_i |= g_i ∧ OR_{j≠i} h_j, read from the state being updated
    let others: Vec<(u32, BoolExpr)> = arguments
        .iter()
        .enumerate()
        .map(|(i, (r, _))| {
            let others = BoolExpr::any(
                arguments
                    .iter()
                    .enumerate()
                    .filter(|(j, _)| *j != i)
                    .map(|(_, (_, s))| s.high.clone()),
            );
            (*r, others)
        })
        .collect();
    let return_slot = cx.shape().return_slot();
    let update = |post: &mut StateBuilder| -> Result<()> {
        for (r, others) in &others {
            let global = post.register(*r)?.global.clone();
            post.taint(*r, global.and(others.clone()))?;
        }
        if let Some(result) = &result {
            post.set(return_slot, result.clone())?;
        }
        Ok(())
    };

    let mut post = cx.builder();
    update(&mut post)?;
    cx.step(Vec::new(), post.state());

    let escaping = BoolExpr::any(arguments.iter().map(|(_, s)| s.local.clone()));
    if !escaping.is_false() {
        cx.lift(vec![escaping], update)?;
    }
    Ok(())
}

/// Return slot after the call, emitting the heap facts an opaque object or
/// array result stands for
fn summarize_result(cx: &mut InstrCx<'_>, call: &CallSite, label: &BoolExpr) -> Option<RegisterState> {
    let return_type = &call.target.return_type;
    let heap = cx.heap();
    let class = heap.id(java_hash(return_type));

    match call.return_kind() {
        ReturnKind::Void => None,
        ReturnKind::String => Some(RegisterState::new(
            cx.var(vars::F),
            label.clone(),
            BoolExpr::ff(),
            BoolExpr::tt(),
        )),
        ReturnKind::Primitive => Some(RegisterState::scalar(cx.var(vars::F), label.clone())),
        ReturnKind::Object => {
            let object = cx.var(vars::FPP);
            let fields = cx
                .oracle()
                .field_layout(return_type, cx.allocation_id())
                .filter(|fields| !fields.is_empty());
            match fields {
                Some(fields) => {
                    for (field, primitive) in fields {
                        let head = heap.h(
                            class.clone(),
                            object.clone(),
                            heap.id(field),
                            cx.var(vars::VFP),
                            label.clone(),
                            BoolExpr::Const(!primitive),
                        );
                        cx.derive(Vec::new(), head);
                    }
                }
                None => {
                    let head = heap.h(
                        class,
                        object.clone(),
                        cx.var(vars::F),
                        cx.var(vars::VFP),
                        label.clone(),
                        BoolExpr::var(vars::BF),
                    );
                    cx.derive(Vec::new(), head);
                }
            }
            Some(RegisterState::global_ref(object, label.clone()))
        }
        ReturnKind::Array => {
            let id = cx.lit(i64::from(cx.allocation_id()));
            let head = heap.h(
                class,
                id.clone(),
                cx.var(vars::F),
                cx.var(vars::BUF),
                label.clone(),
                BoolExpr::var(vars::BF),
            );
            cx.derive(Vec::new(), head);
            Some(RegisterState::global_ref(id, label.clone()))
        }
    }
}
