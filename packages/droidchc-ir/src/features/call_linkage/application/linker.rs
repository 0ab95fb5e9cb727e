//! Call linkage
//!
//! A call site is checked against the sink table, then the async remaps, then
//! resolved through the dispatch oracle. Resolved targets get an entry edge
//! (arguments copied into the callee frame) and an exit edge (result and
//! callee heap copied back). Unresolved calls fall back to library summaries.

use super::{generic_summary, remaps, sink_queries, summaries};
use crate::errors::{DroidChcError, Result};
use crate::features::call_linkage::domain::CallSite;
use crate::features::compiler::domain::InstrCx;
use crate::features::symbolic_state::domain::{canonical_heap, vars, HeapSlot, RegisterState, StateBuilder};
use crate::shared::models::{BoolExpr, ClassId, FrameShape, InstanceId, MethodId, ProgramPoint};
use tracing::trace;

/// A resolved callee; `instances` guard the receiver of dynamic calls
#[derive(Debug, Clone)]
pub struct CallTarget {
    pub class: ClassId,
    pub method: MethodId,
    pub shape: FrameShape,
    pub instances: Option<Vec<InstanceId>>,
}

pub fn link_call(cx: &mut InstrCx<'_>, call: &CallSite) -> Result<()> {
    sink_queries::emit(cx, call)?;

    if remaps::apply(cx, call)? {
        return Ok(());
    }

    if let Some(targets) = resolve(cx, call).filter(|targets| !targets.is_empty()) {
        for target in &targets {
            link_target(cx, call, target)?;
        }
        return Ok(());
    }

    if cx.env.config.intent_summaries && summaries::apply(cx, call)? {
        return Ok(());
    }
    generic_summary::apply(cx, call)
}

fn resolve(cx: &InstrCx<'_>, call: &CallSite) -> Option<Vec<CallTarget>> {
    let oracle = cx.oracle();
    if call.kind.is_dynamic() {
        oracle
            .resolve_virtual(call.class_id(), call.method_id())
            .map(|impls| {
                impls
                    .into_iter()
                    .map(|i| CallTarget {
                        class: i.class,
                        method: i.method,
                        shape: i.shape,
                        instances: Some(i.instances),
                    })
                    .filter(|t| t.shape.is_well_formed())
                    .collect()
            })
    } else {
        oracle
            .resolve_static(call.class_id(), call.method_id())
            .map(|defs| {
                defs.into_iter()
                    .map(|d| CallTarget {
                        class: d.class,
                        method: d.method,
                        shape: d.shape,
                        instances: None,
                    })
                    .filter(|t| t.shape.is_well_formed())
                    .collect()
            })
    }
}

/// Receiver guards of a target: one per instance, or a single empty guard
fn receiver_guards(cx: &InstrCx<'_>, receiver: Option<u32>, instances: Option<&Vec<InstanceId>>) -> Result<Vec<Vec<BoolExpr>>> {
    match (receiver, instances) {
        (Some(r), Some(instances)) => {
            let value = &cx.reg(r)?.value;
            Ok(instances
                .iter()
                .map(|id| vec![value.eq_to(&cx.lit(i64::from(*id)))])
                .collect())
        }
        _ => Ok(vec![Vec::new()]),
    }
}

fn link_target(cx: &mut InstrCx<'_>, call: &CallSite, target: &CallTarget) -> Result<()> {
    trace!(class = target.class, method = target.method, pc = cx.instr.pc, "linking call");
    for guards in receiver_guards(cx, call.receiver(), target.instances.as_ref())? {
        emit_entry(cx, &call.arguments, target.class, target.method, target.shape, guards.clone())?;
        emit_exit(cx, call, target, guards)?;
    }
    Ok(())
}

/// `R(P) ∧ guards ⇒ R(callee, 0)` with the arguments in the parameter
/// registers and argument copies, everything else zero, and the caller's heap
pub(crate) fn emit_entry(
    cx: &mut InstrCx<'_>,
    arguments: &[u32],
    class: ClassId,
    method: MethodId,
    shape: FrameShape,
    guards: Vec<BoolExpr>,
) -> Result<()> {
    let mut entry = StateBuilder::zeroed(shape, cx.pre().heap.clone(), cx.width());
    for (i, r) in arguments.iter().take(shape.num_arguments as usize).enumerate() {
        let argument = cx.reg(*r)?.clone();
        let parameter = shape
            .parameter_register(i as u32)
            .ok_or_else(|| DroidChcError::model("callee has more arguments than registers"))?;
        entry.set(parameter, argument.clone())?;
        entry.set(shape.argument_copy(i as u32), argument)?;
    }
    let head = cx
        .env
        .predicates
        .point(ProgramPoint::new(class, method, 0), entry.state());
    cx.derive(guards, head);
    Ok(())
}

/// `R(P) ∧ RES(callee)[args, result, lhc] ∧ guards ⇒ R(next)`
fn emit_exit(cx: &mut InstrCx<'_>, call: &CallSite, target: &CallTarget, guards: Vec<BoolExpr>) -> Result<()> {
    let width = cx.width();
    let shape = cx.shape();

    let arguments = (0..target.shape.num_arguments as usize)
        .map(|i| match call.argument(i) {
            Some(r) => cx.reg(r).cloned(),
            None => Ok(RegisterState::zero(width)),
        })
        .collect::<Result<Vec<_>>>()?;
    let result = RegisterState::new(
        cx.var(vars::REZ),
        BoolExpr::var(vars::HREZ),
        BoolExpr::var(vars::LREZ),
        BoolExpr::var(vars::GREZ),
    );
    let callee_heap = canonical_heap(vars::CALLEE_HEAP, cx.layout().size(), width);
    let exit = cx
        .env
        .predicates
        .exit(target.class, target.method, &arguments, &result, &callee_heap);

    // epochs the callee left occupied may now also be reachable globally
    let occupied: Vec<_> = cx
        .layout()
        .sites()
        .iter()
        .map(|site| {
            (
                cx.lit(i64::from(site.instance)),
                callee_heap[site.header_slot()].free.clone().negate(),
            )
        })
        .collect();

    let mut post = cx.builder();
    post.map_registers(shape.num_registers as usize + 1, |_, reg| {
        let aliased = BoolExpr::any(
            occupied
                .iter()
                .map(|(id, live)| live.clone().and(reg.value.eq_to(id))),
        );
        // the local view stays valid: the exit heap still holds the epoch
        RegisterState::new(
            reg.value.clone(),
            reg.high.clone(),
            reg.local.clone(),
            reg.global.clone().or(reg.local.clone().and(aliased)),
        )
    });

    if call.return_kind().returns_value() {
        let label = if cx.oracle().is_source(call.class_id(), call.method_id()) {
            BoolExpr::tt()
        } else {
            result.high.clone()
        };
        post.set(shape.return_slot(), result.clone().with_high(label))?;
    }

    let heap = callee_heap
        .iter()
        .zip(cx.pre().heap.iter())
        .map(|(callee, own)| HeapSlot::new(callee.cell.clone(), callee.free.clone().and(own.free.clone())))
        .collect();
    post.set_heap(heap);

    let mut body = vec![exit.into()];
    body.extend(guards);
    cx.step(body, post.state());
    Ok(())
}
