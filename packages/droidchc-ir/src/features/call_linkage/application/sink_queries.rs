//! Leak queries at sink calls

use crate::errors::Result;
use crate::features::call_linkage::domain::CallSite;
use crate::features::chc::domain::{Query, QueryKey};
use crate::features::compiler::domain::InstrCx;
use crate::shared::models::BoolExpr;

/// One query per argument register: can it be high at the call?
pub fn emit(cx: &mut InstrCx<'_>, call: &CallSite) -> Result<()> {
    if !cx.oracle().is_sink(call.class_id(), call.method_id()) {
        return Ok(());
    }

    let key = QueryKey {
        class: cx.method.class_id,
        method: cx.method.method_id,
        pc: cx.instr.pc,
        sink: call.target.to_string(),
    };
    for r in &call.arguments {
        let condition = BoolExpr::all([cx.current(), cx.reg(*r)?.high.clone()]);
        let description = format!(
            "Test if register {} leaks @line {} in method {} of the class {} ---> sink {}",
            r, cx.instr.pc, cx.method.method.name, cx.method.class.name, call.target
        );
        cx.query(Query {
            condition,
            key: key.clone(),
            register: *r,
            description,
        });
    }
    cx.mark_sink_call();
    Ok(())
}
