//! invoke-* and invoke-*/range

use crate::errors::Result;
use crate::features::call_linkage::{link_call, CallSite};
use crate::features::compiler::domain::InstrCx;
use crate::features::dalvik::domain::InvokeKind;

pub fn compile_invoke(cx: &mut InstrCx<'_>, kind: InvokeKind) -> Result<()> {
    let call = CallSite::from_instruction(cx.instr, kind)?;
    link_call(cx, &call)
}
