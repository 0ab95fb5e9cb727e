//! Asynchronous dispatch remaps
//!
//! Calls that hand work to another thread run a different method than the one
//! named at the call site. When the real target resolves, only entry edges
//! into it are emitted and the caller continues unchanged.

use super::linker::emit_entry;
use crate::errors::Result;
use crate::features::call_linkage::domain::CallSite;
use crate::features::compiler::domain::InstrCx;
use crate::shared::models::java_hash;
use tracing::debug;

struct Remap {
    /// Required call-site class; `None` matches any class
    class: Option<&'static str>,
    signature: &'static str,
    /// Class the target is looked up on; `None` is the call-site class
    target_class: Option<&'static str>,
    target: &'static str,
    /// Index of the argument that becomes the receiver
    receiver: usize,
}

const RUNNABLE: &str = "Ljava/lang/Runnable;";

const REMAPS: &[Remap] = &[
    Remap {
        class: None,
        signature: "execute(Ljava/lang/Runnable;)V",
        target_class: Some(RUNNABLE),
        target: "run()V",
        receiver: 1,
    },
    Remap {
        class: None,
        signature: "start()V",
        target_class: None,
        target: "run()V",
        receiver: 0,
    },
    Remap {
        class: None,
        signature: "execute([Ljava/lang/Object;)Landroid/os/AsyncTask;",
        target_class: None,
        target: "doInBackground([Ljava/lang/Object;)Ljava/lang/Object;",
        receiver: 0,
    },
    Remap {
        class: Some("Ljava/lang/Thread;"),
        signature: "<init>(Ljava/lang/Runnable;)V",
        target_class: Some(RUNNABLE),
        target: "run()V",
        receiver: 1,
    },
];

fn find(call: &CallSite) -> Option<&'static Remap> {
    let signature = call.target.signature();
    REMAPS.iter().find(|remap| {
        remap.signature == signature && remap.class.map_or(true, |c| c == call.target.class)
    })
}

/// Emit the remapped entry edges; `false` when the call is not remapped or
/// its real target does not resolve
pub fn apply(cx: &mut InstrCx<'_>, call: &CallSite) -> Result<bool> {
    let Some(remap) = find(call) else {
        return Ok(false);
    };
    let Some(arguments) = call.arguments.get(remap.receiver..).filter(|a| !a.is_empty()) else {
        return Ok(false);
    };

    let class = remap
        .target_class
        .map(java_hash)
        .unwrap_or_else(|| call.class_id());
    let method = java_hash(remap.target);
    let Some(implementations) = cx.oracle().resolve_virtual(class, method) else {
        debug!(call = %call.target, target = remap.target, "remap target unresolved");
        return Ok(false);
    };

    let receiver = cx.reg(arguments[0])?.value.clone();
    for implementation in implementations.iter().filter(|i| i.shape.is_well_formed()) {
        for id in &implementation.instances {
            let guard = receiver.eq_to(&cx.lit(i64::from(*id)));
            emit_entry(
                cx,
                arguments,
                implementation.class,
                implementation.method,
                implementation.shape,
                vec![guard],
            )?;
        }
    }
    cx.identity();
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::dalvik::domain::{Instruction, InvokeKind};

    fn call(kind: InvokeKind, reference: &str) -> CallSite {
        let mut instr = Instruction::new(0, "invoke-virtual");
        instr.registers = vec![1, 2];
        instr.reference = Some(reference.to_string());
        CallSite::from_instruction(&instr, kind).unwrap()
    }

    #[test]
    fn test_remap_matching() {
        let start = call(InvokeKind::Virtual, "LWorker;->start()V");
        assert_eq!(find(&start).map(|r| r.target), Some("run()V"));

        let thread = call(InvokeKind::Direct, "Ljava/lang/Thread;-><init>(Ljava/lang/Runnable;)V");
        assert_eq!(find(&thread).map(|r| r.receiver), Some(1));

        let other_init = call(InvokeKind::Direct, "LWorker;-><init>(Ljava/lang/Runnable;)V");
        assert!(find(&other_init).is_none());
    }
}
