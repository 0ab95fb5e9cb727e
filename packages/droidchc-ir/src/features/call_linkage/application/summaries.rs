//! Library summaries
//!
//! Hand-written models of framework methods whose data flow goes through a
//! heap the analysed code never sees: intent extras, parcels, maps, string
//! buffers, activity results. Rules are tried in order and the first match
//! wins; argument registers are named `C, D, E, F` (receiver first).

use crate::errors::{DroidChcError, Result};
use crate::features::call_linkage::domain::CallSite;
use crate::features::compiler::domain::InstrCx;
use crate::features::dalvik::domain::MethodRef;
use crate::features::symbolic_state::domain::{vars, RegisterState, StateBuilder};
use crate::shared::constants::{
    CHAR_ARRAY, HINT_FIELD, INTENT_CLASS, INTENT_FIELD, MESSAGE_FIELD, PARENT_FIELD, RESULT_FIELD,
    STRING_BUFFER_CLASS,
};
use crate::shared::models::{java_hash, BoolExpr, BvExpr, RelationApp};
use once_cell::sync::Lazy;
use tracing::{trace, warn};

#[derive(Debug, Clone, Copy)]
enum MethodMatch {
    /// Full `name(params)ret`
    Exact(&'static str),
    /// Name prefix
    Prefix(&'static str),
    /// Name substring
    Contains(&'static str),
}

impl MethodMatch {
    fn matches(&self, target: &MethodRef) -> bool {
        match self {
            MethodMatch::Exact(signature) => target.signature() == *signature,
            MethodMatch::Prefix(prefix) => target.name.starts_with(prefix),
            MethodMatch::Contains(part) => target.name.contains(part),
        }
    }
}

type Apply = fn(&mut InstrCx<'_>, &CallSite) -> Result<()>;

struct Summary {
    /// Call-site classes; empty matches any class
    classes: &'static [&'static str],
    method: MethodMatch,
    /// Argument registers the rule reads, receiver included
    min_args: usize,
    apply: Apply,
}

impl Summary {
    fn matches(&self, target: &MethodRef) -> bool {
        (self.classes.is_empty() || self.classes.contains(&target.class.as_str()))
            && self.method.matches(target)
    }
}

const ANY: &[&str] = &[];
const INTENT: &[&str] = &[INTENT_CLASS];
const PARCEL: &[&str] = &["Landroid/os/Parcel;"];
const RUNTIME_EXCEPTION: &[&str] = &["Ljava/lang/RuntimeException;"];
const SMS_MANAGER: &[&str] = &["Landroid/telephony/SmsManager;"];
const POINTF: &[&str] = &["Landroid/graphics/PointF;"];
const MAP: &[&str] = &["Ljava/util/Map;", "Ljava/util/HashMap;"];
const STRING: &[&str] = &["Ljava/lang/String;"];
const FORMATTER: &[&str] = &["Ljava/util/Formatter;"];
const STRING_BUFFER: &[&str] = &[STRING_BUFFER_CLASS];
const SYSTEM: &[&str] = &["Ljava/lang/System;"];
const HINT_VIEWS: &[&str] = &["Landroid/widget/Button;", "Landroid/widget/TextView;"];

fn rule(classes: &'static [&'static str], method: MethodMatch, min_args: usize, apply: Apply) -> Summary {
    Summary {
        classes,
        method,
        min_args,
        apply,
    }
}

static SUMMARIES: Lazy<Vec<Summary>> = Lazy::new(|| {
    use MethodMatch::*;
    vec![
        // intents
        rule(INTENT, Exact("<init>(Ljava/lang/String;)V"), 2, intent_init_action),
        rule(INTENT, Exact("<init>(Landroid/content/Context;Ljava/lang/Class;)V"), 3, intent_init_component),
        rule(INTENT, Prefix("<init>"), 1, intent_init),
        rule(INTENT, Prefix("putExtra"), 3, put_extra),
        rule(INTENT, Exact("getAction()Ljava/lang/String;"), 1, get_action),
        rule(INTENT, Contains("Extra"), 1, get_extra),
        rule(INTENT, Prefix("setComponent"), 2, set_component),
        rule(INTENT, Prefix("setClass"), 2, set_component),
        // activities
        rule(ANY, Prefix("startActivity"), 2, start_activity),
        rule(ANY, Exact("setResult(ILandroid/content/Intent;)V"), 3, set_result),
        rule(ANY, Exact("getIntent()Landroid/content/Intent;"), 0, get_intent),
        // parcels
        rule(PARCEL, Exact("marshall()[B"), 1, marshall),
        rule(PARCEL, Exact("unmarshall([BII)V"), 2, unmarshall),
        rule(PARCEL, Prefix("write"), 2, parcel_write),
        rule(PARCEL, Prefix("read"), 1, parcel_read),
        // exceptions
        rule(RUNTIME_EXCEPTION, Exact("<init>(Ljava/lang/String;)V"), 2, exception_init),
        rule(RUNTIME_EXCEPTION, Exact("getMessage()Ljava/lang/String;"), 1, exception_message),
        // system services
        rule(SMS_MANAGER, Exact("getDefault()Landroid/telephony/SmsManager;"), 0, system_object),
        rule(ANY, Exact("getSystemService(Ljava/lang/String;)Ljava/lang/Object;"), 0, system_object),
        rule(POINTF, Exact("<init>(FF)V"), 3, pointf_init),
        // collections and strings
        rule(MAP, Exact("put(Ljava/lang/Object;Ljava/lang/Object;)Ljava/lang/Object;"), 3, map_put),
        rule(MAP, Exact("get(Ljava/lang/Object;)Ljava/lang/Object;"), 2, map_get),
        rule(STRING, Exact("getChars(II[CI)V"), 4, string_get_chars),
        rule(FORMATTER, Exact("<init>(Ljava/lang/Appendable;)V"), 2, formatter_init),
        rule(FORMATTER, Prefix("format"), 3, formatter_format),
        rule(STRING_BUFFER, Exact("toString()Ljava/lang/String;"), 1, string_buffer_to_string),
        rule(SYSTEM, Exact("arraycopy(Ljava/lang/Object;ILjava/lang/Object;II)V"), 3, array_copy),
        // widgets
        rule(HINT_VIEWS, Exact("getHint()Ljava/lang/CharSequence;"), 1, get_hint),
        rule(HINT_VIEWS, Exact("setHint(Ljava/lang/CharSequence;)V"), 2, set_hint),
    ]
});

/// Apply the first matching summary; `false` when none matches or the call
/// carries too few arguments for it
pub fn apply(cx: &mut InstrCx<'_>, call: &CallSite) -> Result<bool> {
    let Some(summary) = SUMMARIES.iter().find(|s| s.matches(&call.target)) else {
        return Ok(false);
    };
    if call.arguments.len() < summary.min_args {
        warn!(
            call = %call.target,
            arguments = call.arguments.len(),
            "too few arguments for library summary, using generic summary"
        );
        return Ok(false);
    }
    trace!(call = %call.target, pc = cx.instr.pc, "library summary");
    (summary.apply)(cx, call)?;
    Ok(true)
}

// ═══════════════════════════════════════════════════════════════════════════
// Helpers
// ═══════════════════════════════════════════════════════════════════════════

fn arg(call: &CallSite, i: usize) -> Result<u32> {
    call.argument(i).ok_or_else(|| {
        DroidChcError::compile(format!("{} has no argument {}", call.target, i))
    })
}

fn class_lit(cx: &InstrCx<'_>, name: &str) -> BvExpr {
    cx.heap().id(java_hash(name))
}

/// Heap fact read into `(value, lf, bf)` variables
fn read_vars(cx: &InstrCx<'_>, value: &str) -> (BvExpr, BoolExpr, BoolExpr) {
    (cx.var(value), BoolExpr::var(vars::LF), BoolExpr::var(vars::BF))
}

/// `HI(intent, k, val, lf, bf)` over fresh variables
fn extras_of(cx: &InstrCx<'_>, intent: &BvExpr) -> RelationApp {
    let (val, lf, bf) = read_vars(cx, vars::VAL);
    cx.heap().hi(intent.clone(), cx.var(vars::F), val, lf, bf)
}

/// `R(P) ∧ guards ⇒ R(next)` with the return slot set to `result`
fn returns(cx: &mut InstrCx<'_>, guards: Vec<BoolExpr>, result: RegisterState) -> Result<()> {
    let mut post = cx.builder();
    post.set(cx.shape().return_slot(), result)?;
    cx.step(guards, post.state());
    Ok(())
}

/// Identity plus a lift when `value` holds a local reference
fn store_and_continue(cx: &mut InstrCx<'_>, value: u32) -> Result<()> {
    cx.identity();
    cx.lift_if_local(value, Vec::new(), |_| Ok(()))
}

// ═══════════════════════════════════════════════════════════════════════════
// Intents
// ═══════════════════════════════════════════════════════════════════════════

fn new_intent(cx: &mut InstrCx<'_>, call: &CallSite, key: BvExpr) -> Result<()> {
    let receiver = arg(call, 0)?;
    let intent = cx.reg(receiver)?.value.clone();
    let head = cx
        .heap()
        .hi(intent.clone(), key, cx.lit(0), BoolExpr::ff(), BoolExpr::ff());
    cx.derive(Vec::new(), head);

    let mut post = cx.builder();
    post.set(
        receiver,
        RegisterState::new(intent, BoolExpr::ff(), BoolExpr::ff(), BoolExpr::tt()),
    )?;
    cx.step(Vec::new(), post.state());
    Ok(())
}

/// `new Intent(action)`: keyed by the action string
fn intent_init_action(cx: &mut InstrCx<'_>, call: &CallSite) -> Result<()> {
    let key = cx.reg(arg(call, 1)?)?.value.clone();
    new_intent(cx, call, key)
}

/// `new Intent(context, target)`: keyed by the target class
fn intent_init_component(cx: &mut InstrCx<'_>, call: &CallSite) -> Result<()> {
    let key = cx.reg(arg(call, 2)?)?.value.clone();
    new_intent(cx, call, key)
}

fn intent_init(cx: &mut InstrCx<'_>, call: &CallSite) -> Result<()> {
    let key = cx.var(vars::F);
    new_intent(cx, call, key)
}

/// `intent.putExtra(key, value)` returns the intent
fn put_extra(cx: &mut InstrCx<'_>, call: &CallSite) -> Result<()> {
    let (c, d, e) = (arg(call, 0)?, arg(call, 1)?, arg(call, 2)?);
    let intent = cx.reg(c)?;
    let key = cx.reg(d)?;
    let value = cx.reg(e)?;

    let head = cx.heap().hi(
        intent.value.clone(),
        key.value.clone(),
        value.value.clone(),
        value.high.clone(),
        value.blocked(),
    );
    let extras: BoolExpr = extras_of(cx, &intent.value).into();
    cx.derive(vec![extras], head);

    let return_slot = cx.shape().return_slot();
    let update = |post: &mut StateBuilder| -> Result<()> {
        post.taint(c, value.high.clone())?;
        let tainted = post.register(c)?.clone();
        post.set(return_slot, tainted)?;
        Ok(())
    };
    let mut post = cx.builder();
    update(&mut post)?;
    cx.step(Vec::new(), post.state());
    cx.lift_if_local(e, Vec::new(), update)
}

/// `intent.get*Extra(key)`
fn get_extra(cx: &mut InstrCx<'_>, call: &CallSite) -> Result<()> {
    let intent = cx.reg(arg(call, 0)?)?;
    let (val, lf, bf) = read_vars(cx, vars::VAL);
    let label = if cx.oracle().is_source(call.class_id(), call.method_id()) {
        BoolExpr::tt()
    } else {
        lf
    };
    let guard: BoolExpr = extras_of(cx, &intent.value).into();
    returns(cx, vec![guard], RegisterState::new(val, label, BoolExpr::ff(), bf))
}

fn get_action(cx: &mut InstrCx<'_>, call: &CallSite) -> Result<()> {
    let intent = cx.reg(arg(call, 0)?)?;
    let (val, _, bf) = read_vars(cx, vars::VAL);
    let guard: BoolExpr = extras_of(cx, &intent.value).into();
    returns(cx, vec![guard], RegisterState::new(val, BoolExpr::ff(), BoolExpr::ff(), bf))
}

/// `setComponent`/`setClass*`: extras move to the new target key
fn set_component(cx: &mut InstrCx<'_>, call: &CallSite) -> Result<()> {
    let c = arg(call, 0)?;
    let last = arg(call, call.arguments.len() - 1)?;
    let intent = cx.reg(c)?;
    let (val, lf, bf) = read_vars(cx, vars::VAL);
    let head = cx
        .heap()
        .hi(intent.value.clone(), cx.reg(last)?.value.clone(), val, lf, bf);
    let extras: BoolExpr = extras_of(cx, &intent.value).into();
    cx.derive(vec![extras], head);
    returns(cx, Vec::new(), intent.clone())
}

// ═══════════════════════════════════════════════════════════════════════════
// Activities
// ═══════════════════════════════════════════════════════════════════════════

/// `startActivity*(intent, …)`: the launched activity (the extras' target
/// key) is started and sees the extras, its parent and the intent itself
fn start_activity(cx: &mut InstrCx<'_>, call: &CallSite) -> Result<()> {
    let intent = cx.reg(arg(call, 1)?)?.value.clone();
    let heap = cx.heap();
    let caller = heap.id(cx.method.class_id);
    let target = cx.var(vars::F);
    let (val, lf, bf) = read_vars(cx, vars::VAL);
    let extras: BoolExpr = extras_of(cx, &intent).into();

    cx.derive(vec![extras.clone()], heap.i(target.clone(), caller.clone(), val, lf, bf));
    cx.derive(
        vec![extras.clone()],
        heap.h(
            target.clone(),
            target.clone(),
            heap.named_field(PARENT_FIELD),
            caller,
            BoolExpr::ff(),
            BoolExpr::tt(),
        ),
    );
    cx.derive(
        vec![extras],
        heap.h(
            target.clone(),
            target,
            heap.named_field(INTENT_FIELD),
            intent,
            BoolExpr::ff(),
            BoolExpr::tt(),
        ),
    );
    cx.identity();
    Ok(())
}

/// `setResult(code, intent)`
fn set_result(cx: &mut InstrCx<'_>, call: &CallSite) -> Result<()> {
    let intent = cx.reg(arg(call, 2)?)?;
    let heap = cx.heap();
    let activity = heap.id(cx.method.class_id);
    let head = heap.h(
        activity.clone(),
        activity,
        heap.named_field(RESULT_FIELD),
        intent.value.clone(),
        intent.high.clone(),
        intent.blocked(),
    );
    let extras: BoolExpr = extras_of(cx, &intent.value).into();
    cx.derive(vec![extras], head);
    cx.identity();
    Ok(())
}

/// `getIntent()`: the intent this activity was launched with
fn get_intent(cx: &mut InstrCx<'_>, _call: &CallSite) -> Result<()> {
    let heap = cx.heap();
    let activity = heap.id(cx.method.class_id);
    let (val, lf, bf) = read_vars(cx, vars::VAL);
    let guard: BoolExpr = heap
        .h(
            activity.clone(),
            activity,
            heap.named_field(INTENT_FIELD),
            val.clone(),
            lf.clone(),
            bf.clone(),
        )
        .into();
    returns(cx, vec![guard], RegisterState::new(val, lf, BoolExpr::ff(), bf))
}

// ═══════════════════════════════════════════════════════════════════════════
// Parcels
// ═══════════════════════════════════════════════════════════════════════════

fn parcel_write(cx: &mut InstrCx<'_>, call: &CallSite) -> Result<()> {
    let (c, d) = (arg(call, 0)?, arg(call, 1)?);
    let parcel = cx.reg(c)?;
    let value = cx.reg(d)?;
    let head = cx.heap().h(
        class_lit(cx, PARCEL[0]),
        parcel.value.clone(),
        cx.lit(0),
        value.value.clone(),
        value.high.clone(),
        value.blocked(),
    );
    cx.derive(Vec::new(), head);
    store_and_continue(cx, d)
}

fn parcel_read(cx: &mut InstrCx<'_>, call: &CallSite) -> Result<()> {
    let parcel = cx.reg(arg(call, 0)?)?;
    let (f, lf, bf) = read_vars(cx, vars::F);
    let guard: BoolExpr = cx
        .heap()
        .h(class_lit(cx, PARCEL[0]), parcel.value.clone(), cx.lit(0), f.clone(), lf.clone(), bf.clone())
        .into();
    returns(cx, vec![guard], RegisterState::new(f, lf, BoolExpr::ff(), bf))
}

/// `parcel.marshall()` returns the parcel itself
fn marshall(cx: &mut InstrCx<'_>, call: &CallSite) -> Result<()> {
    let parcel = cx.reg(arg(call, 0)?)?.clone();
    returns(cx, Vec::new(), parcel)
}

/// `parcel.unmarshall(bytes, …)` makes the parcel the byte array
fn unmarshall(cx: &mut InstrCx<'_>, call: &CallSite) -> Result<()> {
    let (c, d) = (arg(call, 0)?, arg(call, 1)?);
    let bytes = cx.reg(d)?.clone();
    let mut post = cx.builder();
    post.set(c, bytes)?;
    cx.step(Vec::new(), post.state());
    Ok(())
}

// ═══════════════════════════════════════════════════════════════════════════
// Exceptions and system objects
// ═══════════════════════════════════════════════════════════════════════════

fn exception_init(cx: &mut InstrCx<'_>, call: &CallSite) -> Result<()> {
    let (c, d) = (arg(call, 0)?, arg(call, 1)?);
    let exception = cx.reg(c)?;
    let message = cx.reg(d)?;
    let heap = cx.heap();
    let head = heap.h(
        class_lit(cx, RUNTIME_EXCEPTION[0]),
        exception.value.clone(),
        heap.named_field(MESSAGE_FIELD),
        message.value.clone(),
        message.high.clone(),
        message.blocked(),
    );
    cx.derive(Vec::new(), head);
    store_and_continue(cx, d)
}

fn exception_message(cx: &mut InstrCx<'_>, call: &CallSite) -> Result<()> {
    let exception = cx.reg(arg(call, 0)?)?;
    let heap = cx.heap();
    let (f, lf, bf) = read_vars(cx, vars::F);
    let guard: BoolExpr = heap
        .h(
            class_lit(cx, RUNTIME_EXCEPTION[0]),
            exception.value.clone(),
            heap.named_field(MESSAGE_FIELD),
            f.clone(),
            lf.clone(),
            bf.clone(),
        )
        .into();
    returns(cx, vec![guard], RegisterState::new(f, lf, BoolExpr::ff(), bf))
}

/// Framework singletons: a fresh global object of the return type
fn system_object(cx: &mut InstrCx<'_>, call: &CallSite) -> Result<()> {
    let id = cx.lit(i64::from(cx.allocation_id()));
    let head = cx.heap().h(
        class_lit(cx, &call.target.return_type),
        id.clone(),
        cx.var(vars::F),
        cx.var(vars::VFP),
        BoolExpr::ff(),
        BoolExpr::var(vars::BF),
    );
    cx.derive(Vec::new(), head);
    returns(cx, Vec::new(), RegisterState::global_ref(id, BoolExpr::ff()))
}

fn pointf_init(cx: &mut InstrCx<'_>, call: &CallSite) -> Result<()> {
    let point = cx.reg(arg(call, 0)?)?;
    let heap = cx.heap();
    for (i, name) in [(1, "x"), (2, "y")] {
        let coordinate = cx.reg(arg(call, i)?)?;
        let head = heap.h(
            class_lit(cx, POINTF[0]),
            point.value.clone(),
            heap.field(name, "F"),
            coordinate.value.clone(),
            coordinate.high.clone(),
            coordinate.blocked(),
        );
        cx.derive(Vec::new(), head);
    }
    cx.identity();
    Ok(())
}

// ═══════════════════════════════════════════════════════════════════════════
// Collections and strings
// ═══════════════════════════════════════════════════════════════════════════

/// `map.put(k, v)`: entries keyed by the key's value
fn map_put(cx: &mut InstrCx<'_>, call: &CallSite) -> Result<()> {
    let (c, d, e) = (arg(call, 0)?, arg(call, 1)?, arg(call, 2)?);
    let map = cx.reg(c)?;
    let key = cx.reg(d)?;
    let value = cx.reg(e)?;
    let head = cx.heap().h(
        class_lit(cx, MAP[0]),
        map.value.clone(),
        key.value.clone(),
        value.value.clone(),
        value.high.clone(),
        value.blocked(),
    );
    cx.derive(Vec::new(), head);

    let width = cx.width();
    let return_slot = cx.shape().return_slot();
    let update = |post: &mut StateBuilder| -> Result<()> {
        post.set(return_slot, RegisterState::zero(width))?;
        Ok(())
    };
    let mut post = cx.builder();
    update(&mut post)?;
    cx.step(Vec::new(), post.state());
    cx.lift_if_local(e, Vec::new(), update)
}

fn map_get(cx: &mut InstrCx<'_>, call: &CallSite) -> Result<()> {
    let map = cx.reg(arg(call, 0)?)?;
    let key = cx.reg(arg(call, 1)?)?;
    let (f, lf, bf) = read_vars(cx, vars::F);
    let guard: BoolExpr = cx
        .heap()
        .h(class_lit(cx, MAP[0]), map.value.clone(), key.value.clone(), f.clone(), lf.clone(), bf.clone())
        .into();
    returns(cx, vec![guard], RegisterState::new(f, lf, BoolExpr::ff(), bf))
}

/// `s.getChars(begin, end, dst, dstBegin)` taints `dst` with `s`
fn string_get_chars(cx: &mut InstrCx<'_>, call: &CallSite) -> Result<()> {
    let string = cx.reg(arg(call, 0)?)?;
    let dst = cx.reg(arg(call, 3)?)?;
    let heap = cx.heap();
    let chars = class_lit(cx, CHAR_ARRAY);
    let (vfp, lf, bf) = read_vars(cx, vars::VFP);
    let guard: BoolExpr = heap
        .h(chars.clone(), dst.value.clone(), cx.lit(0), vfp, lf, bf)
        .into();
    let head = heap.h(
        chars,
        dst.value.clone(),
        cx.lit(0),
        cx.var(vars::FPP),
        string.high.clone(),
        string.blocked(),
    );
    cx.derive(vec![guard], head);
    cx.identity();
    Ok(())
}

/// `new Formatter(appendable)` links the formatter to its buffer
fn formatter_init(cx: &mut InstrCx<'_>, call: &CallSite) -> Result<()> {
    let formatter = cx.reg(arg(call, 0)?)?;
    let buffer = cx.reg(arg(call, 1)?)?;
    let head = cx.heap().h(
        class_lit(cx, STRING_BUFFER_CLASS),
        buffer.value.clone(),
        cx.lit(0),
        formatter.value.clone(),
        BoolExpr::ff(),
        BoolExpr::tt(),
    );
    cx.derive(Vec::new(), head);
    cx.identity();
    Ok(())
}

/// `formatter.format(fmt, args)` taints the linked buffer
fn formatter_format(cx: &mut InstrCx<'_>, call: &CallSite) -> Result<()> {
    let formatter = cx.reg(arg(call, 0)?)?;
    let format = cx.reg(arg(call, 1)?)?;
    let args = cx.reg(arg(call, 2)?)?;
    let heap = cx.heap();
    let buffer_class = class_lit(cx, STRING_BUFFER_CLASS);
    let (f, lf, bf) = read_vars(cx, vars::F);
    let guard: BoolExpr = heap
        .h(buffer_class.clone(), f.clone(), cx.lit(0), formatter.value.clone(), lf, bf)
        .into();
    let head = heap.h(
        buffer_class,
        f,
        cx.lit(0),
        formatter.value.clone(),
        format.high.clone().or(args.high.clone()),
        BoolExpr::tt(),
    );
    cx.derive(vec![guard], head);
    returns(cx, Vec::new(), formatter.clone())
}

/// `buffer.toString()`: what was formatted into it, or the buffer's own label
fn string_buffer_to_string(cx: &mut InstrCx<'_>, call: &CallSite) -> Result<()> {
    let buffer = cx.reg(arg(call, 0)?)?;
    let fpp = cx.var(vars::FPP);
    let (f, lf, bf) = read_vars(cx, vars::F);
    let guard: BoolExpr = cx
        .heap()
        .h(class_lit(cx, STRING_BUFFER_CLASS), buffer.value.clone(), cx.lit(0), f, lf.clone(), bf.clone())
        .into();
    returns(cx, vec![guard], RegisterState::new(fpp.clone(), lf, BoolExpr::ff(), bf))?;
    returns(
        cx,
        Vec::new(),
        RegisterState::new(fpp, buffer.high.clone(), BoolExpr::ff(), BoolExpr::tt()),
    )
}

/// `System.arraycopy(src, srcPos, dst, …)`
fn array_copy(cx: &mut InstrCx<'_>, call: &CallSite) -> Result<()> {
    let src = cx.reg(arg(call, 0)?)?;
    let dst = cx.reg(arg(call, 2)?)?;
    let heap = cx.heap();
    let class = cx.var(vars::CN);
    let field = cx.var(vars::F);
    let (val, lf, bf) = read_vars(cx, vars::VAL);
    let guard: BoolExpr = heap
        .h(class.clone(), src.value.clone(), field.clone(), val.clone(), lf.clone(), bf.clone())
        .into();
    let head = heap.h(class, dst.value.clone(), field, val, lf, bf);
    cx.derive(vec![guard], head);
    cx.identity();
    Ok(())
}

// ═══════════════════════════════════════════════════════════════════════════
// Widgets
// ═══════════════════════════════════════════════════════════════════════════

fn get_hint(cx: &mut InstrCx<'_>, call: &CallSite) -> Result<()> {
    let view = cx.reg(arg(call, 0)?)?;
    let heap = cx.heap();
    let (f, lf, bf) = read_vars(cx, vars::F);
    let guard: BoolExpr = heap
        .h(
            class_lit(cx, HINT_VIEWS[0]),
            view.value.clone(),
            heap.named_field(HINT_FIELD),
            f.clone(),
            lf.clone(),
            bf.clone(),
        )
        .into();
    returns(cx, vec![guard], RegisterState::new(f, lf, BoolExpr::ff(), bf))?;
    let empty = RegisterState::new(cx.lit(0), BoolExpr::ff(), BoolExpr::ff(), BoolExpr::tt());
    returns(cx, Vec::new(), empty)
}

fn set_hint(cx: &mut InstrCx<'_>, call: &CallSite) -> Result<()> {
    let (c, d) = (arg(call, 0)?, arg(call, 1)?);
    let view = cx.reg(c)?;
    let hint = cx.reg(d)?;
    let heap = cx.heap();
    let head = heap.h(
        class_lit(cx, HINT_VIEWS[0]),
        view.value.clone(),
        heap.named_field(HINT_FIELD),
        hint.value.clone(),
        hint.high.clone(),
        hint.blocked(),
    );
    cx.derive(Vec::new(), head);
    store_and_continue(cx, d)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn target(reference: &str) -> MethodRef {
        MethodRef::parse(reference).unwrap()
    }

    fn first_match(reference: &str) -> Option<usize> {
        let target = target(reference);
        SUMMARIES.iter().position(|s| s.matches(&target))
    }

    #[test]
    fn test_intent_constructors_pick_specific_rules_first() {
        let action = first_match("Landroid/content/Intent;-><init>(Ljava/lang/String;)V").unwrap();
        let component =
            first_match("Landroid/content/Intent;-><init>(Landroid/content/Context;Ljava/lang/Class;)V")
                .unwrap();
        let plain = first_match("Landroid/content/Intent;-><init>()V").unwrap();
        assert!(action < plain);
        assert!(component < plain);
        assert_eq!(SUMMARIES[plain].min_args, 1);
    }

    #[test]
    fn test_put_extra_is_not_a_read() {
        let put = first_match(
            "Landroid/content/Intent;->putExtra(Ljava/lang/String;Ljava/lang/String;)Landroid/content/Intent;",
        )
        .unwrap();
        let get = first_match("Landroid/content/Intent;->getStringExtra(Ljava/lang/String;)Ljava/lang/String;")
            .unwrap();
        assert_ne!(put, get);
        assert_eq!(SUMMARIES[put].min_args, 3);
        assert_eq!(SUMMARIES[get].min_args, 1);
    }

    #[test]
    fn test_activity_rules_match_any_class() {
        assert!(first_match("LMainActivity;->startActivity(Landroid/content/Intent;)V").is_some());
        assert!(first_match("LMainActivity;->getIntent()Landroid/content/Intent;").is_some());
        assert!(first_match("LMainActivity;->onCreate(Landroid/os/Bundle;)V").is_none());
    }

    #[test]
    fn test_map_rules_cover_hash_map() {
        assert!(first_match("Ljava/util/HashMap;->put(Ljava/lang/Object;Ljava/lang/Object;)Ljava/lang/Object;").is_some());
        assert!(first_match("Ljava/util/TreeMap;->put(Ljava/lang/Object;Ljava/lang/Object;)Ljava/lang/Object;").is_none());
    }
}
