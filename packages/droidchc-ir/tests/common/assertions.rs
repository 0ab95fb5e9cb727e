//! Custom assertions for test verification
//!
//! Clauses are inspected structurally: a transition out of point `P` has the
//! point relation of `P` as its first body atom, and its remaining body
//! elements are guards that can be evaluated under a concrete valuation.

use droidchc_ir::features::symbolic_state::domain::vars;
use droidchc_ir::shared::models::{
    BoolExpr, BvExpr, FrameShape, ProgramPoint, RelationApp, Term, Valuation, Value,
};
use droidchc_ir::{Clause, CompilationReport};

/// The four components of one register inside a point relation
#[derive(Debug, Clone, Copy)]
pub struct RegisterView<'a> {
    pub value: &'a BvExpr,
    pub high: &'a BoolExpr,
    pub local: &'a BoolExpr,
    pub global: &'a BoolExpr,
}

/// One local-heap slot inside a point relation
#[derive(Debug, Clone, Copy)]
pub struct SlotView<'a> {
    pub value: &'a BvExpr,
    pub high: &'a BoolExpr,
    pub local: &'a BoolExpr,
    pub global: &'a BoolExpr,
    pub free: &'a BoolExpr,
}

fn bv(term: &Term) -> &BvExpr {
    term.as_bv().expect("bit-vector argument")
}

fn boolean(term: &Term) -> &BoolExpr {
    term.as_bool().expect("boolean argument")
}

/// Slot `r` of the point relation `app` of a method with `shape`
pub fn register(app: &RelationApp, shape: FrameShape, r: u32) -> RegisterView<'_> {
    let n = shape.slot_count() as usize;
    let r = r as usize;
    RegisterView {
        value: bv(&app.args[r]),
        high: boolean(&app.args[n + r]),
        local: boolean(&app.args[2 * n + r]),
        global: boolean(&app.args[3 * n + r]),
    }
}

/// Local-heap slot `k` of the point relation `app` (heap of `heap_size` slots)
pub fn heap_slot(app: &RelationApp, shape: FrameShape, heap_size: usize, k: usize) -> SlotView<'_> {
    let base = 4 * shape.slot_count() as usize;
    SlotView {
        value: bv(&app.args[base + k]),
        high: boolean(&app.args[base + heap_size + k]),
        local: boolean(&app.args[base + 2 * heap_size + k]),
        global: boolean(&app.args[base + 3 * heap_size + k]),
        free: boolean(&app.args[base + 4 * heap_size + k]),
    }
}

/// Clauses whose body starts at `from`
pub fn clauses_from<'a>(clauses: &'a [Clause], from: ProgramPoint) -> Vec<&'a Clause> {
    let name = from.relation_name();
    clauses
        .iter()
        .filter(|c| matches!(c.body.first(), Some(BoolExpr::App(app)) if app.name == name))
        .collect()
}

/// Transitions `from -> to`
pub fn transitions<'a>(clauses: &'a [Clause], from: ProgramPoint, to: ProgramPoint) -> Vec<&'a Clause> {
    let name = to.relation_name();
    clauses_from(clauses, from)
        .into_iter()
        .filter(|c| c.head.name == name)
        .collect()
}

/// Clauses deriving relation `name` out of `from`
pub fn derived_from<'a>(clauses: &'a [Clause], from: ProgramPoint, name: &str) -> Vec<&'a Clause> {
    clauses_from(clauses, from)
        .into_iter()
        .filter(|c| c.head.name == name)
        .collect()
}

/// Conjunction of the non-relational body elements
pub fn guards(clause: &Clause) -> BoolExpr {
    BoolExpr::all(
        clause
            .body
            .iter()
            .filter(|b| !matches!(b, BoolExpr::App(_)))
            .cloned(),
    )
}

/// Whether the guards of `clause` hold under `env`
pub fn guards_hold(clause: &Clause, env: &Valuation) -> bool {
    guards(clause).eval(env) == Some(true)
}

/// Valuation of the canonical pre-state: every register zero and clean,
/// every local-heap slot zero and free
pub fn canonical_env(shape: FrameShape, heap_size: usize) -> Valuation {
    let mut env = Valuation::new();
    for r in 0..shape.slot_count() {
        env.set(vars::value(r), Value::Bv(0))
            .set(vars::high(r), Value::Bool(false))
            .set(vars::local(r), Value::Bool(false))
            .set(vars::global(r), Value::Bool(false));
    }
    for k in 0..heap_size {
        env.set(vars::heap_value(vars::HEAP, k), Value::Bv(0))
            .set(vars::heap_high(vars::HEAP, k), Value::Bool(false))
            .set(vars::heap_local(vars::HEAP, k), Value::Bool(false))
            .set(vars::heap_global(vars::HEAP, k), Value::Bool(false))
            .set(vars::heap_free(vars::HEAP, k), Value::Bool(true));
    }
    env
}

/// Assert that every method compiled
pub fn assert_all_compiled(report: &CompilationReport) {
    assert_eq!(
        report.methods_skipped, 0,
        "Expected no skipped methods, report: {:?}",
        report
    );
}

/// Assert that exactly one clause leads `from -> to` and return it
pub fn single_transition<'a>(clauses: &'a [Clause], from: ProgramPoint, to: ProgramPoint) -> &'a Clause {
    let found = transitions(clauses, from, to);
    assert_eq!(
        found.len(),
        1,
        "Expected one transition {} -> {}, got: {:#?}",
        from,
        to,
        found.iter().map(|c| c.to_string()).collect::<Vec<_>>()
    );
    found[0]
}
