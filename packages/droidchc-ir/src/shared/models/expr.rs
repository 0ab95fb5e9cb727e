//! SMT expression AST
//!
//! Terms over three sorts: fixed-width bit-vectors (register values), booleans
//! (taint and heap-location flags) and mathematical integers (class and field
//! keys of the static heap). `Display` renders SMT-LIB2; `eval` evaluates
//! ground-able expressions against a concrete assignment, which the tests use
//! in place of a solver.

use super::ids::{bv_literal, mask};
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Sort {
    Bool,
    BitVec(u32),
    Int,
}

impl fmt::Display for Sort {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Sort::Bool => write!(f, "Bool"),
            Sort::BitVec(w) => write!(f, "(_ BitVec {})", w),
            Sort::Int => write!(f, "Int"),
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// Bit-vector terms
// ═══════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BvOp {
    Add,
    Sub,
    Mul,
    UDiv,
    URem,
    And,
    Or,
    Xor,
    Shl,
    AShr,
    LShr,
}

impl BvOp {
    pub fn smt_name(&self) -> &'static str {
        match self {
            BvOp::Add => "bvadd",
            BvOp::Sub => "bvsub",
            BvOp::Mul => "bvmul",
            BvOp::UDiv => "bvudiv",
            BvOp::URem => "bvurem",
            BvOp::And => "bvand",
            BvOp::Or => "bvor",
            BvOp::Xor => "bvxor",
            BvOp::Shl => "bvshl",
            BvOp::AShr => "bvashr",
            BvOp::LShr => "bvlshr",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BvUnOp {
    Neg,
    Not,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum BvExpr {
    Lit { value: u128, width: u32 },
    Var { name: String, width: u32 },
    Un(BvUnOp, Box<BvExpr>),
    Bin(BvOp, Box<BvExpr>, Box<BvExpr>),
    Ite(Box<BoolExpr>, Box<BvExpr>, Box<BvExpr>),
}

impl BvExpr {
    /// Literal from a signed Dalvik constant
    pub fn lit(value: i64, width: u32) -> Self {
        BvExpr::Lit {
            value: bv_literal(value, width),
            width,
        }
    }

    pub fn zero(width: u32) -> Self {
        BvExpr::Lit { value: 0, width }
    }

    pub fn var(name: impl Into<String>, width: u32) -> Self {
        BvExpr::Var {
            name: name.into(),
            width,
        }
    }

    pub fn bin(op: BvOp, lhs: BvExpr, rhs: BvExpr) -> Self {
        BvExpr::Bin(op, Box::new(lhs), Box::new(rhs))
    }

    pub fn un(op: BvUnOp, operand: BvExpr) -> Self {
        BvExpr::Un(op, Box::new(operand))
    }

    pub fn ite(cond: BoolExpr, then: BvExpr, otherwise: BvExpr) -> Self {
        match cond {
            BoolExpr::Const(true) => then,
            BoolExpr::Const(false) => otherwise,
            cond => BvExpr::Ite(Box::new(cond), Box::new(then), Box::new(otherwise)),
        }
    }

    pub fn width(&self) -> u32 {
        match self {
            BvExpr::Lit { width, .. } | BvExpr::Var { width, .. } => *width,
            BvExpr::Un(_, e) => e.width(),
            BvExpr::Bin(_, l, _) => l.width(),
            BvExpr::Ite(_, t, _) => t.width(),
        }
    }

    /// `self == other`
    pub fn eq_to(&self, other: &BvExpr) -> BoolExpr {
        BoolExpr::cmp(BvCmp::Eq, self.clone(), other.clone())
    }

    pub fn eval(&self, env: &Valuation) -> Option<u128> {
        match self {
            BvExpr::Lit { value, .. } => Some(*value),
            BvExpr::Var { name, .. } => env.bv(name),
            BvExpr::Un(op, e) => {
                let m = mask(e.width());
                let v = e.eval(env)?;
                Some(match op {
                    BvUnOp::Neg => v.wrapping_neg() & m,
                    BvUnOp::Not => !v & m,
                })
            }
            BvExpr::Bin(op, l, r) => {
                let width = l.width();
                let (a, b) = (l.eval(env)?, r.eval(env)?);
                Some(eval_bin(*op, a, b, width))
            }
            BvExpr::Ite(c, t, e) => {
                if c.eval(env)? {
                    t.eval(env)
                } else {
                    e.eval(env)
                }
            }
        }
    }

    pub fn visit_vars(&self, f: &mut impl FnMut(&str, Sort)) {
        match self {
            BvExpr::Lit { .. } => {}
            BvExpr::Var { name, width } => f(name, Sort::BitVec(*width)),
            BvExpr::Un(_, e) => e.visit_vars(f),
            BvExpr::Bin(_, l, r) => {
                l.visit_vars(f);
                r.visit_vars(f);
            }
            BvExpr::Ite(c, t, e) => {
                c.visit_vars(f);
                t.visit_vars(f);
                e.visit_vars(f);
            }
        }
    }
}

fn eval_bin(op: BvOp, a: u128, b: u128, width: u32) -> u128 {
    let m = mask(width);
    let sign_bit = 1u128 << (width - 1);
    let r = match op {
        BvOp::Add => a.wrapping_add(b),
        BvOp::Sub => a.wrapping_sub(b),
        BvOp::Mul => a.wrapping_mul(b),
        // SMT-LIB: x / 0 = all ones, x % 0 = x
        BvOp::UDiv => a.checked_div(b).unwrap_or(m),
        BvOp::URem => a.checked_rem(b).unwrap_or(a),
        BvOp::And => a & b,
        BvOp::Or => a | b,
        BvOp::Xor => a ^ b,
        BvOp::Shl => {
            if b >= u128::from(width) {
                0
            } else {
                a << b
            }
        }
        BvOp::LShr => {
            if b >= u128::from(width) {
                0
            } else {
                a >> b
            }
        }
        BvOp::AShr => {
            let negative = a & sign_bit != 0;
            if b >= u128::from(width) {
                if negative {
                    m
                } else {
                    0
                }
            } else {
                let shifted = a >> b;
                if negative {
                    shifted | (m & !(m >> b))
                } else {
                    shifted
                }
            }
        }
    };
    r & m
}

impl fmt::Display for BvExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BvExpr::Lit { value, width } => write!(f, "(_ bv{} {})", value, width),
            BvExpr::Var { name, .. } => write!(f, "{}", name),
            BvExpr::Un(BvUnOp::Neg, e) => write!(f, "(bvneg {})", e),
            BvExpr::Un(BvUnOp::Not, e) => write!(f, "(bvnot {})", e),
            BvExpr::Bin(op, l, r) => write!(f, "({} {} {})", op.smt_name(), l, r),
            BvExpr::Ite(c, t, e) => write!(f, "(ite {} {} {})", c, t, e),
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// Integer terms (static heap keys)
// ═══════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum IntExpr {
    Lit(i64),
    Var(String),
}

impl IntExpr {
    pub fn eval(&self, env: &Valuation) -> Option<i64> {
        match self {
            IntExpr::Lit(v) => Some(*v),
            IntExpr::Var(name) => env.int(name),
        }
    }
}

impl fmt::Display for IntExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IntExpr::Lit(v) if *v < 0 => write!(f, "(- {})", v.unsigned_abs()),
            IntExpr::Lit(v) => write!(f, "{}", v),
            IntExpr::Var(name) => write!(f, "{}", name),
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// Boolean formulas
// ═══════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BvCmp {
    Eq,
    Ult,
    Ule,
    Ugt,
    Uge,
}

impl BvCmp {
    pub fn smt_name(&self) -> &'static str {
        match self {
            BvCmp::Eq => "=",
            BvCmp::Ult => "bvult",
            BvCmp::Ule => "bvule",
            BvCmp::Ugt => "bvugt",
            BvCmp::Uge => "bvuge",
        }
    }

    fn holds(&self, a: u128, b: u128) -> bool {
        match self {
            BvCmp::Eq => a == b,
            BvCmp::Ult => a < b,
            BvCmp::Ule => a <= b,
            BvCmp::Ugt => a > b,
            BvCmp::Uge => a >= b,
        }
    }
}

/// Application of a declared relation to argument terms
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RelationApp {
    pub name: String,
    pub args: Vec<Term>,
}

impl RelationApp {
    pub fn new(name: impl Into<String>, args: Vec<Term>) -> Self {
        Self {
            name: name.into(),
            args,
        }
    }

    pub fn arity(&self) -> usize {
        self.args.len()
    }

    /// Argument sorts, for lazy declaration
    pub fn signature(&self) -> Vec<Sort> {
        self.args.iter().map(Term::sort).collect()
    }

    pub fn visit_vars(&self, f: &mut impl FnMut(&str, Sort)) {
        for arg in &self.args {
            arg.visit_vars(f);
        }
    }
}

impl fmt::Display for RelationApp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.args.is_empty() {
            return write!(f, "{}", self.name);
        }
        write!(f, "({}", self.name)?;
        for arg in &self.args {
            write!(f, " {}", arg)?;
        }
        write!(f, ")")
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum BoolExpr {
    Const(bool),
    Var(String),
    Not(Box<BoolExpr>),
    And(Vec<BoolExpr>),
    Or(Vec<BoolExpr>),
    Cmp(BvCmp, BvExpr, BvExpr),
    App(RelationApp),
}

impl BoolExpr {
    pub fn tt() -> Self {
        BoolExpr::Const(true)
    }

    pub fn ff() -> Self {
        BoolExpr::Const(false)
    }

    pub fn var(name: impl Into<String>) -> Self {
        BoolExpr::Var(name.into())
    }

    pub fn cmp(op: BvCmp, lhs: BvExpr, rhs: BvExpr) -> Self {
        BoolExpr::Cmp(op, lhs, rhs)
    }

    /// Conjunction, flattening nested conjunctions and folding constants
    pub fn all(parts: impl IntoIterator<Item = BoolExpr>) -> Self {
        let mut out = Vec::new();
        for part in parts {
            match part {
                BoolExpr::Const(true) => {}
                BoolExpr::Const(false) => return BoolExpr::ff(),
                BoolExpr::And(inner) => out.extend(inner),
                other => out.push(other),
            }
        }
        match out.len() {
            0 => BoolExpr::tt(),
            1 => out.remove(0),
            _ => BoolExpr::And(out),
        }
    }

    /// Disjunction, flattening nested disjunctions and folding constants
    pub fn any(parts: impl IntoIterator<Item = BoolExpr>) -> Self {
        let mut out = Vec::new();
        for part in parts {
            match part {
                BoolExpr::Const(false) => {}
                BoolExpr::Const(true) => return BoolExpr::tt(),
                BoolExpr::Or(inner) => out.extend(inner),
                other => out.push(other),
            }
        }
        match out.len() {
            0 => BoolExpr::ff(),
            1 => out.remove(0),
            _ => BoolExpr::Or(out),
        }
    }

    pub fn and(self, other: BoolExpr) -> Self {
        BoolExpr::all([self, other])
    }

    pub fn or(self, other: BoolExpr) -> Self {
        BoolExpr::any([self, other])
    }

    pub fn negate(self) -> Self {
        match self {
            BoolExpr::Const(b) => BoolExpr::Const(!b),
            BoolExpr::Not(inner) => *inner,
            other => BoolExpr::Not(Box::new(other)),
        }
    }

    pub fn is_true(&self) -> bool {
        matches!(self, BoolExpr::Const(true))
    }

    pub fn is_false(&self) -> bool {
        matches!(self, BoolExpr::Const(false))
    }

    /// Evaluate under `env`; `None` for unbound variables and relation atoms
    pub fn eval(&self, env: &Valuation) -> Option<bool> {
        match self {
            BoolExpr::Const(b) => Some(*b),
            BoolExpr::Var(name) => env.boolean(name),
            BoolExpr::Not(e) => e.eval(env).map(|b| !b),
            BoolExpr::And(parts) => {
                let mut result = Some(true);
                for part in parts {
                    match part.eval(env) {
                        Some(false) => return Some(false),
                        Some(true) => {}
                        None => result = None,
                    }
                }
                result
            }
            BoolExpr::Or(parts) => {
                let mut result = Some(false);
                for part in parts {
                    match part.eval(env) {
                        Some(true) => return Some(true),
                        Some(false) => {}
                        None => result = None,
                    }
                }
                result
            }
            BoolExpr::Cmp(op, l, r) => Some(op.holds(l.eval(env)?, r.eval(env)?)),
            BoolExpr::App(_) => None,
        }
    }

    pub fn visit_vars(&self, f: &mut impl FnMut(&str, Sort)) {
        match self {
            BoolExpr::Const(_) => {}
            BoolExpr::Var(name) => f(name, Sort::Bool),
            BoolExpr::Not(e) => e.visit_vars(f),
            BoolExpr::And(parts) | BoolExpr::Or(parts) => {
                for part in parts {
                    part.visit_vars(f);
                }
            }
            BoolExpr::Cmp(_, l, r) => {
                l.visit_vars(f);
                r.visit_vars(f);
            }
            BoolExpr::App(app) => app.visit_vars(f),
        }
    }
}

impl From<RelationApp> for BoolExpr {
    fn from(app: RelationApp) -> Self {
        BoolExpr::App(app)
    }
}

impl fmt::Display for BoolExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BoolExpr::Const(true) => write!(f, "true"),
            BoolExpr::Const(false) => write!(f, "false"),
            BoolExpr::Var(name) => write!(f, "{}", name),
            BoolExpr::Not(e) => write!(f, "(not {})", e),
            BoolExpr::And(parts) => write_nary(f, "and", parts),
            BoolExpr::Or(parts) => write_nary(f, "or", parts),
            BoolExpr::Cmp(op, l, r) => write!(f, "({} {} {})", op.smt_name(), l, r),
            BoolExpr::App(app) => write!(f, "{}", app),
        }
    }
}

fn write_nary(f: &mut fmt::Formatter<'_>, op: &str, parts: &[BoolExpr]) -> fmt::Result {
    write!(f, "({}", op)?;
    for part in parts {
        write!(f, " {}", part)?;
    }
    write!(f, ")")
}

// ═══════════════════════════════════════════════════════════════════════════
// Terms
// ═══════════════════════════════════════════════════════════════════════════

/// A relation argument
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Term {
    Bv(BvExpr),
    Bool(BoolExpr),
    Int(IntExpr),
}

impl Term {
    pub fn sort(&self) -> Sort {
        match self {
            Term::Bv(e) => Sort::BitVec(e.width()),
            Term::Bool(_) => Sort::Bool,
            Term::Int(_) => Sort::Int,
        }
    }

    pub fn visit_vars(&self, f: &mut impl FnMut(&str, Sort)) {
        match self {
            Term::Bv(e) => e.visit_vars(f),
            Term::Bool(e) => e.visit_vars(f),
            Term::Int(IntExpr::Var(name)) => f(name, Sort::Int),
            Term::Int(IntExpr::Lit(_)) => {}
        }
    }

    pub fn as_bv(&self) -> Option<&BvExpr> {
        match self {
            Term::Bv(e) => Some(e),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<&BoolExpr> {
        match self {
            Term::Bool(e) => Some(e),
            _ => None,
        }
    }
}

impl From<BvExpr> for Term {
    fn from(e: BvExpr) -> Self {
        Term::Bv(e)
    }
}

impl From<BoolExpr> for Term {
    fn from(e: BoolExpr) -> Self {
        Term::Bool(e)
    }
}

impl From<IntExpr> for Term {
    fn from(e: IntExpr) -> Self {
        Term::Int(e)
    }
}

impl fmt::Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Term::Bv(e) => write!(f, "{}", e),
            Term::Bool(e) => write!(f, "{}", e),
            Term::Int(e) => write!(f, "{}", e),
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// Concrete assignments
// ═══════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Value {
    Bool(bool),
    Bv(u128),
    Int(i64),
}

/// Variable assignment used by `eval`
#[derive(Debug, Clone, Default)]
pub struct Valuation {
    values: FxHashMap<String, Value>,
}

impl Valuation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, name: impl Into<String>, value: Value) -> &mut Self {
        self.values.insert(name.into(), value);
        self
    }

    pub fn with(mut self, name: impl Into<String>, value: Value) -> Self {
        self.values.insert(name.into(), value);
        self
    }

    pub fn bv(&self, name: &str) -> Option<u128> {
        match self.values.get(name) {
            Some(Value::Bv(v)) => Some(*v),
            _ => None,
        }
    }

    pub fn boolean(&self, name: &str) -> Option<bool> {
        match self.values.get(name) {
            Some(Value::Bool(b)) => Some(*b),
            _ => None,
        }
    }

    pub fn int(&self, name: &str) -> Option<i64> {
        match self.values.get(name) {
            Some(Value::Int(v)) => Some(*v),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_smtlib_rendering() {
        let x = BvExpr::var("v0", 64);
        let sum = BvExpr::bin(BvOp::Add, x.clone(), BvExpr::lit(-1, 64));
        assert_eq!(sum.to_string(), "(bvadd v0 (_ bv18446744073709551615 64))");

        let guard = BoolExpr::all([BoolExpr::var("l1"), x.eq_to(&BvExpr::zero(64))]);
        assert_eq!(guard.to_string(), "(and l1 (= v0 (_ bv0 64)))");
        assert_eq!(IntExpr::Lit(-7).to_string(), "(- 7)");
    }

    #[test]
    fn test_constant_folding() {
        assert!(BoolExpr::all([BoolExpr::tt(), BoolExpr::tt()]).is_true());
        assert!(BoolExpr::all([BoolExpr::var("a"), BoolExpr::ff()]).is_false());
        assert!(BoolExpr::any([BoolExpr::ff(), BoolExpr::ff()]).is_false());
        assert_eq!(BoolExpr::any([BoolExpr::ff(), BoolExpr::var("a")]), BoolExpr::var("a"));
        assert_eq!(BoolExpr::var("a").negate().negate(), BoolExpr::var("a"));
    }

    #[test]
    fn test_eval_arithmetic() {
        let env = Valuation::new()
            .with("a", Value::Bv(7))
            .with("b", Value::Bv(0));
        let a = BvExpr::var("a", 8);
        let b = BvExpr::var("b", 8);

        assert_eq!(BvExpr::bin(BvOp::UDiv, a.clone(), b.clone()).eval(&env), Some(0xff));
        assert_eq!(BvExpr::bin(BvOp::URem, a.clone(), b).eval(&env), Some(7));
        assert_eq!(BvExpr::un(BvUnOp::Neg, a.clone()).eval(&env), Some(0xf9));
        assert_eq!(
            BvExpr::bin(BvOp::AShr, BvExpr::lit(-8, 8), BvExpr::lit(1, 8)).eval(&env),
            Some(0xfc)
        );
        assert_eq!(
            BvExpr::bin(BvOp::LShr, BvExpr::lit(-8, 8), BvExpr::lit(1, 8)).eval(&env),
            Some(0x7c)
        );
    }

    #[test]
    fn test_eval_unknowns() {
        let env = Valuation::new().with("h", Value::Bool(true));
        let app = BoolExpr::App(RelationApp::new("H", vec![]));
        assert_eq!(BoolExpr::any([app.clone(), BoolExpr::var("h")]).eval(&env), Some(true));
        assert_eq!(BoolExpr::all([app, BoolExpr::var("h")]).eval(&env), None);
    }

    #[test]
    fn test_visit_vars() {
        let app = RelationApp::new(
            "S",
            vec![
                Term::Int(IntExpr::Var("cls".into())),
                Term::Bv(BvExpr::var("f", 32)),
                Term::Bool(BoolExpr::var("lf")),
            ],
        );
        let mut seen = Vec::new();
        app.visit_vars(&mut |name, sort| seen.push((name.to_string(), sort)));
        assert_eq!(
            seen,
            vec![
                ("cls".to_string(), Sort::Int),
                ("f".to_string(), Sort::BitVec(32)),
                ("lf".to_string(), Sort::Bool),
            ]
        );
        assert_eq!(app.to_string(), "(S cls f lf)");
    }
}
