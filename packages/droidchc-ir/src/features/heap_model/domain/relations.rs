//! Global heap relations
//!
//! - `H(class, instance, field, value, high, blocked)` object heap
//! - `HI(intent, key, value, high, blocked)` intent extras
//! - `I(component, caller, value, high, blocked)` launched intents
//! - `S(class, field, value, high, blocked)` static fields, keyed by `Int`

use crate::features::chc::domain::Clause;
use crate::features::dalvik::domain::field_id;
use crate::features::symbolic_state::domain::vars;
use crate::shared::constants::{
    HEAP_RELATION, INTENT_HEAP_RELATION, LAUNCHED_INTENT_RELATION, PARENT_FIELD, RESULT_FIELD,
    STATIC_HEAP_RELATION,
};
use crate::shared::models::{java_hash, BoolExpr, BvExpr, IntExpr, RelationApp, Term};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeapRelations {
    width: u32,
}

impl HeapRelations {
    pub fn new(width: u32) -> Self {
        Self { width }
    }

    /// Bit-vector literal of an id
    pub fn id(&self, id: i32) -> BvExpr {
        BvExpr::lit(i64::from(id), self.width)
    }

    /// Id of a synthetic field named by its bare name
    pub fn named_field(&self, name: &str) -> BvExpr {
        self.id(java_hash(name))
    }

    /// Id of a declared field `name:type`
    pub fn field(&self, name: &str, field_type: &str) -> BvExpr {
        self.id(field_id(name, field_type))
    }

    pub fn var(&self, name: &str) -> BvExpr {
        BvExpr::var(name, self.width)
    }

    pub fn h(
        &self,
        class: BvExpr,
        instance: BvExpr,
        field: BvExpr,
        value: BvExpr,
        high: BoolExpr,
        blocked: BoolExpr,
    ) -> RelationApp {
        RelationApp::new(
            HEAP_RELATION,
            vec![
                Term::Bv(class),
                Term::Bv(instance),
                Term::Bv(field),
                Term::Bv(value),
                Term::Bool(high),
                Term::Bool(blocked),
            ],
        )
    }

    pub fn hi(
        &self,
        intent: BvExpr,
        key: BvExpr,
        value: BvExpr,
        high: BoolExpr,
        blocked: BoolExpr,
    ) -> RelationApp {
        RelationApp::new(
            INTENT_HEAP_RELATION,
            vec![
                Term::Bv(intent),
                Term::Bv(key),
                Term::Bv(value),
                Term::Bool(high),
                Term::Bool(blocked),
            ],
        )
    }

    /// `component` is the launched class, `caller` the launching one
    pub fn i(
        &self,
        component: BvExpr,
        caller: BvExpr,
        value: BvExpr,
        high: BoolExpr,
        blocked: BoolExpr,
    ) -> RelationApp {
        RelationApp::new(
            LAUNCHED_INTENT_RELATION,
            vec![
                Term::Bv(component),
                Term::Bv(caller),
                Term::Bv(value),
                Term::Bool(high),
                Term::Bool(blocked),
            ],
        )
    }

    pub fn s(
        &self,
        class: IntExpr,
        field: IntExpr,
        value: BvExpr,
        high: BoolExpr,
        blocked: BoolExpr,
    ) -> RelationApp {
        RelationApp::new(
            STATIC_HEAP_RELATION,
            vec![
                Term::Int(class),
                Term::Int(field),
                Term::Bv(value),
                Term::Bool(high),
                Term::Bool(blocked),
            ],
        )
    }

    /// A launched activity's result flows back to its parent:
    /// `H(cn,cn,parent,f,_,_) ∧ H(cn,cn,result,val,lv,bv) ∧ H(f,f,_,_,_,_) ⇒ H(f,f,result,val,lv,bv)`
    pub fn activity_result_rule(&self) -> Clause {
        let cn = self.var(vars::CN);
        let f = self.var(vars::F);
        let val = self.var(vars::VAL);
        let parent = self.named_field(PARENT_FIELD);
        let result = self.named_field(RESULT_FIELD);

        let body = vec![
            self.h(
                cn.clone(),
                cn.clone(),
                parent,
                f.clone(),
                BoolExpr::var(vars::LF),
                BoolExpr::var(vars::BF),
            )
            .into(),
            self.h(
                cn.clone(),
                cn,
                result.clone(),
                val.clone(),
                BoolExpr::var(vars::LVAL),
                BoolExpr::var(vars::BVAL),
            )
            .into(),
            self.h(
                f.clone(),
                f.clone(),
                self.var(vars::FPP),
                self.var(vars::VFP),
                BoolExpr::var(vars::LFP),
                BoolExpr::var(vars::BFP),
            )
            .into(),
        ];
        let head = self.h(
            f.clone(),
            f,
            result,
            val,
            BoolExpr::var(vars::LVAL),
            BoolExpr::var(vars::BVAL),
        );
        Clause::rule(body, head)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::models::Sort;

    #[test]
    fn test_fixed_arities() {
        let rel = HeapRelations::new(32);
        let zero = || BvExpr::zero(32);
        let h = rel.h(zero(), zero(), zero(), zero(), BoolExpr::ff(), BoolExpr::ff());
        assert_eq!(h.arity(), 6);
        assert_eq!(rel.hi(zero(), zero(), zero(), BoolExpr::ff(), BoolExpr::ff()).arity(), 5);
        assert_eq!(rel.i(zero(), zero(), zero(), BoolExpr::ff(), BoolExpr::ff()).arity(), 5);

        let s = rel.s(IntExpr::Lit(1), IntExpr::Lit(2), zero(), BoolExpr::ff(), BoolExpr::ff());
        assert_eq!(&s.signature()[..2], &[Sort::Int, Sort::Int]);
    }

    #[test]
    fn test_activity_result_rule_shape() {
        let rule = HeapRelations::new(64).activity_result_rule();
        assert_eq!(rule.body.len(), 3);
        assert_eq!(rule.head.name, "H");
        assert_eq!(rule.head.args[0].to_string(), "f");
        assert_eq!(
            rule.head.args[2],
            Term::Bv(BvExpr::lit(i64::from(java_hash("result")), 64))
        );
    }
}
