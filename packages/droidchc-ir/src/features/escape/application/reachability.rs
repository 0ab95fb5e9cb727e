//! Local-heap reachability relations
//!
//! `ReachLH(a, b, lh*)`: object `b` is reachable from `a` through local
//! references stored in `lh`. `CFilter(v, b, lh*, filter*)`: `v` reaches the
//! object of the site selected by the one-hot `filter`, whose epoch is
//! occupied iff `b`. Both are emitted as auxiliary relations only.

use crate::features::chc::domain::Clause;
use crate::features::heap_model::domain::LocalHeapLayout;
use crate::features::symbolic_state::application::heap_terms;
use crate::features::symbolic_state::domain::{canonical_heap, vars};
use crate::shared::constants::{FILTER_RELATION, REACH_RELATION};
use crate::shared::models::{BoolExpr, BvExpr, RelationApp, Term};

pub struct ReachabilityRules<'a> {
    layout: &'a LocalHeapLayout,
    width: u32,
}

impl<'a> ReachabilityRules<'a> {
    pub fn new(layout: &'a LocalHeapLayout, width: u32) -> Self {
        Self { layout, width }
    }

    fn reach(&self, from: BvExpr, to: BvExpr, heap: &[Term]) -> RelationApp {
        let mut args = vec![Term::Bv(from), Term::Bv(to)];
        args.extend_from_slice(heap);
        RelationApp::new(REACH_RELATION, args)
    }

    pub fn clauses(&self) -> Vec<Clause> {
        let heap = canonical_heap(vars::HEAP, self.layout.size(), self.width);
        let heap_args = heap_terms(&heap);
        let from = BvExpr::var(vars::VAL, self.width);
        let mut clauses = vec![Clause::fact(self.reach(from.clone(), from.clone(), &heap_args))];
        let instances: Vec<BvExpr> = self
            .layout
            .sites()
            .iter()
            .map(|site| BvExpr::lit(i64::from(site.instance), self.width))
            .collect();

        for (site, id) in self.layout.sites().iter().zip(&instances) {
            for k in site.offset..site.header_slot() {
                let slot = &heap[k];
                // only slots holding a local instance are followed
                let body = vec![
                    self.reach(from.clone(), id.clone(), &heap_args).into(),
                    slot.cell.local.clone(),
                    BoolExpr::any(instances.iter().map(|target| slot.cell.value.eq_to(target))),
                ];
                clauses.push(Clause::rule(
                    body,
                    self.reach(from.clone(), slot.cell.value.clone(), &heap_args),
                ));
            }
        }

        let sites = self.layout.sites();
        for (j, site) in sites.iter().enumerate() {
            let id = BvExpr::lit(i64::from(site.instance), self.width);
            let occupied = heap[site.header_slot()].free.clone().negate();

            let mut args = vec![Term::Bv(from.clone()), Term::Bool(occupied)];
            args.extend_from_slice(&heap_args);
            args.extend((0..sites.len()).map(|i| Term::Bool(BoolExpr::Const(i == j))));

            clauses.push(Clause::rule(
                vec![self.reach(from.clone(), id, &heap_args).into()],
                RelationApp::new(FILTER_RELATION, args),
            ));
        }

        clauses
    }
}
