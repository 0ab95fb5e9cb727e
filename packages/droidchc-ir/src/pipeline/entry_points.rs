//! Program-wide facts
//!
//! Initial states of entry points, static field initial values, and the
//! optional auxiliary rules that do not belong to any single instruction.

use crate::config::AnalysisConfig;
use crate::errors::{DroidChcError, Result};
use crate::features::call_linkage::ports::DispatchOracle;
use crate::features::chc::domain::Clause;
use crate::features::dalvik::domain::{Class, Method, Program};
use crate::features::escape::application::ReachabilityRules;
use crate::features::heap_model::domain::{HeapRelations, LocalHeapLayout};
use crate::features::symbolic_state::application::PredicateBuilder;
use crate::features::symbolic_state::domain::{vars, HeapSlot, RegisterState, StateBuilder};
use crate::shared::models::{BoolExpr, BvExpr, IntExpr, ProgramPoint, RelationApp};
use tracing::debug;

pub struct GlobalFacts<'a> {
    config: &'a AnalysisConfig,
    oracle: &'a dyn DispatchOracle,
    layout: &'a LocalHeapLayout,
    predicates: PredicateBuilder,
    heap: HeapRelations,
}

impl<'a> GlobalFacts<'a> {
    pub fn new(
        config: &'a AnalysisConfig,
        oracle: &'a dyn DispatchOracle,
        layout: &'a LocalHeapLayout,
    ) -> Self {
        let width = config.bitvector_size;
        Self {
            config,
            oracle,
            layout,
            predicates: PredicateBuilder::new(width, layout.size()),
            heap: HeapRelations::new(width),
        }
    }

    /// Every program-wide clause, in a fixed order
    pub fn clauses(&self, program: &Program) -> Result<Vec<Clause>> {
        let mut clauses = Vec::new();
        if self.config.intent_summaries {
            clauses.push(self.heap.activity_result_rule());
        }
        clauses.extend(self.static_initial_values(program));
        if self.config.reach_filter {
            clauses.extend(ReachabilityRules::new(self.layout, self.config.bitvector_size).clauses());
        }
        clauses.extend(self.entry_facts(program)?);
        debug!(clauses = clauses.len(), "global facts");
        Ok(clauses)
    }

    /// `S(class, field, initial, false, false)` for initialized static fields
    pub fn static_initial_values(&self, program: &Program) -> Vec<Clause> {
        let width = self.config.bitvector_size;
        program
            .classes
            .iter()
            .flat_map(|class| {
                let class_id = class.id();
                class.static_fields().filter_map(move |field| {
                    let initial = field.initial_value?;
                    Some(Clause::fact(self.heap.s(
                        IntExpr::Lit(i64::from(class_id)),
                        IntExpr::Lit(i64::from(field.id())),
                        BvExpr::lit(initial, width),
                        BoolExpr::ff(),
                        BoolExpr::ff(),
                    )))
                })
            })
            .collect()
    }

    /// Initial states of every entry-point method: a fact for launcher
    /// classes, `I(class, …) ⇒ R(entry)` for classes started by an intent
    pub fn entry_facts(&self, program: &Program) -> Result<Vec<Clause>> {
        program
            .classes
            .iter()
            .flat_map(|class| {
                class
                    .methods
                    .iter()
                    .filter(|m| m.entry_point && m.shape().is_well_formed())
                    .map(move |method| self.entry_fact(class, method))
            })
            .collect()
    }

    pub fn entry_fact(&self, class: &Class, method: &Method) -> Result<Clause> {
        let head = self.entry_state(class, method)?;
        if class.launcher || !self.config.intent_summaries {
            return Ok(Clause::fact(head));
        }
        let width = self.config.bitvector_size;
        let launched = self.heap.i(
            self.heap.id(class.id()),
            BvExpr::var(vars::VFP, width),
            BvExpr::var(vars::VAL, width),
            BoolExpr::var(vars::LF),
            BoolExpr::var(vars::BF),
        );
        Ok(Clause::rule(vec![launched.into()], head))
    }

    /// Parameters are unconstrained global values, `this` is the class's
    /// entry instance, everything else is zero and the local heap is empty
    fn entry_state(&self, class: &Class, method: &Method) -> Result<RelationApp> {
        let width = self.config.bitvector_size;
        let shape = method.shape();
        let heap = vec![HeapSlot::empty(width); self.layout.size()];
        let mut state = StateBuilder::zeroed(shape, heap, width);

        for i in 0..shape.num_arguments {
            let r = shape.parameter_register(i).ok_or_else(|| {
                DroidChcError::model(format!("{}->{}: more arguments than registers", class.name, method.name))
            })?;
            let parameter = if i == 0 && !method.is_static {
                let this = self.oracle.allocation_id(class.id(), 0, 0);
                RegisterState::global_ref(BvExpr::lit(i64::from(this), width), BoolExpr::ff())
            } else {
                RegisterState::new(
                    BvExpr::var(vars::value(r), width),
                    BoolExpr::ff(),
                    BoolExpr::ff(),
                    BoolExpr::var(vars::global(r)),
                )
            };
            state.set(r, parameter.clone())?;
            state.set(shape.argument_copy(i), parameter)?;
        }

        let point = ProgramPoint::new(class.id(), method.id(), 0);
        Ok(self.predicates.point(point, state.state()))
    }
}
