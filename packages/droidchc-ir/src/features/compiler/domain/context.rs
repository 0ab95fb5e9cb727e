//! Compilation contexts
//!
//! `CompileEnv` is shared by all method workers, `MethodContext` is built once
//! per method, and `InstrCx` collects the clauses of a single instruction.
//! Every instruction reads the canonical pre-state of its method, so a clause
//! is always `R(P)[canonical] ∧ guards ⇒ head`.

use crate::config::AnalysisConfig;
use crate::errors::{DroidChcError, Result};
use crate::features::call_linkage::ports::DispatchOracle;
use crate::features::chc::domain::{Clause, Query};
use crate::features::compiler::domain::Emission;
use crate::features::dalvik::domain::{Class, Instruction, Method};
use crate::features::escape::application::LiftingEngine;
use crate::features::heap_model::domain::{HeapRelations, LocalHeapLayout};
use crate::features::symbolic_state::application::PredicateBuilder;
use crate::features::symbolic_state::domain::{RegisterState, StateBuilder, SymbolicState};
use crate::shared::models::{
    BoolExpr, BvExpr, ClassId, FrameShape, InstanceId, MethodId, ProgramPoint, RelationApp,
};

pub struct CompileEnv<'a> {
    pub config: &'a AnalysisConfig,
    pub oracle: &'a dyn DispatchOracle,
    pub layout: &'a LocalHeapLayout,
    pub predicates: PredicateBuilder,
    pub heap: HeapRelations,
}

impl<'a> CompileEnv<'a> {
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

    pub fn width(&self) -> u32 {
        self.predicates.width()
    }

    pub fn lifting(&self) -> LiftingEngine<'a> {
        LiftingEngine::new(self.layout, self.width())
    }
}

pub struct MethodContext<'a> {
    pub class: &'a Class,
    pub method: &'a Method,
    pub class_id: ClassId,
    pub method_id: MethodId,
    pub shape: FrameShape,
    /// Canonical pre-state shared by every instruction
    pub pre: SymbolicState,
}

impl<'a> MethodContext<'a> {
    pub fn new(env: &CompileEnv<'_>, class: &'a Class, method: &'a Method) -> Result<Self> {
        let shape = method.shape();
        if !shape.is_well_formed() {
            return Err(DroidChcError::model(format!(
                "{}->{} declares {} arguments in {} registers",
                class.name, method.name, shape.num_arguments, shape.num_registers
            )));
        }
        Ok(Self {
            class,
            method,
            class_id: class.id(),
            method_id: method.id(),
            shape,
            pre: SymbolicState::canonical(shape, env.layout.size(), env.width()),
        })
    }

    pub fn point(&self, pc: u32) -> ProgramPoint {
        ProgramPoint::new(self.class_id, self.method_id, pc)
    }
}

/// Clause emission for one instruction
pub struct InstrCx<'a> {
    pub env: &'a CompileEnv<'a>,
    pub method: &'a MethodContext<'a>,
    pub instr: &'a Instruction,
    pub point: ProgramPoint,
    pub next: ProgramPoint,
    current: RelationApp,
    out: Emission,
}

impl<'a> InstrCx<'a> {
    pub fn new(
        env: &'a CompileEnv<'a>,
        method: &'a MethodContext<'a>,
        instr: &'a Instruction,
        index: usize,
    ) -> Self {
        let point = method.point(instr.pc);
        let next = method.point(method.method.next_pc(index));
        let current = env.predicates.point(point, &method.pre);
        Self {
            env,
            method,
            instr,
            point,
            next,
            current,
            out: Emission::new(),
        }
    }

    pub fn width(&self) -> u32 {
        self.env.width()
    }

    pub fn shape(&self) -> FrameShape {
        self.method.shape
    }

    pub fn oracle(&self) -> &'a dyn DispatchOracle {
        self.env.oracle
    }

    pub fn heap(&self) -> HeapRelations {
        self.env.heap
    }

    pub fn layout(&self) -> &'a LocalHeapLayout {
        self.env.layout
    }

    pub fn pre(&self) -> &'a SymbolicState {
        &self.method.pre
    }

    /// Pre-state of register `r`
    pub fn reg(&self, r: u32) -> Result<&'a RegisterState> {
        self.method.pre.register(r)
    }

    /// Pre-state of the instruction's register operand `i`
    pub fn operand(&self, i: usize) -> Result<&'a RegisterState> {
        self.reg(self.instr.reg(i)?)
    }

    /// `R(P)` over the pre-state
    pub fn current(&self) -> BoolExpr {
        self.current.clone().into()
    }

    pub fn builder(&self) -> StateBuilder {
        self.method.pre.builder()
    }

    pub fn lit(&self, value: i64) -> BvExpr {
        BvExpr::lit(value, self.width())
    }

    pub fn var(&self, name: &str) -> BvExpr {
        BvExpr::var(name, self.width())
    }

    /// Identity of the allocation made by this instruction
    pub fn allocation_id(&self) -> InstanceId {
        self.env
            .oracle
            .allocation_id(self.method.class_id, self.method.method_id, self.instr.pc)
    }

    /// `R(P)` followed by `guards`
    pub fn body(&self, guards: Vec<BoolExpr>) -> Vec<BoolExpr> {
        let mut body = Vec::with_capacity(guards.len() + 1);
        body.push(self.current());
        body.extend(guards);
        body
    }

    /// `R(P) ∧ guards ⇒ R(next)[post]`
    pub fn step(&mut self, guards: Vec<BoolExpr>, post: &SymbolicState) {
        let head = self.env.predicates.point(self.next, post);
        let body = self.body(guards);
        self.out.push(Clause::rule(body, head));
    }

    /// `R(P) ∧ guards ⇒ R(pc)[post]`
    pub fn jump(&mut self, pc: u32, guards: Vec<BoolExpr>, post: &SymbolicState) {
        let head = self.env.predicates.point(self.point.at(pc), post);
        let body = self.body(guards);
        self.out.push(Clause::rule(body, head));
    }

    pub fn identity(&mut self) {
        let pre = self.pre();
        self.step(Vec::new(), pre);
    }

    /// `R(P) ∧ guards ⇒ head`
    pub fn derive(&mut self, guards: Vec<BoolExpr>, head: RelationApp) {
        let body = self.body(guards);
        self.out.push(Clause::rule(body, head));
    }

    pub fn emit(&mut self, clause: Clause) {
        self.out.push(clause);
    }

    pub fn query(&mut self, query: Query) {
        self.out.queries.push(query);
    }

    pub fn mark_sink_call(&mut self) {
        self.out.sink_call = true;
    }

    /// Lift under `R(P) ∧ guards`, then apply `update` to the lifted state
    pub fn lift(
        &mut self,
        guards: Vec<BoolExpr>,
        update: impl FnOnce(&mut StateBuilder) -> Result<()>,
    ) -> Result<()> {
        let engine = self.env.lifting();
        let body = self.body(guards.clone());
        for clause in engine.flush_all(&body, self.pre())? {
            self.emit(clause);
        }

        let mut builder = self.builder();
        engine.promote(&mut builder, self.shape().num_registers);
        update(&mut builder)?;
        let post = builder.finish();
        self.step(guards, &post);
        Ok(())
    }

    /// Lift when register `r` holds a local reference
    pub fn lift_if_local(
        &mut self,
        r: u32,
        mut guards: Vec<BoolExpr>,
        update: impl FnOnce(&mut StateBuilder) -> Result<()>,
    ) -> Result<()> {
        guards.push(self.reg(r)?.local.clone());
        self.lift(guards, update)
    }

    pub fn finish(self) -> Emission {
        self.out
    }
}
