//! Relation applications for program points and method exits
//!
//! Arguments are laid out in blocks: all register values, then all highs, all
//! locals, all globals, followed by the local heap as value / high / local /
//! global / free blocks. The same layout is used for point relations
//! (`R_<c>_<m>_<pc>`, every register slot) and exit relations
//! (`RES_<c>_<m>`, argument copies then the result).

use crate::features::chc::domain::exit_relation_name;
use crate::features::symbolic_state::domain::{HeapSlot, RegisterState, SymbolicState};
use crate::shared::models::{ClassId, MethodId, ProgramPoint, RelationApp, Term};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PredicateBuilder {
    width: u32,
    local_heap_size: usize,
}

impl PredicateBuilder {
    pub fn new(width: u32, local_heap_size: usize) -> Self {
        Self {
            width,
            local_heap_size,
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn local_heap_size(&self) -> usize {
        self.local_heap_size
    }

    /// `R_<c>_<m>_<pc>(state)`
    pub fn point(&self, point: ProgramPoint, state: &SymbolicState) -> RelationApp {
        RelationApp::new(
            point.relation_name(),
            layout(state.registers.iter(), &state.heap),
        )
    }

    /// `RES_<c>_<m>(arguments…, result, heap)`
    pub fn exit(
        &self,
        class: ClassId,
        method: MethodId,
        arguments: &[RegisterState],
        result: &RegisterState,
        heap: &[HeapSlot],
    ) -> RelationApp {
        RelationApp::new(
            exit_relation_name(class, method),
            layout(arguments.iter().chain(std::iter::once(result)), heap),
        )
    }
}

fn layout<'a>(
    registers: impl Iterator<Item = &'a RegisterState> + Clone,
    heap: &[HeapSlot],
) -> Vec<Term> {
    let mut args: Vec<Term> = Vec::new();
    args.extend(registers.clone().map(|r| Term::Bv(r.value.clone())));
    args.extend(registers.clone().map(|r| Term::Bool(r.high.clone())));
    args.extend(registers.clone().map(|r| Term::Bool(r.local.clone())));
    args.extend(registers.map(|r| Term::Bool(r.global.clone())));
    args.extend(heap_terms(heap));
    args
}

/// Local heap as value / high / local / global / free blocks
pub fn heap_terms(heap: &[HeapSlot]) -> Vec<Term> {
    let mut args = Vec::with_capacity(5 * heap.len());
    args.extend(heap.iter().map(|s| Term::Bv(s.cell.value.clone())));
    args.extend(heap.iter().map(|s| Term::Bool(s.cell.high.clone())));
    args.extend(heap.iter().map(|s| Term::Bool(s.cell.local.clone())));
    args.extend(heap.iter().map(|s| Term::Bool(s.cell.global.clone())));
    args.extend(heap.iter().map(|s| Term::Bool(s.free.clone())));
    args
}
