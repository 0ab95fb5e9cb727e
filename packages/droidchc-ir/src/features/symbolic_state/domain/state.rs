//! Whole-frame symbolic state

use super::register_state::{HeapSlot, RegisterState};
use super::vars;
use crate::errors::{DroidChcError, Result};
use crate::shared::models::{BoolExpr, FrameShape};

/// Registers (including return slot and argument copies) and the local heap
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SymbolicState {
    pub registers: Vec<RegisterState>,
    pub heap: Vec<HeapSlot>,
}

impl SymbolicState {
    /// Pre-state of any instruction of a method with `shape`
    pub fn canonical(shape: FrameShape, local_heap_size: usize, width: u32) -> Self {
        Self {
            registers: (0..shape.slot_count())
                .map(|i| RegisterState::canonical(i, width))
                .collect(),
            heap: canonical_heap(vars::HEAP, local_heap_size, width),
        }
    }

    pub fn register(&self, r: u32) -> Result<&RegisterState> {
        self.registers.get(r as usize).ok_or_else(|| {
            DroidChcError::model(format!(
                "register v{} out of range ({} slots)",
                r,
                self.registers.len()
            ))
        })
    }

    pub fn slot(&self, k: usize) -> Result<&HeapSlot> {
        self.heap.get(k).ok_or_else(|| {
            DroidChcError::compile(format!(
                "local heap slot {} out of range ({} slots)",
                k,
                self.heap.len()
            ))
        })
    }

    pub fn builder(&self) -> StateBuilder {
        StateBuilder {
            state: self.clone(),
        }
    }
}

/// Local heap over canonical variables with `prefix`
pub fn canonical_heap(prefix: &str, size: usize, width: u32) -> Vec<HeapSlot> {
    (0..size)
        .map(|k| HeapSlot::canonical(prefix, k, width))
        .collect()
}

/// Post-state under construction for one clause
#[derive(Debug, Clone)]
pub struct StateBuilder {
    state: SymbolicState,
}

impl StateBuilder {
    /// All-zero frame (used for callee entry states)
    pub fn zeroed(shape: FrameShape, heap: Vec<HeapSlot>, width: u32) -> Self {
        Self {
            state: SymbolicState {
                registers: (0..shape.slot_count())
                    .map(|_| RegisterState::zero(width))
                    .collect(),
                heap,
            },
        }
    }

    pub fn register(&self, r: u32) -> Result<&RegisterState> {
        self.state.register(r)
    }

    pub fn set(&mut self, r: u32, value: RegisterState) -> Result<&mut Self> {
        let len = self.state.registers.len();
        let slot = self
            .state
            .registers
            .get_mut(r as usize)
            .ok_or_else(|| DroidChcError::model(format!("register v{} out of range ({} slots)", r, len)))?;
        *slot = value;
        Ok(self)
    }

    /// `high(r) |= taint`
    pub fn taint(&mut self, r: u32, taint: BoolExpr) -> Result<&mut Self> {
        let current = self.state.register(r)?.clone();
        let high = current.high.clone().or(taint);
        self.set(r, current.with_high(high))
    }

    /// Apply `f` to registers `0..count`
    pub fn map_registers(&mut self, count: usize, mut f: impl FnMut(usize, &RegisterState) -> RegisterState) -> &mut Self {
        for (i, reg) in self.state.registers.iter_mut().enumerate().take(count) {
            *reg = f(i, reg);
        }
        self
    }

    pub fn set_slot(&mut self, k: usize, slot: HeapSlot) -> Result<&mut Self> {
        let len = self.state.heap.len();
        let target = self.state.heap.get_mut(k).ok_or_else(|| {
            DroidChcError::compile(format!("local heap slot {} out of range ({} slots)", k, len))
        })?;
        *target = slot;
        Ok(self)
    }

    pub fn set_heap(&mut self, heap: Vec<HeapSlot>) -> &mut Self {
        self.state.heap = heap;
        self
    }

    pub fn heap(&self) -> &[HeapSlot] {
        &self.state.heap
    }

    pub fn register_count(&self) -> usize {
        self.state.registers.len()
    }

    pub fn finish(self) -> SymbolicState {
        self.state
    }

    pub fn state(&self) -> &SymbolicState {
        &self.state
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::models::BvExpr;

    #[test]
    fn test_canonical_shape() {
        let state = SymbolicState::canonical(FrameShape::new(3, 1), 2, 32);
        assert_eq!(state.registers.len(), 5);
        assert_eq!(state.heap.len(), 2);
        assert!(state.register(5).is_err());
        assert!(state.slot(2).is_err());
    }

    #[test]
    fn test_builder_updates() {
        let state = SymbolicState::canonical(FrameShape::new(2, 0), 0, 8);
        let mut next = state.builder();
        next.set(0, RegisterState::zero(8)).unwrap();
        next.taint(1, BoolExpr::var("h0")).unwrap();
        assert!(next.set(7, RegisterState::zero(8)).is_err());

        let out = next.finish();
        assert_eq!(out.registers[0].value, BvExpr::zero(8));
        assert_eq!(out.registers[1].high.to_string(), "(or h1 h0)");
        // the pre-state is untouched
        assert_eq!(state.registers[0].value.to_string(), "v0");
    }
}
