//! Register 4-tuples and local-heap slots

use super::vars;
use crate::shared::models::{BoolExpr, BvExpr, Term};

/// `(value, high, local, global)` of one register
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RegisterState {
    pub value: BvExpr,
    pub high: BoolExpr,
    pub local: BoolExpr,
    pub global: BoolExpr,
}

impl RegisterState {
    pub fn new(value: BvExpr, high: BoolExpr, local: BoolExpr, global: BoolExpr) -> Self {
        Self {
            value,
            high,
            local,
            global,
        }
    }

    /// `(0, false, false, false)`
    pub fn zero(width: u32) -> Self {
        Self::scalar(BvExpr::zero(width), BoolExpr::ff())
    }

    /// Non-reference value
    pub fn scalar(value: BvExpr, high: BoolExpr) -> Self {
        Self::new(value, high, BoolExpr::ff(), BoolExpr::ff())
    }

    /// Reference to a fresh object on the local heap
    pub fn local_ref(instance: BvExpr) -> Self {
        Self::new(instance, BoolExpr::ff(), BoolExpr::tt(), BoolExpr::ff())
    }

    /// Reference to an object on the global heap
    pub fn global_ref(instance: BvExpr, high: BoolExpr) -> Self {
        Self::new(instance, high, BoolExpr::ff(), BoolExpr::tt())
    }

    /// Register `i` over the canonical variables
    pub fn canonical(i: u32, width: u32) -> Self {
        Self::new(
            BvExpr::var(vars::value(i), width),
            BoolExpr::var(vars::high(i)),
            BoolExpr::var(vars::local(i)),
            BoolExpr::var(vars::global(i)),
        )
    }

    /// Flag stored as `blocked` when the value is written to a heap
    pub fn blocked(&self) -> BoolExpr {
        self.local.clone().or(self.global.clone())
    }

    pub fn with_high(mut self, high: BoolExpr) -> Self {
        self.high = high;
        self
    }

    pub fn terms(&self) -> [Term; 4] {
        [
            Term::Bv(self.value.clone()),
            Term::Bool(self.high.clone()),
            Term::Bool(self.local.clone()),
            Term::Bool(self.global.clone()),
        ]
    }
}

/// One local-heap slot: a register 4-tuple plus `free` ("never written")
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct HeapSlot {
    pub cell: RegisterState,
    pub free: BoolExpr,
}

impl HeapSlot {
    pub fn new(cell: RegisterState, free: BoolExpr) -> Self {
        Self { cell, free }
    }

    /// Zero slot, free at method entry and after a lift
    pub fn empty(width: u32) -> Self {
        Self::new(RegisterState::zero(width), BoolExpr::tt())
    }

    /// Zero slot owned by a fresh allocation
    pub fn allocated(width: u32) -> Self {
        Self::new(RegisterState::zero(width), BoolExpr::ff())
    }

    /// Slot `k` over the canonical variables with `prefix`
    pub fn canonical(prefix: &str, k: usize, width: u32) -> Self {
        Self::new(
            RegisterState::new(
                BvExpr::var(vars::heap_value(prefix, k), width),
                BoolExpr::var(vars::heap_high(prefix, k)),
                BoolExpr::var(vars::heap_local(prefix, k)),
                BoolExpr::var(vars::heap_global(prefix, k)),
            ),
            BoolExpr::var(vars::heap_free(prefix, k)),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_canonical_names() {
        let reg = RegisterState::canonical(3, 32);
        assert_eq!(reg.value.to_string(), "v3");
        assert_eq!(reg.high.to_string(), "h3");
        assert_eq!(reg.blocked().to_string(), "(or l3 g3)");

        let slot = HeapSlot::canonical(vars::CALLEE_HEAP, 1, 32);
        assert_eq!(slot.cell.value.to_string(), "lhcv1");
        assert_eq!(slot.free.to_string(), "lhcf1");
    }

    #[test]
    fn test_constructors() {
        let r = RegisterState::local_ref(BvExpr::lit(7, 8));
        assert!(r.local.is_true());
        assert!(r.global.is_false());
        assert!(HeapSlot::empty(8).free.is_true());
        assert!(HeapSlot::allocated(8).free.is_false());
    }
}
