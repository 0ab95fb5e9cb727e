//! Register frame shape of a method
//!
//! Slots `0..num_registers` are the method registers (the last `num_arguments`
//! of them hold the incoming parameters), `num_registers` is the return slot,
//! and `num_registers + 1 ..= num_registers + num_arguments` are the argument
//! copies carried to the exit relation.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FrameShape {
    pub num_registers: u32,
    pub num_arguments: u32,
}

impl FrameShape {
    pub fn new(num_registers: u32, num_arguments: u32) -> Self {
        Self {
            num_registers,
            num_arguments,
        }
    }

    /// Registers, return slot and argument copies
    pub fn slot_count(&self) -> u32 {
        self.num_registers + self.num_arguments + 1
    }

    pub fn return_slot(&self) -> u32 {
        self.num_registers
    }

    /// Register holding parameter `i` on entry, `None` for an ill-formed shape
    pub fn parameter_register(&self, i: u32) -> Option<u32> {
        self.num_registers.checked_sub(self.num_arguments).map(|base| base + i)
    }

    /// Slot preserving parameter `i` for the exit relation
    pub fn argument_copy(&self, i: u32) -> u32 {
        self.num_registers + 1 + i
    }

    /// Parameters must fit in the register file
    pub fn is_well_formed(&self) -> bool {
        self.num_arguments <= self.num_registers
    }

    /// Point relation arity
    pub fn point_arity(&self, local_heap_size: usize) -> usize {
        4 * self.slot_count() as usize + 5 * local_heap_size
    }

    /// Exit relation arity
    pub fn exit_arity(&self, local_heap_size: usize) -> usize {
        4 * (self.num_arguments as usize + 1) + 5 * local_heap_size
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slot_layout() {
        let shape = FrameShape::new(5, 2);
        assert_eq!(shape.slot_count(), 8);
        assert_eq!(shape.return_slot(), 5);
        assert_eq!(shape.parameter_register(0), Some(3));
        assert_eq!(shape.parameter_register(1), Some(4));
        assert_eq!(shape.argument_copy(0), 6);
        assert_eq!(shape.argument_copy(1), 7);
    }

    #[test]
    fn test_arities() {
        let shape = FrameShape::new(3, 1);
        assert_eq!(shape.point_arity(0), 4 * 5);
        assert_eq!(shape.point_arity(2), 4 * 5 + 10);
        assert_eq!(shape.exit_arity(2), 8 + 10);
    }

    #[test]
    fn test_well_formed() {
        assert!(FrameShape::new(2, 2).is_well_formed());
        assert!(!FrameShape::new(1, 2).is_well_formed());
        assert_eq!(FrameShape::new(1, 2).parameter_register(0), None);
    }
}
