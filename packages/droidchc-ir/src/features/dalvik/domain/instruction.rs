//! Instructions of the JSON program model

use super::opcode::Opcode;
use crate::errors::{DroidChcError, Result};
use serde::{Deserialize, Serialize};

/// `{vStart .. vStart+count-1}` of a `/range` instruction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegisterRange {
    pub start: u32,
    pub count: u32,
}

/// Switch and array-data tables
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Payload {
    /// Keys `first_key, first_key+1, …` jump to `targets` (relative to the switch)
    PackedSwitch { first_key: i32, targets: Vec<i32> },
    /// `(key, relative target)` pairs
    SparseSwitch { entries: Vec<(i32, i32)> },
    ArrayData { elements: Vec<i64> },
}

impl Payload {
    /// `(key, relative target)` of a switch payload
    pub fn switch_entries(&self) -> Result<Vec<(i32, i32)>> {
        match self {
            Payload::PackedSwitch { first_key, targets } => Ok(targets
                .iter()
                .enumerate()
                .map(|(i, t)| (first_key.wrapping_add(i as i32), *t))
                .collect()),
            Payload::SparseSwitch { entries } => Ok(entries.clone()),
            Payload::ArrayData { .. } => Err(DroidChcError::payload(
                "array data payload used as a switch table",
            )),
        }
    }

    pub fn array_elements(&self) -> Result<&[i64]> {
        match self {
            Payload::ArrayData { elements } => Ok(elements),
            _ => Err(DroidChcError::payload("switch payload used as array data")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Instruction {
    /// Offset in code units
    pub pc: u32,

    /// Mnemonic, e.g. `iget-object`
    pub opcode: String,

    #[serde(default)]
    pub registers: Vec<u32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub register_range: Option<RegisterRange>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub literal: Option<i64>,

    /// Type, field, method or string operand
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,

    /// Branch or payload offset relative to `pc`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<i32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<Payload>,
}

impl Instruction {
    pub fn new(pc: u32, opcode: impl Into<String>) -> Self {
        Self {
            pc,
            opcode: opcode.into(),
            registers: Vec::new(),
            register_range: None,
            literal: None,
            reference: None,
            target: None,
            payload: None,
        }
    }

    pub fn op(&self) -> Opcode {
        Opcode::parse(&self.opcode)
    }

    /// Register operand `i`
    pub fn reg(&self, i: usize) -> Result<u32> {
        self.registers.get(i).copied().ok_or_else(|| {
            DroidChcError::model(format!(
                "{} @pc {} has no register operand {}",
                self.opcode, self.pc, i
            ))
        })
    }

    /// Argument registers of an invoke or filled-new-array
    pub fn argument_registers(&self) -> Vec<u32> {
        match self.register_range {
            Some(RegisterRange { start, count }) => (start..start + count).collect(),
            None => self.registers.clone(),
        }
    }

    pub fn literal(&self) -> Result<i64> {
        self.literal.ok_or_else(|| {
            DroidChcError::model(format!("{} @pc {} has no literal", self.opcode, self.pc))
        })
    }

    pub fn reference(&self) -> Result<&str> {
        self.reference.as_deref().ok_or_else(|| {
            DroidChcError::model(format!("{} @pc {} has no reference", self.opcode, self.pc))
        })
    }

    /// Absolute pc of the branch/payload target
    pub fn branch_target(&self) -> Result<u32> {
        let offset = self.target.ok_or_else(|| {
            DroidChcError::model(format!("{} @pc {} has no target", self.opcode, self.pc))
        })?;
        relative_pc(self.pc, offset)
    }
}

/// `pc + offset`, rejecting targets before the method start
pub fn relative_pc(pc: u32, offset: i32) -> Result<u32> {
    let target = i64::from(pc) + i64::from(offset);
    u32::try_from(target)
        .map_err(|_| DroidChcError::model(format!("branch from pc {} by {} leaves the method", pc, offset)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_range_arguments() {
        let mut instr = Instruction::new(0, "invoke-static/range");
        instr.register_range = Some(RegisterRange { start: 4, count: 3 });
        assert_eq!(instr.argument_registers(), vec![4, 5, 6]);
    }

    #[test]
    fn test_branch_target() {
        let mut instr = Instruction::new(10, "goto");
        instr.target = Some(-4);
        assert_eq!(instr.branch_target().unwrap(), 6);
        instr.target = Some(-11);
        assert!(instr.branch_target().is_err());
    }

    #[test]
    fn test_packed_switch_entries() {
        let payload = Payload::PackedSwitch {
            first_key: 3,
            targets: vec![6, 8],
        };
        assert_eq!(payload.switch_entries().unwrap(), vec![(3, 6), (4, 8)]);
        assert!(payload.array_elements().is_err());
    }

    #[test]
    fn test_json_shape() {
        let instr: Instruction = serde_json::from_str(
            r#"{"pc": 2, "opcode": "iput", "registers": [0, 1], "reference": "LFoo;->x:I"}"#,
        )
        .unwrap();
        assert_eq!(instr.reg(1).unwrap(), 1);
        assert!(instr.reg(2).is_err());
        assert_eq!(instr.reference().unwrap(), "LFoo;->x:I");

        let payload: Payload =
            serde_json::from_str(r#"{"kind": "sparse_switch", "entries": [[1, 4], [9, 6]]}"#).unwrap();
        assert_eq!(payload.switch_entries().unwrap(), vec![(1, 4), (9, 6)]);
    }
}
