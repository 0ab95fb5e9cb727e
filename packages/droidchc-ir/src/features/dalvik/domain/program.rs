//! JSON program model
//!
//! Stands in for a dex parser: classes with fields and methods, each method
//! with its register counts and instruction list.

use super::descriptor::{field_id, is_primitive};
use super::instruction::{Instruction, Payload};
use crate::errors::{DroidChcError, Result};
use crate::shared::constants::CLINIT_SIGNATURE;
use crate::shared::models::{java_hash, ClassId, FieldId, FrameShape, MethodId};
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Program {
    #[serde(default)]
    pub classes: Vec<Class>,
}

impl Program {
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json_str(&content)
    }

    pub fn class(&self, name: &str) -> Option<&Class> {
        self.classes.iter().find(|c| c.name == name)
    }

    pub fn method_count(&self) -> usize {
        self.classes.iter().map(|c| c.methods.len()).sum()
    }

    pub fn instruction_count(&self) -> usize {
        self.classes
            .iter()
            .flat_map(|c| c.methods.iter())
            .map(|m| m.instructions.len())
            .sum()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Class {
    /// Type descriptor, `Lcom/example/Foo;`
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub super_class: Option<String>,

    #[serde(default)]
    pub interfaces: Vec<String>,

    #[serde(default)]
    pub fields: Vec<Field>,

    #[serde(default)]
    pub methods: Vec<Method>,

    /// Entry points start unconditionally; otherwise only once an intent
    /// launches the class
    #[serde(default = "launcher_by_default")]
    pub launcher: bool,
}

fn launcher_by_default() -> bool {
    true
}

impl Class {
    pub fn id(&self) -> ClassId {
        java_hash(&self.name)
    }

    pub fn method(&self, signature: &str) -> Option<&Method> {
        self.methods.iter().find(|m| m.name == signature)
    }

    pub fn has_static_initializer(&self) -> bool {
        self.method(CLINIT_SIGNATURE).is_some()
    }

    pub fn instance_fields(&self) -> impl Iterator<Item = &Field> {
        self.fields.iter().filter(|f| !f.is_static)
    }

    pub fn static_fields(&self) -> impl Iterator<Item = &Field> {
        self.fields.iter().filter(|f| f.is_static)
    }

    /// Any method is an analysis entry point
    pub fn is_entry_class(&self) -> bool {
        self.methods.iter().any(|m| m.entry_point)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Field {
    pub name: String,

    #[serde(rename = "type")]
    pub field_type: String,

    #[serde(default)]
    pub is_static: bool,

    /// Static initial value from the class definition
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub initial_value: Option<i64>,
}

impl Field {
    pub fn id(&self) -> FieldId {
        field_id(&self.name, &self.field_type)
    }

    pub fn is_primitive(&self) -> bool {
        is_primitive(&self.field_type)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Method {
    /// Signature, `name(params)ret`
    pub name: String,

    pub num_registers: u32,

    /// Parameter registers, including `this`
    pub num_arguments: u32,

    #[serde(default)]
    pub is_static: bool,

    #[serde(default)]
    pub entry_point: bool,

    #[serde(default)]
    pub instructions: Vec<Instruction>,
}

impl Method {
    pub fn id(&self) -> MethodId {
        java_hash(&self.name)
    }

    pub fn shape(&self) -> FrameShape {
        FrameShape::new(self.num_registers, self.num_arguments)
    }

    /// Return type descriptor taken from the signature
    pub fn return_type(&self) -> &str {
        self.name
            .rfind(')')
            .map(|i| &self.name[i + 1..])
            .unwrap_or("V")
    }

    /// Successor pc of the instruction at `index`
    pub fn next_pc(&self, index: usize) -> u32 {
        match self.instructions.get(index + 1) {
            Some(next) => next.pc,
            None => self.instructions.get(index).map_or(0, |i| i.pc + 1),
        }
    }

    pub fn instruction_at(&self, pc: u32) -> Option<&Instruction> {
        self.instructions.iter().find(|i| i.pc == pc)
    }

    /// Payload of a switch or fill-array-data: inline, or the payload
    /// pseudo-instruction at the branch target
    pub fn payload_for<'a>(&'a self, instr: &'a Instruction) -> Result<&'a Payload> {
        if let Some(payload) = &instr.payload {
            return Ok(payload);
        }
        let target = instr.branch_target()?;
        self.instruction_at(target)
            .and_then(|p| p.payload.as_ref())
            .ok_or_else(|| {
                DroidChcError::payload(format!(
                    "{} @pc {} of {}: no payload at pc {}",
                    instr.opcode, instr.pc, self.name, target
                ))
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MODEL: &str = r#"{
        "classes": [{
            "name": "LFoo;",
            "super_class": "Ljava/lang/Object;",
            "fields": [
                {"name": "x", "type": "I"},
                {"name": "COUNT", "type": "I", "is_static": true, "initial_value": 3}
            ],
            "methods": [{
                "name": "run(I)V",
                "num_registers": 3,
                "num_arguments": 2,
                "entry_point": true,
                "instructions": [
                    {"pc": 0, "opcode": "packed-switch", "registers": [2], "target": 4},
                    {"pc": 3, "opcode": "return-void"},
                    {"pc": 4, "opcode": "packed-switch-payload",
                     "payload": {"kind": "packed_switch", "first_key": 0, "targets": [3]}}
                ]
            }]
        }]
    }"#;

    #[test]
    fn test_model_loading() {
        let program = Program::from_json_str(MODEL).unwrap();
        let class = program.class("LFoo;").unwrap();
        assert!(class.is_entry_class());
        assert!(!class.has_static_initializer());
        assert_eq!(class.instance_fields().count(), 1);
        assert_eq!(class.static_fields().next().unwrap().initial_value, Some(3));
        assert_eq!(program.instruction_count(), 3);
    }

    #[test]
    fn test_method_helpers() {
        let program = Program::from_json_str(MODEL).unwrap();
        let method = &program.classes[0].methods[0];
        assert_eq!(method.return_type(), "V");
        assert_eq!(method.next_pc(0), 3);
        assert_eq!(method.next_pc(2), 5);
        assert_eq!(method.shape().parameter_register(0), Some(1));

        let payload = method.payload_for(&method.instructions[0]).unwrap();
        assert_eq!(payload.switch_entries().unwrap(), vec![(0, 3)]);
        assert!(method.payload_for(&method.instructions[1]).is_err());
    }

    #[test]
    fn test_bad_json_is_an_error() {
        assert!(Program::from_json_str("{\"classes\": [{}]}").is_err());
    }
}
