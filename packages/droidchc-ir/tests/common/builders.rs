//! Test data builders
//!
//! Builder patterns for program models: instructions, methods, classes and
//! whole programs. Method builders number instructions one code unit apart
//! so relative branch targets can be written by hand.

use droidchc_ir::features::dalvik::domain::RegisterRange;
use droidchc_ir::{Class, Field, Instruction, Method, Payload, Program};

/// Instruction with register operands, pc assigned by the method builder
pub fn ins(opcode: &str, registers: &[u32]) -> Instruction {
    let mut instr = Instruction::new(0, opcode);
    instr.registers = registers.to_vec();
    instr
}

/// Operand setters for `Instruction`
pub trait InstructionExt {
    fn lit(self, value: i64) -> Self;
    fn refer(self, reference: &str) -> Self;
    fn target(self, offset: i32) -> Self;
    fn payload(self, payload: Payload) -> Self;
    fn range(self, start: u32, count: u32) -> Self;
}

impl InstructionExt for Instruction {
    fn lit(mut self, value: i64) -> Self {
        self.literal = Some(value);
        self
    }

    fn refer(mut self, reference: &str) -> Self {
        self.reference = Some(reference.to_string());
        self
    }

    fn target(mut self, offset: i32) -> Self {
        self.target = Some(offset);
        self
    }

    fn payload(mut self, payload: Payload) -> Self {
        self.payload = Some(payload);
        self
    }

    fn range(mut self, start: u32, count: u32) -> Self {
        self.register_range = Some(RegisterRange { start, count });
        self
    }
}

/// Builder for Method
#[derive(Debug)]
pub struct MethodBuilder {
    method: Method,
}

impl MethodBuilder {
    /// Create a new builder for an instance method
    pub fn new(name: &str, num_registers: u32, num_arguments: u32) -> Self {
        Self {
            method: Method {
                name: name.to_string(),
                num_registers,
                num_arguments,
                is_static: false,
                entry_point: false,
                instructions: Vec::new(),
            },
        }
    }

    pub fn static_method(mut self) -> Self {
        self.method.is_static = true;
        self
    }

    pub fn entry_point(mut self) -> Self {
        self.method.entry_point = true;
        self
    }

    /// Append an instruction at the next pc
    pub fn with(mut self, mut instr: Instruction) -> Self {
        instr.pc = self.method.instructions.len() as u32;
        self.method.instructions.push(instr);
        self
    }

    pub fn build(self) -> Method {
        self.method
    }
}

/// Builder for Class
#[derive(Debug)]
pub struct ClassBuilder {
    class: Class,
}

impl ClassBuilder {
    pub fn new(name: &str) -> Self {
        Self {
            class: Class {
                name: name.to_string(),
                super_class: None,
                interfaces: Vec::new(),
                fields: Vec::new(),
                methods: Vec::new(),
                launcher: true,
            },
        }
    }

    /// Entry points start only when an intent launches the class
    pub fn launched_by_intent(mut self) -> Self {
        self.class.launcher = false;
        self
    }

    pub fn extends(mut self, super_class: &str) -> Self {
        self.class.super_class = Some(super_class.to_string());
        self
    }

    pub fn implements(mut self, interface: &str) -> Self {
        self.class.interfaces.push(interface.to_string());
        self
    }

    pub fn field(mut self, name: &str, field_type: &str) -> Self {
        self.class.fields.push(Field {
            name: name.to_string(),
            field_type: field_type.to_string(),
            is_static: false,
            initial_value: None,
        });
        self
    }

    pub fn static_field(mut self, name: &str, field_type: &str, initial_value: Option<i64>) -> Self {
        self.class.fields.push(Field {
            name: name.to_string(),
            field_type: field_type.to_string(),
            is_static: true,
            initial_value,
        });
        self
    }

    pub fn method(mut self, method: Method) -> Self {
        self.class.methods.push(method);
        self
    }

    pub fn build(self) -> Class {
        self.class
    }
}

/// Builder for Program
#[derive(Debug, Default)]
pub struct ProgramBuilder {
    classes: Vec<Class>,
}

impl ProgramBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn class(mut self, class: Class) -> Self {
        self.classes.push(class);
        self
    }

    pub fn build(self) -> Program {
        Program {
            classes: self.classes,
        }
    }
}
