//! Closed Dalvik opcode set, grouped into families
//!
//! Mnemonics are resolved through a table built once from the family
//! definitions below; anything not in the table (odex-only `*-quick`
//! instructions, `execute-inline`, `invoke-polymorphic`, …) is `Unsupported`.

use crate::shared::models::{BvCmp, BvOp};
use once_cell::sync::Lazy;
use rustc_hash::FxHashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    And,
    Or,
    Xor,
    Shl,
    Shr,
    Ushr,
    /// `rsub-int`: literal minus register
    Rsub,
}

impl BinaryOp {
    /// Bit-vector operator; division and remainder are unsigned
    pub fn bv_op(&self) -> BvOp {
        match self {
            BinaryOp::Add => BvOp::Add,
            BinaryOp::Sub | BinaryOp::Rsub => BvOp::Sub,
            BinaryOp::Mul => BvOp::Mul,
            BinaryOp::Div => BvOp::UDiv,
            BinaryOp::Rem => BvOp::URem,
            BinaryOp::And => BvOp::And,
            BinaryOp::Or => BvOp::Or,
            BinaryOp::Xor => BvOp::Xor,
            BinaryOp::Shl => BvOp::Shl,
            BinaryOp::Shr => BvOp::AShr,
            BinaryOp::Ushr => BvOp::LShr,
        }
    }
}

/// Register layout of a binary instruction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperandForm {
    /// `op vA, vB, vC`
    Three,
    /// `op/2addr vA, vB`
    TwoAddr,
    /// `op/lit8 vA, vB, #lit` and `op/lit16`
    Literal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnaryOp {
    Neg,
    Not,
    /// `int-to-long`, `float-to-int`, …
    Convert,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IfCond {
    Eq,
    Ne,
    Lt,
    Ge,
    Gt,
    Le,
}

impl IfCond {
    /// Comparison and whether it is negated (`ne` is `not eq`)
    pub fn bv_cmp(&self) -> (BvCmp, bool) {
        match self {
            IfCond::Eq => (BvCmp::Eq, false),
            IfCond::Ne => (BvCmp::Eq, true),
            IfCond::Lt => (BvCmp::Ult, false),
            IfCond::Ge => (BvCmp::Uge, false),
            IfCond::Gt => (BvCmp::Ugt, false),
            IfCond::Le => (BvCmp::Ule, false),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InvokeKind {
    Virtual,
    Super,
    Direct,
    Static,
    Interface,
}

impl InvokeKind {
    /// Resolved through the implementation set rather than definitions
    pub fn is_dynamic(&self) -> bool {
        matches!(self, InvokeKind::Virtual | InvokeKind::Interface)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConstKind {
    Literal,
    String,
    Class,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SwitchKind {
    Packed,
    Sparse,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Opcode {
    Nop,
    Monitor,
    Move,
    MoveResult,
    MoveException,
    Return,
    ReturnVoid,
    Const(ConstKind),
    CheckCast,
    InstanceOf,
    ArrayLength,
    NewInstance,
    NewArray,
    FilledNewArray { range: bool },
    FillArrayData,
    Throw,
    Goto,
    Switch(SwitchKind),
    Cmp,
    If { cond: IfCond, zero: bool },
    ArrayGet,
    ArrayPut,
    InstanceGet,
    InstancePut,
    StaticGet,
    StaticPut,
    Invoke { kind: InvokeKind, range: bool },
    Unary(UnaryOp),
    Binary { op: BinaryOp, form: OperandForm },
    /// `packed-switch-payload`, `sparse-switch-payload`, `array-payload`
    Payload,
    Unsupported,
}

impl Opcode {
    pub fn parse(mnemonic: &str) -> Opcode {
        OPCODES
            .get(mnemonic)
            .copied()
            .unwrap_or(Opcode::Unsupported)
    }

    /// Control never reaches the next instruction
    pub fn ends_block(&self) -> bool {
        matches!(
            self,
            Opcode::Return | Opcode::ReturnVoid | Opcode::Goto | Opcode::Throw
        )
    }
}

const TYPES: [&str; 4] = ["int", "long", "float", "double"];
const SUFFIXES: [&str; 7] = ["", "-wide", "-object", "-boolean", "-byte", "-char", "-short"];

static OPCODES: Lazy<FxHashMap<String, Opcode>> = Lazy::new(|| {
    let mut table: FxHashMap<String, Opcode> = FxHashMap::default();
    let mut add = |name: &str, op: Opcode| {
        table.insert(name.to_string(), op);
    };

    add("nop", Opcode::Nop);
    add("monitor-enter", Opcode::Monitor);
    add("monitor-exit", Opcode::Monitor);

    for base in ["move", "move-wide", "move-object"] {
        for suffix in ["", "/from16", "/16"] {
            add(&format!("{}{}", base, suffix), Opcode::Move);
        }
    }
    for name in ["move-result", "move-result-wide", "move-result-object"] {
        add(name, Opcode::MoveResult);
    }
    add("move-exception", Opcode::MoveException);

    add("return-void", Opcode::ReturnVoid);
    for name in ["return", "return-wide", "return-object"] {
        add(name, Opcode::Return);
    }

    for name in [
        "const/4",
        "const/16",
        "const",
        "const/high16",
        "const-wide/16",
        "const-wide/32",
        "const-wide",
        "const-wide/high16",
    ] {
        add(name, Opcode::Const(ConstKind::Literal));
    }
    add("const-string", Opcode::Const(ConstKind::String));
    add("const-string/jumbo", Opcode::Const(ConstKind::String));
    add("const-class", Opcode::Const(ConstKind::Class));

    add("check-cast", Opcode::CheckCast);
    add("instance-of", Opcode::InstanceOf);
    add("array-length", Opcode::ArrayLength);
    add("new-instance", Opcode::NewInstance);
    add("new-array", Opcode::NewArray);
    add("filled-new-array", Opcode::FilledNewArray { range: false });
    add("filled-new-array/range", Opcode::FilledNewArray { range: true });
    add("fill-array-data", Opcode::FillArrayData);
    add("throw", Opcode::Throw);

    for name in ["goto", "goto/16", "goto/32"] {
        add(name, Opcode::Goto);
    }
    add("packed-switch", Opcode::Switch(SwitchKind::Packed));
    add("sparse-switch", Opcode::Switch(SwitchKind::Sparse));
    for name in ["packed-switch-payload", "sparse-switch-payload", "array-payload"] {
        add(name, Opcode::Payload);
    }

    for name in ["cmpl-float", "cmpg-float", "cmpl-double", "cmpg-double", "cmp-long"] {
        add(name, Opcode::Cmp);
    }

    for (name, cond) in [
        ("eq", IfCond::Eq),
        ("ne", IfCond::Ne),
        ("lt", IfCond::Lt),
        ("ge", IfCond::Ge),
        ("gt", IfCond::Gt),
        ("le", IfCond::Le),
    ] {
        add(&format!("if-{}", name), Opcode::If { cond, zero: false });
        add(&format!("if-{}z", name), Opcode::If { cond, zero: true });
    }

    for suffix in SUFFIXES {
        add(&format!("aget{}", suffix), Opcode::ArrayGet);
        add(&format!("aput{}", suffix), Opcode::ArrayPut);
        add(&format!("iget{}", suffix), Opcode::InstanceGet);
        add(&format!("iput{}", suffix), Opcode::InstancePut);
        add(&format!("sget{}", suffix), Opcode::StaticGet);
        add(&format!("sput{}", suffix), Opcode::StaticPut);
    }

    for (name, kind) in [
        ("virtual", InvokeKind::Virtual),
        ("super", InvokeKind::Super),
        ("direct", InvokeKind::Direct),
        ("static", InvokeKind::Static),
        ("interface", InvokeKind::Interface),
    ] {
        add(&format!("invoke-{}", name), Opcode::Invoke { kind, range: false });
        add(&format!("invoke-{}/range", name), Opcode::Invoke { kind, range: true });
    }

    for ty in TYPES {
        add(&format!("neg-{}", ty), Opcode::Unary(UnaryOp::Neg));
        add(&format!("not-{}", ty), Opcode::Unary(UnaryOp::Not));
        for target in TYPES.iter().chain(["byte", "char", "short"].iter()) {
            if *target != ty {
                add(&format!("{}-to-{}", ty, target), Opcode::Unary(UnaryOp::Convert));
            }
        }
    }

    for (name, op) in [
        ("add", BinaryOp::Add),
        ("sub", BinaryOp::Sub),
        ("mul", BinaryOp::Mul),
        ("div", BinaryOp::Div),
        ("rem", BinaryOp::Rem),
        ("and", BinaryOp::And),
        ("or", BinaryOp::Or),
        ("xor", BinaryOp::Xor),
        ("shl", BinaryOp::Shl),
        ("shr", BinaryOp::Shr),
        ("ushr", BinaryOp::Ushr),
    ] {
        for ty in TYPES {
            add(&format!("{}-{}", name, ty), Opcode::Binary { op, form: OperandForm::Three });
            add(
                &format!("{}-{}/2addr", name, ty),
                Opcode::Binary { op, form: OperandForm::TwoAddr },
            );
        }
        add(&format!("{}-int/lit8", name), Opcode::Binary { op, form: OperandForm::Literal });
        add(&format!("{}-int/lit16", name), Opcode::Binary { op, form: OperandForm::Literal });
    }
    add("rsub-int", Opcode::Binary { op: BinaryOp::Rsub, form: OperandForm::Literal });
    add("rsub-int/lit8", Opcode::Binary { op: BinaryOp::Rsub, form: OperandForm::Literal });

    table
});

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_family_parsing() {
        assert_eq!(Opcode::parse("const/4"), Opcode::Const(ConstKind::Literal));
        assert_eq!(Opcode::parse("move-object/from16"), Opcode::Move);
        assert_eq!(Opcode::parse("iget-object"), Opcode::InstanceGet);
        assert_eq!(
            Opcode::parse("invoke-virtual/range"),
            Opcode::Invoke { kind: InvokeKind::Virtual, range: true }
        );
        assert_eq!(
            Opcode::parse("if-nez"),
            Opcode::If { cond: IfCond::Ne, zero: true }
        );
        assert_eq!(Opcode::parse("int-to-long"), Opcode::Unary(UnaryOp::Convert));
    }

    #[test]
    fn test_binary_forms() {
        assert_eq!(
            Opcode::parse("add-int/2addr"),
            Opcode::Binary { op: BinaryOp::Add, form: OperandForm::TwoAddr }
        );
        assert_eq!(
            Opcode::parse("rsub-int/lit8"),
            Opcode::Binary { op: BinaryOp::Rsub, form: OperandForm::Literal }
        );
        assert_eq!(BinaryOp::Rem.bv_op(), BvOp::URem);
        assert_eq!(BinaryOp::Shr.bv_op(), BvOp::AShr);
        assert_eq!(BinaryOp::Ushr.bv_op(), BvOp::LShr);
    }

    #[test]
    fn test_unsupported() {
        assert_eq!(Opcode::parse("iget-quick"), Opcode::Unsupported);
        assert_eq!(Opcode::parse("execute-inline"), Opcode::Unsupported);
        assert_eq!(Opcode::parse("invoke-polymorphic"), Opcode::Unsupported);
    }

    #[test]
    fn test_unsigned_comparisons() {
        assert_eq!(IfCond::Lt.bv_cmp(), (BvCmp::Ult, false));
        assert_eq!(IfCond::Ne.bv_cmp(), (BvCmp::Eq, true));
    }
}
