//! Relation declarations

use crate::shared::models::{ClassId, MethodId, Sort};
use std::fmt;

/// Name and argument sorts of a declared relation
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct RelationDecl {
    pub name: String,
    pub signature: Vec<Sort>,
}

impl RelationDecl {
    pub fn new(name: impl Into<String>, signature: Vec<Sort>) -> Self {
        Self {
            name: name.into(),
            signature,
        }
    }

    pub fn arity(&self) -> usize {
        self.signature.len()
    }
}

impl fmt::Display for RelationDecl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(declare-rel {} (", self.name)?;
        for (i, sort) in self.signature.iter().enumerate() {
            if i > 0 {
                write!(f, " ")?;
            }
            write!(f, "{}", sort)?;
        }
        write!(f, "))")
    }
}

/// `RES_<c>_<m>`
pub fn exit_relation_name(class: ClassId, method: MethodId) -> String {
    format!("RES_{}_{}", class, method)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_declaration_rendering() {
        let decl = RelationDecl::new("S", vec![Sort::Int, Sort::Int, Sort::BitVec(32), Sort::Bool]);
        assert_eq!(decl.arity(), 4);
        assert_eq!(decl.to_string(), "(declare-rel S (Int Int (_ BitVec 32) Bool))");
        assert_eq!(RelationDecl::new("Q_0", vec![]).to_string(), "(declare-rel Q_0 ())");
    }

    #[test]
    fn test_exit_relation_name() {
        assert_eq!(exit_relation_name(12, -4), "RES_12_-4");
    }
}
