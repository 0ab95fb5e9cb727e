//! Type, method and field descriptors
//!
//! `Lcom/example/Foo;->bar(I[Ljava/lang/String;)V` and
//! `Lcom/example/Foo;->count:I`.

use crate::errors::{DroidChcError, Result};
use crate::shared::constants::STRING_CLASS;
use crate::shared::models::{java_hash, ClassId, FieldId, MethodId};
use once_cell::sync::Lazy;
use regex::Regex;
use std::fmt;

static METHOD_REF: Lazy<Option<Regex>> =
    Lazy::new(|| Regex::new(r"^(\[*L[^;]+;|\[+[ZBSCIJFD])->([^(\s]+)\(([^)]*)\)(\S+)$").ok());

static FIELD_REF: Lazy<Option<Regex>> =
    Lazy::new(|| Regex::new(r"^(L[^;]+;)->([^:\s]+):(\S+)$").ok());

/// Primitive type descriptor (`V` excluded)
pub fn is_primitive(descriptor: &str) -> bool {
    matches!(descriptor, "Z" | "B" | "S" | "C" | "I" | "J" | "F" | "D")
}

/// Kind of value a method returns
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReturnKind {
    Void,
    Primitive,
    String,
    Array,
    Object,
}

impl ReturnKind {
    pub fn of(descriptor: &str) -> Self {
        match descriptor {
            "V" => ReturnKind::Void,
            STRING_CLASS => ReturnKind::String,
            d if d.starts_with('[') => ReturnKind::Array,
            d if is_primitive(d) => ReturnKind::Primitive,
            _ => ReturnKind::Object,
        }
    }

    pub fn returns_value(&self) -> bool {
        !matches!(self, ReturnKind::Void)
    }
}

/// Split a parameter list into single descriptors
pub fn split_parameters(params: &str) -> Result<Vec<String>> {
    let bytes = params.as_bytes();
    let mut out = Vec::new();
    let mut i = 0;
    while i < bytes.len() {
        let start = i;
        while i < bytes.len() && bytes[i] == b'[' {
            i += 1;
        }
        match bytes.get(i) {
            Some(b'L') => {
                let end = params[i..]
                    .find(';')
                    .ok_or_else(|| DroidChcError::model(format!("unterminated class in ({})", params)))?;
                i += end + 1;
            }
            Some(c) if b"ZBSCIJFD".contains(c) => i += 1,
            _ => {
                return Err(DroidChcError::model(format!(
                    "bad parameter descriptor in ({})",
                    params
                )))
            }
        }
        out.push(params[start..i].to_string());
    }
    Ok(out)
}

/// `Lcls;->name(params)ret`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MethodRef {
    pub class: String,
    pub name: String,
    pub parameters: Vec<String>,
    pub return_type: String,
}

impl MethodRef {
    pub fn parse(reference: &str) -> Result<Self> {
        let caps = METHOD_REF
            .as_ref()
            .and_then(|re| re.captures(reference.trim()))
            .ok_or_else(|| DroidChcError::model(format!("malformed method reference {}", reference)))?;
        Ok(Self {
            class: caps[1].to_string(),
            name: caps[2].to_string(),
            parameters: split_parameters(&caps[3])?,
            return_type: caps[4].to_string(),
        })
    }

    /// `name(params)ret`
    pub fn signature(&self) -> String {
        format!("{}({}){}", self.name, self.parameters.concat(), self.return_type)
    }

    pub fn class_id(&self) -> ClassId {
        java_hash(&self.class)
    }

    pub fn method_id(&self) -> MethodId {
        java_hash(&self.signature())
    }

    pub fn return_kind(&self) -> ReturnKind {
        ReturnKind::of(&self.return_type)
    }
}

impl fmt::Display for MethodRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}->{}", self.class, self.signature())
    }
}

/// `Lcls;->name:type`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FieldRef {
    pub class: String,
    pub name: String,
    pub field_type: String,
}

impl FieldRef {
    pub fn parse(reference: &str) -> Result<Self> {
        let caps = FIELD_REF
            .as_ref()
            .and_then(|re| re.captures(reference.trim()))
            .ok_or_else(|| DroidChcError::model(format!("malformed field reference {}", reference)))?;
        Ok(Self {
            class: caps[1].to_string(),
            name: caps[2].to_string(),
            field_type: caps[3].to_string(),
        })
    }

    pub fn class_id(&self) -> ClassId {
        java_hash(&self.class)
    }

    pub fn field_id(&self) -> FieldId {
        field_id(&self.name, &self.field_type)
    }
}

/// Hash of `name:type`
pub fn field_id(name: &str, field_type: &str) -> FieldId {
    java_hash(&format!("{}:{}", name, field_type))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_method_ref_parsing() {
        let m = MethodRef::parse("Landroid/util/Log;->d(Ljava/lang/String;Ljava/lang/String;)I").unwrap();
        assert_eq!(m.class, "Landroid/util/Log;");
        assert_eq!(m.name, "d");
        assert_eq!(m.parameters, vec!["Ljava/lang/String;", "Ljava/lang/String;"]);
        assert_eq!(m.signature(), "d(Ljava/lang/String;Ljava/lang/String;)I");
        assert_eq!(m.return_kind(), ReturnKind::Primitive);
    }

    #[test]
    fn test_method_ref_arrays_and_init() {
        let m = MethodRef::parse("LFoo;-><init>([[I[Ljava/lang/Object;J)V").unwrap();
        assert_eq!(m.parameters, vec!["[[I", "[Ljava/lang/Object;", "J"]);
        assert_eq!(m.return_kind(), ReturnKind::Void);

        let clone = MethodRef::parse("[I->clone()Ljava/lang/Object;").unwrap();
        assert_eq!(clone.class, "[I");
    }

    #[test]
    fn test_malformed_references() {
        assert!(MethodRef::parse("LFoo;->bar").is_err());
        assert!(MethodRef::parse("LFoo;->bar(Q)V").is_err());
        assert!(FieldRef::parse("LFoo;->x").is_err());
    }

    #[test]
    fn test_field_ref() {
        let f = FieldRef::parse("LFoo;->x:I").unwrap();
        assert_eq!(f.field_id(), java_hash("x:I"));
        assert_eq!(f.class_id(), java_hash("LFoo;"));
    }

    #[test]
    fn test_return_kinds() {
        assert_eq!(ReturnKind::of("Ljava/lang/String;"), ReturnKind::String);
        assert_eq!(ReturnKind::of("[B"), ReturnKind::Array);
        assert_eq!(ReturnKind::of("Landroid/os/Bundle;"), ReturnKind::Object);
        assert!(!ReturnKind::of("V").returns_value());
    }
}
