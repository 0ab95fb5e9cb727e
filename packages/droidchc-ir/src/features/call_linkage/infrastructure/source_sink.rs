//! Source and sink signatures
//!
//! Signatures are written `Lcls;->name(params)ret` and matched by
//! `(classId, methodId)` of the call's method reference.

use crate::errors::Result;
use crate::features::dalvik::domain::MethodRef;
use crate::shared::models::{ClassId, MethodId};
use rustc_hash::FxHashMap;

pub const DEFAULT_SOURCES: &[&str] = &[
    "Landroid/telephony/TelephonyManager;->getDeviceId()Ljava/lang/String;",
    "Landroid/telephony/TelephonyManager;->getSubscriberId()Ljava/lang/String;",
    "Landroid/telephony/TelephonyManager;->getLine1Number()Ljava/lang/String;",
    "Landroid/location/Location;->getLatitude()D",
    "Landroid/location/Location;->getLongitude()D",
];

pub const DEFAULT_SINKS: &[&str] = &[
    "Landroid/telephony/SmsManager;->sendTextMessage(Ljava/lang/String;Ljava/lang/String;Ljava/lang/String;Landroid/app/PendingIntent;Landroid/app/PendingIntent;)V",
    "Landroid/util/Log;->d(Ljava/lang/String;Ljava/lang/String;)I",
    "Landroid/util/Log;->i(Ljava/lang/String;Ljava/lang/String;)I",
    "Landroid/util/Log;->e(Ljava/lang/String;Ljava/lang/String;)I",
    "Landroid/util/Log;->v(Ljava/lang/String;Ljava/lang/String;)I",
    "Landroid/util/Log;->w(Ljava/lang/String;Ljava/lang/String;)I",
    "Ljava/io/OutputStream;->write([B)V",
];

/// `(classId, methodId)` of a configured signature
pub fn parse_signature(signature: &str) -> Result<(ClassId, MethodId)> {
    let method = MethodRef::parse(signature)?;
    Ok((method.class_id(), method.method_id()))
}

/// Parsed source and sink sets
#[derive(Debug, Clone, Default)]
pub struct SourceSinkTable {
    sources: FxHashMap<(ClassId, MethodId), String>,
    sinks: FxHashMap<(ClassId, MethodId), String>,
}

impl SourceSinkTable {
    pub fn new<S: AsRef<str>>(sources: &[S], sinks: &[S]) -> Result<Self> {
        let mut table = Self::default();
        for signature in sources {
            let key = parse_signature(signature.as_ref())?;
            table.sources.insert(key, signature.as_ref().to_string());
        }
        for signature in sinks {
            let key = parse_signature(signature.as_ref())?;
            table.sinks.insert(key, signature.as_ref().to_string());
        }
        Ok(table)
    }

    pub fn defaults() -> Result<Self> {
        Self::new(DEFAULT_SOURCES, DEFAULT_SINKS)
    }

    pub fn is_source(&self, class: ClassId, method: MethodId) -> bool {
        self.sources.contains_key(&(class, method))
    }

    pub fn is_sink(&self, class: ClassId, method: MethodId) -> bool {
        self.sinks.contains_key(&(class, method))
    }

    pub fn source_count(&self) -> usize {
        self.sources.len()
    }

    pub fn sink_count(&self) -> usize {
        self.sinks.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::models::java_hash;

    #[test]
    fn test_parse_signature() {
        let (class, method) = parse_signature("Landroid/util/Log;->d(Ljava/lang/String;Ljava/lang/String;)I").unwrap();
        assert_eq!(class, java_hash("Landroid/util/Log;"));
        assert_eq!(method, java_hash("d(Ljava/lang/String;Ljava/lang/String;)I"));
        assert!(parse_signature("Log.d").is_err());
    }

    #[test]
    fn test_default_table() {
        let table = SourceSinkTable::defaults().unwrap();
        assert_eq!(table.source_count(), DEFAULT_SOURCES.len());
        assert_eq!(table.sink_count(), DEFAULT_SINKS.len());

        let class = java_hash("Landroid/telephony/TelephonyManager;");
        assert!(table.is_source(class, java_hash("getDeviceId()Ljava/lang/String;")));
        assert!(!table.is_sink(class, java_hash("getDeviceId()Ljava/lang/String;")));
    }
}
