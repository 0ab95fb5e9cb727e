//! Field layouts of framework classes
//!
//! Library types have no class definition in the program model; their
//! instance fields come from this table instead.

use crate::features::dalvik::domain::{field_id, is_primitive};
use crate::shared::models::FieldId;
use once_cell::sync::Lazy;
use rustc_hash::FxHashMap;
use std::collections::BTreeMap;

static STUB_FIELDS: Lazy<FxHashMap<&'static str, Vec<(&'static str, &'static str)>>> =
    Lazy::new(|| {
        let mut table = FxHashMap::default();
        table.insert("Landroid/graphics/PointF;", vec![("x", "F"), ("y", "F")]);
        table.insert("Landroid/graphics/Point;", vec![("x", "I"), ("y", "I")]);
        table.insert(
            "Landroid/graphics/Rect;",
            vec![("left", "I"), ("top", "I"), ("right", "I"), ("bottom", "I")],
        );
        table.insert(
            "Landroid/content/Intent;",
            vec![
                ("mAction", "Ljava/lang/String;"),
                ("mData", "Landroid/net/Uri;"),
                ("mType", "Ljava/lang/String;"),
                ("mFlags", "I"),
                ("mComponent", "Landroid/content/ComponentName;"),
                ("mExtras", "Landroid/os/Bundle;"),
            ],
        );
        table.insert(
            "Landroid/content/ComponentName;",
            vec![("mPackage", "Ljava/lang/String;"), ("mClass", "Ljava/lang/String;")],
        );
        table.insert(
            "Landroid/location/Location;",
            vec![
                ("mLatitude", "D"),
                ("mLongitude", "D"),
                ("mProvider", "Ljava/lang/String;"),
            ],
        );
        table
    });

/// `field id -> is_primitive` for a known framework type
pub fn stub_fields(type_name: &str) -> Option<BTreeMap<FieldId, bool>> {
    STUB_FIELDS.get(type_name).map(|fields| {
        fields
            .iter()
            .map(|(name, ty)| (field_id(name, ty), is_primitive(ty)))
            .collect()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::models::java_hash;

    #[test]
    fn test_point_f_layout() {
        let fields = stub_fields("Landroid/graphics/PointF;").unwrap();
        assert_eq!(fields.len(), 2);
        assert_eq!(fields.get(&java_hash("x:F")), Some(&true));
        assert_eq!(fields.get(&java_hash("y:F")), Some(&true));
    }

    #[test]
    fn test_unknown_type() {
        assert!(stub_fields("Lcom/example/Unknown;").is_none());
    }

    #[test]
    fn test_reference_fields_are_not_primitive() {
        let fields = stub_fields("Landroid/content/Intent;").unwrap();
        assert_eq!(fields.get(&java_hash("mExtras:Landroid/os/Bundle;")), Some(&false));
    }
}
