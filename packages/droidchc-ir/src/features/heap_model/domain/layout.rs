//! Local-heap layout
//!
//! Every `new-instance` site owns `size + 1` consecutive slots of the flat
//! local heap: one per declared field in ascending field-id order, then a
//! header slot whose `free` flag tells whether the site's current epoch is
//! occupied. Offsets are assigned once, in registration order, and never
//! change.

use crate::shared::models::{ClassId, FieldId, InstanceId};
use rustc_hash::FxHashMap;
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AllocationSite {
    pub instance: InstanceId,
    /// Allocated type descriptor
    pub type_name: String,
    pub class: ClassId,
    pub offset: usize,
    /// `(field, is_primitive)` in slot order
    pub fields: Vec<(FieldId, bool)>,
}

impl AllocationSite {
    /// Declared fields (0 when the type is unknown)
    pub fn size(&self) -> usize {
        self.fields.len()
    }

    pub fn has_layout(&self) -> bool {
        !self.fields.is_empty()
    }

    pub fn field_slot(&self, field: FieldId) -> Option<usize> {
        self.fields
            .iter()
            .position(|(f, _)| *f == field)
            .map(|i| self.offset + i)
    }

    pub fn header_slot(&self) -> usize {
        self.offset + self.size()
    }

    /// Field slots and header
    pub fn slots(&self) -> std::ops::RangeInclusive<usize> {
        self.offset..=self.header_slot()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LocalHeapLayout {
    sites: Vec<AllocationSite>,
    by_instance: FxHashMap<InstanceId, usize>,
    size: usize,
}

impl LocalHeapLayout {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a site; a second registration of the same instance is ignored
    pub fn add_site(
        &mut self,
        instance: InstanceId,
        type_name: impl Into<String>,
        class: ClassId,
        fields: BTreeMap<FieldId, bool>,
    ) -> &AllocationSite {
        let index = match self.by_instance.get(&instance) {
            Some(index) => *index,
            None => {
                let site = AllocationSite {
                    instance,
                    type_name: type_name.into(),
                    class,
                    offset: self.size,
                    fields: fields.into_iter().collect(),
                };
                self.size += site.size() + 1;
                self.sites.push(site);
                self.by_instance.insert(instance, self.sites.len() - 1);
                self.sites.len() - 1
            }
        };
        &self.sites[index]
    }

    pub fn site(&self, instance: InstanceId) -> Option<&AllocationSite> {
        self.by_instance.get(&instance).map(|i| &self.sites[*i])
    }

    pub fn sites(&self) -> &[AllocationSite] {
        &self.sites
    }

    /// Sites declaring `field`, with the slot holding it
    pub fn sites_with_field(&self, field: FieldId) -> impl Iterator<Item = (&AllocationSite, usize)> {
        self.sites
            .iter()
            .filter_map(move |site| site.field_slot(field).map(|slot| (site, slot)))
    }

    /// Total slots
    pub fn size(&self) -> usize {
        self.size
    }

    pub fn is_empty(&self) -> bool {
        self.sites.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fields(ids: &[FieldId]) -> BTreeMap<FieldId, bool> {
        ids.iter().map(|id| (*id, true)).collect()
    }

    #[test]
    fn test_offsets_are_disjoint() {
        let mut layout = LocalHeapLayout::new();
        layout.add_site(100, "LA;", 1, fields(&[30, 10]));
        layout.add_site(200, "LB;", 2, BTreeMap::new());
        layout.add_site(300, "LC;", 3, fields(&[5]));

        let a = layout.site(100).unwrap();
        assert_eq!(a.offset, 0);
        assert_eq!(a.field_slot(10), Some(0));
        assert_eq!(a.field_slot(30), Some(1));
        assert_eq!(a.header_slot(), 2);

        let b = layout.site(200).unwrap();
        assert_eq!(b.offset, 3);
        assert_eq!(b.header_slot(), 3);
        assert!(!b.has_layout());

        let c = layout.site(300).unwrap();
        assert_eq!(c.slots(), 4..=5);
        assert_eq!(layout.size(), 6);
    }

    #[test]
    fn test_registration_is_idempotent() {
        let mut layout = LocalHeapLayout::new();
        layout.add_site(1, "LA;", 1, fields(&[1]));
        layout.add_site(1, "LA;", 1, fields(&[1, 2, 3]));
        assert_eq!(layout.sites().len(), 1);
        assert_eq!(layout.size(), 2);
    }

    #[test]
    fn test_sites_with_field() {
        let mut layout = LocalHeapLayout::new();
        layout.add_site(1, "LA;", 1, fields(&[7]));
        layout.add_site(2, "LB;", 2, fields(&[3, 7]));
        layout.add_site(3, "LC;", 3, fields(&[3]));

        let hits: Vec<_> = layout
            .sites_with_field(7)
            .map(|(site, slot)| (site.instance, slot))
            .collect();
        assert_eq!(hits, vec![(1, 0), (2, 3)]);
    }
}
