//! Dispatch oracle over the JSON program model
//!
//! A lookup table, not a dispatch algorithm: subtypes are found by walking
//! `super_class`/`interfaces` names, a call dispatches to the nearest
//! definition above each subtype, and the receiver instances of a class are
//! its `new-instance` sites (plus one synthetic instance for entry classes).

use super::source_sink::SourceSinkTable;
use crate::features::call_linkage::ports::{Definition, DispatchOracle, Implementation};
use crate::features::dalvik::domain::{Opcode, Program};
use crate::features::heap_model::infrastructure::stub_fields;
use crate::shared::models::{java_hash, ClassId, FieldId, FrameShape, InstanceId, MethodId};
use rustc_hash::{FxHashMap, FxHashSet};
use std::collections::{BTreeMap, BTreeSet};

#[derive(Debug, Clone, Default)]
struct ClassInfo {
    super_class: Option<ClassId>,
    interfaces: Vec<ClassId>,
    methods: FxHashMap<MethodId, FrameShape>,
    instance_fields: Vec<(FieldId, bool)>,
    static_fields: FxHashSet<FieldId>,
    has_clinit: bool,
    is_entry: bool,
}

pub struct ProgramOracle {
    classes: FxHashMap<ClassId, ClassInfo>,
    /// Program classes in model order
    order: Vec<ClassId>,
    /// `new-instance` sites per allocated class
    instances: FxHashMap<ClassId, BTreeSet<InstanceId>>,
    table: SourceSinkTable,
}

impl ProgramOracle {
    pub fn new(program: &Program, table: SourceSinkTable) -> Self {
        let mut oracle = Self {
            classes: FxHashMap::default(),
            order: Vec::with_capacity(program.classes.len()),
            instances: FxHashMap::default(),
            table,
        };

        for class in &program.classes {
            let info = ClassInfo {
                super_class: class.super_class.as_deref().map(java_hash),
                interfaces: class.interfaces.iter().map(|i| java_hash(i)).collect(),
                methods: class
                    .methods
                    .iter()
                    .filter(|m| m.shape().is_well_formed())
                    .map(|m| (m.id(), m.shape()))
                    .collect(),
                instance_fields: class
                    .instance_fields()
                    .map(|f| (f.id(), f.is_primitive()))
                    .collect(),
                static_fields: class.static_fields().map(|f| f.id()).collect(),
                has_clinit: class.has_static_initializer(),
                is_entry: class.is_entry_class(),
            };
            let id = class.id();
            oracle.classes.insert(id, info);
            oracle.order.push(id);
        }

        for class in &program.classes {
            let class_id = class.id();
            for method in &class.methods {
                let method_id = method.id();
                for instr in &method.instructions {
                    if instr.op() != Opcode::NewInstance {
                        continue;
                    }
                    if let Some(type_name) = instr.reference.as_deref() {
                        let instance = oracle.allocation_id(class_id, method_id, instr.pc);
                        oracle
                            .instances
                            .entry(java_hash(type_name))
                            .or_default()
                            .insert(instance);
                    }
                }
            }
        }

        oracle
    }

    /// `class` and its program superclasses, nearest first
    fn super_chain(&self, class: ClassId) -> Vec<ClassId> {
        let mut chain = Vec::new();
        let mut current = Some(class);
        while let Some(id) = current {
            if chain.contains(&id) {
                break;
            }
            chain.push(id);
            current = self.classes.get(&id).and_then(|c| c.super_class);
        }
        chain
    }

    fn implements(&self, interface: ClassId, candidate: ClassId, seen: &mut FxHashSet<ClassId>) -> bool {
        if candidate == interface {
            return true;
        }
        if !seen.insert(candidate) {
            return false;
        }
        match self.classes.get(&candidate) {
            Some(info) => info
                .interfaces
                .iter()
                .any(|i| self.implements(interface, *i, seen)),
            None => false,
        }
    }

    /// `candidate` is `ancestor` or inherits from it
    fn is_subtype(&self, candidate: ClassId, ancestor: ClassId) -> bool {
        let mut seen = FxHashSet::default();
        self.super_chain(candidate)
            .into_iter()
            .any(|c| self.implements(ancestor, c, &mut seen))
    }

    /// Nearest definition of `method` at or above `class`
    fn lookup(&self, class: ClassId, method: MethodId) -> Option<(ClassId, FrameShape)> {
        self.super_chain(class).into_iter().find_map(|c| {
            self.classes
                .get(&c)
                .and_then(|info| info.methods.get(&method))
                .map(|shape| (c, *shape))
        })
    }

    fn instances_of(&self, class: ClassId) -> Vec<InstanceId> {
        let mut instances: BTreeSet<InstanceId> = self
            .instances
            .get(&class)
            .cloned()
            .unwrap_or_default();
        if self.classes.get(&class).is_some_and(|c| c.is_entry) {
            instances.insert(self.allocation_id(class, 0, 0));
        }
        instances.into_iter().collect()
    }
}

impl DispatchOracle for ProgramOracle {
    fn resolve_virtual(&self, class: ClassId, method: MethodId) -> Option<Vec<Implementation>> {
        let mut by_target: BTreeMap<ClassId, (FrameShape, BTreeSet<InstanceId>)> = BTreeMap::new();

        for candidate in &self.order {
            if !self.is_subtype(*candidate, class) {
                continue;
            }
            let Some((target, shape)) = self.lookup(*candidate, method) else {
                continue;
            };
            by_target
                .entry(target)
                .or_insert_with(|| (shape, BTreeSet::new()))
                .1
                .extend(self.instances_of(*candidate));
        }

        let implementations: Vec<Implementation> = by_target
            .into_iter()
            .filter(|(_, (_, instances))| !instances.is_empty())
            .map(|(target, (shape, instances))| Implementation {
                class: target,
                method,
                shape,
                instances: instances.into_iter().collect(),
            })
            .collect();

        if implementations.is_empty() {
            None
        } else {
            Some(implementations)
        }
    }

    fn resolve_static(&self, class: ClassId, method: MethodId) -> Option<Vec<Definition>> {
        self.lookup(class, method).map(|(target, shape)| {
            vec![Definition {
                class: target,
                method,
                shape,
            }]
        })
    }

    fn field_layout(&self, type_name: &str, _instance: InstanceId) -> Option<BTreeMap<FieldId, bool>> {
        let class = java_hash(type_name);
        if !self.classes.contains_key(&class) {
            return stub_fields(type_name);
        }
        let fields = self
            .super_chain(class)
            .into_iter()
            .filter_map(|c| self.classes.get(&c))
            .flat_map(|info| info.instance_fields.iter().copied())
            .collect();
        Some(fields)
    }

    fn is_source(&self, class: ClassId, method: MethodId) -> bool {
        self.table.is_source(class, method)
    }

    fn is_sink(&self, class: ClassId, method: MethodId) -> bool {
        self.table.is_sink(class, method)
    }

    fn has_static_initializer(&self, class: ClassId) -> bool {
        self.classes.get(&class).is_some_and(|c| c.has_clinit)
    }

    fn method_shape(&self, class: ClassId, method: MethodId) -> Option<FrameShape> {
        self.lookup(class, method).map(|(_, shape)| shape)
    }

    fn static_field_owner(&self, class: ClassId, field: FieldId) -> Option<ClassId> {
        self.super_chain(class).into_iter().find(|c| {
            self.classes
                .get(c)
                .is_some_and(|info| info.static_fields.contains(&field))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::models::allocation_hash;

    const MODEL: &str = r#"{
        "classes": [
            {"name": "LBase;", "interfaces": ["Ljava/lang/Runnable;"],
             "fields": [{"name": "tag", "type": "Ljava/lang/String;"},
                        {"name": "COUNT", "type": "I", "is_static": true}],
             "methods": [{"name": "run()V", "num_registers": 1, "num_arguments": 1}]},
            {"name": "LChild;", "super_class": "LBase;",
             "fields": [{"name": "x", "type": "I"}],
             "methods": [{"name": "<clinit>()V", "num_registers": 1, "num_arguments": 0, "is_static": true}]},
            {"name": "LMain;",
             "methods": [{"name": "main()V", "num_registers": 2, "num_arguments": 1, "entry_point": true,
                          "instructions": [
                              {"pc": 0, "opcode": "new-instance", "registers": [0], "reference": "LChild;"},
                              {"pc": 2, "opcode": "return-void"}
                          ]}]}
        ]
    }"#;

    fn oracle() -> ProgramOracle {
        let program = Program::from_json_str(MODEL).unwrap();
        ProgramOracle::new(&program, SourceSinkTable::default())
    }

    #[test]
    fn test_interface_dispatch_reaches_inherited_definition() {
        let oracle = oracle();
        let impls = oracle
            .resolve_virtual(java_hash("Ljava/lang/Runnable;"), java_hash("run()V"))
            .unwrap();
        assert_eq!(impls.len(), 1);
        assert_eq!(impls[0].class, java_hash("LBase;"));

        let site = allocation_hash(java_hash("LMain;"), java_hash("main()V"), 0);
        assert_eq!(impls[0].instances, vec![site]);
    }

    #[test]
    fn test_no_instances_means_unresolved() {
        let oracle = oracle();
        assert!(oracle
            .resolve_virtual(java_hash("LBase;"), java_hash("toString()Ljava/lang/String;"))
            .is_none());
    }

    #[test]
    fn test_entry_class_has_synthetic_instance() {
        let oracle = oracle();
        let main = java_hash("LMain;");
        let impls = oracle.resolve_virtual(main, java_hash("main()V")).unwrap();
        assert_eq!(impls[0].instances, vec![allocation_hash(main, 0, 0)]);
    }

    #[test]
    fn test_field_layout_includes_superclass_fields() {
        let oracle = oracle();
        let layout = oracle.field_layout("LChild;", 0).unwrap();
        assert_eq!(layout.len(), 2);
        assert_eq!(layout.get(&java_hash("x:I")), Some(&true));
        assert_eq!(layout.get(&java_hash("tag:Ljava/lang/String;")), Some(&false));

        assert!(oracle.field_layout("Landroid/graphics/PointF;", 0).is_some());
        assert!(oracle.field_layout("Lcom/unknown/Type;", 0).is_none());
    }

    #[test]
    fn test_static_lookups() {
        let oracle = oracle();
        let child = java_hash("LChild;");
        assert!(oracle.has_static_initializer(child));
        assert_eq!(
            oracle.static_field_owner(child, java_hash("COUNT:I")),
            Some(java_hash("LBase;"))
        );
        let defs = oracle.resolve_static(child, java_hash("run()V")).unwrap();
        assert_eq!(defs[0].class, java_hash("LBase;"));
        assert_eq!(oracle.method_shape(child, java_hash("run()V")), Some(FrameShape::new(1, 1)));
    }
}
