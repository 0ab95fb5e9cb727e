//! Local-heap layout pre-pass
//!
//! Walks every method once, before any clause is emitted, and registers each
//! `new-instance` site with the layout. Intent allocations are excluded: they
//! live on the intent heap and never occupy local slots.

use crate::features::call_linkage::ports::DispatchOracle;
use crate::features::dalvik::domain::{Opcode, Program};
use crate::features::heap_model::domain::LocalHeapLayout;
use crate::shared::constants::INTENT_CLASS;
use crate::shared::models::java_hash;
use tracing::debug;

pub struct LayoutBuilder<'a> {
    oracle: &'a dyn DispatchOracle,
}

impl<'a> LayoutBuilder<'a> {
    pub fn new(oracle: &'a dyn DispatchOracle) -> Self {
        Self { oracle }
    }

    pub fn build(&self, program: &Program) -> LocalHeapLayout {
        let mut layout = LocalHeapLayout::new();

        for class in &program.classes {
            let class_id = class.id();
            for method in &class.methods {
                let method_id = method.id();
                for instr in &method.instructions {
                    if instr.op() != Opcode::NewInstance {
                        continue;
                    }
                    let Some(type_name) = instr.reference.as_deref() else {
                        continue;
                    };
                    if type_name == INTENT_CLASS {
                        continue;
                    }

                    let instance = self.oracle.allocation_id(class_id, method_id, instr.pc);
                    let fields = self
                        .oracle
                        .field_layout(type_name, instance)
                        .unwrap_or_default();
                    let site = layout.add_site(instance, type_name, java_hash(type_name), fields);
                    debug!(
                        instance = site.instance,
                        type_name = %site.type_name,
                        offset = site.offset,
                        fields = site.size(),
                        "registered allocation site"
                    );
                }
            }
        }

        debug!(sites = layout.sites().len(), slots = layout.size(), "local heap layout");
        layout
    }
}
