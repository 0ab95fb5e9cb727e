/*
 * Call Linkage Ports
 *
 * The compiler never decides dispatch itself. It asks a DispatchOracle,
 * which answers from whatever class-hierarchy and points-to information
 * the driver has at hand:
 *
 * ```
 *   InstructionCompiler ──> DispatchOracle ──> ProgramOracle (JSON model)
 *                                 ▲
 *                                 └── DispatchCache (memoizes resolve_*)
 * ```
 */

use crate::shared::models::{
    allocation_hash, ClassId, FieldId, FrameShape, InstanceId, MethodId,
};
use std::collections::BTreeMap;

/// Concrete target of a virtual/interface call
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Implementation {
    pub class: ClassId,
    pub method: MethodId,
    pub shape: FrameShape,
    /// Receiver instance ids that dispatch here
    pub instances: Vec<InstanceId>,
}

/// Target of a direct/static/super call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Definition {
    pub class: ClassId,
    pub method: MethodId,
    pub shape: FrameShape,
}

/// Dispatch and program facts consumed by the compiler.
///
/// Implementations are shared across the method workers.
pub trait DispatchOracle: Send + Sync {
    /// Implementations of `method` reachable from a receiver of static type `class`;
    /// `None` when nothing in the program implements it
    fn resolve_virtual(&self, class: ClassId, method: MethodId) -> Option<Vec<Implementation>>;

    /// Definitions of a direct/static target; `None` for library methods
    fn resolve_static(&self, class: ClassId, method: MethodId) -> Option<Vec<Definition>>;

    fn allocation_id(&self, class: ClassId, method: MethodId, pc: u32) -> InstanceId {
        allocation_hash(class, method, pc)
    }

    /// `field id -> is_primitive` of the allocated type
    fn field_layout(&self, type_name: &str, instance: InstanceId) -> Option<BTreeMap<FieldId, bool>>;

    fn is_source(&self, class: ClassId, method: MethodId) -> bool;

    fn is_sink(&self, class: ClassId, method: MethodId) -> bool;

    fn has_static_initializer(&self, class: ClassId) -> bool;

    fn method_shape(&self, class: ClassId, method: MethodId) -> Option<FrameShape>;

    /// Class declaring a static field reached through `class`; `None` means `class` itself
    fn static_field_owner(&self, _class: ClassId, _field: FieldId) -> Option<ClassId> {
        None
    }
}
