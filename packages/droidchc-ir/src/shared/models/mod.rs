//! Shared models

pub mod expr;
pub mod frame;
pub mod ids;

pub use expr::{BoolExpr, BvCmp, BvExpr, BvOp, BvUnOp, IntExpr, RelationApp, Sort, Term, Valuation, Value};
pub use frame::FrameShape;
pub use ids::{
    allocation_hash, bv_literal, java_hash, ClassId, FieldId, InstanceId, MethodId, ProgramPoint,
};
