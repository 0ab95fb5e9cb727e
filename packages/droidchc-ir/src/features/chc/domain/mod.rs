pub mod clause;
pub mod relation;

pub use clause::{Clause, Query, QueryKey};
pub use relation::{exit_relation_name, RelationDecl};
