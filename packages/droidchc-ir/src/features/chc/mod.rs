// Horn clause storage and export
//
// Hexagonal Architecture:
// - domain: Relation declarations, clauses, queries
// - ports: ClauseSink (where compiled clauses go)
// - infrastructure: In-memory ClauseStore, SMT-LIB2 fixedpoint exporter

pub mod domain;
pub mod infrastructure;
pub mod ports;

pub use domain::{Clause, Query, QueryKey, RelationDecl};
pub use infrastructure::{ClauseStore, SmtLibExporter, StoreStats};
pub use ports::ClauseSink;
