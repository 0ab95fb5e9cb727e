//! Output port for compiled clauses

use super::domain::{Clause, Query};
use crate::errors::Result;
use crate::shared::models::{ClassId, MethodId};

/// Destination of emitted clauses and queries.
///
/// Implementations must tolerate concurrent calls from the method workers.
pub trait ClauseSink: Send + Sync {
    fn add_clause(&self, clause: Clause) -> Result<()>;

    fn add_query(&self, query: Query) -> Result<()>;

    /// Record that `(class, method)` contains a sink call
    fn mark_sink_method(&self, class: ClassId, method: MethodId);

    fn add_clauses(&self, clauses: Vec<Clause>) -> Result<()> {
        for clause in clauses {
            self.add_clause(clause)?;
        }
        Ok(())
    }
}
