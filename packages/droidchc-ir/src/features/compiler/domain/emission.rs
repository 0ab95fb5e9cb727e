//! Output of compiling one instruction or method

use crate::errors::Result;
use crate::features::chc::domain::{Clause, Query};
use crate::features::chc::ports::ClauseSink;
use crate::shared::models::{ClassId, MethodId};

#[derive(Debug, Clone, Default)]
pub struct Emission {
    pub clauses: Vec<Clause>,
    pub queries: Vec<Query>,
    /// The code contains a call to a configured sink
    pub sink_call: bool,
}

impl Emission {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, clause: Clause) {
        // a body folded to `false` can never fire
        if !clause.body_formula().is_false() {
            self.clauses.push(clause);
        }
    }

    pub fn extend(&mut self, other: Emission) {
        self.clauses.extend(other.clauses);
        self.queries.extend(other.queries);
        self.sink_call |= other.sink_call;
    }

    pub fn is_empty(&self) -> bool {
        self.clauses.is_empty() && self.queries.is_empty()
    }

    /// Hand everything to `sink`, marking `(class, method)` when it calls a sink
    pub fn flush(self, sink: &dyn ClauseSink, class: ClassId, method: MethodId) -> Result<()> {
        if self.sink_call {
            sink.mark_sink_method(class, method);
        }
        sink.add_clauses(self.clauses)?;
        for query in self.queries {
            sink.add_query(query)?;
        }
        Ok(())
    }
}
