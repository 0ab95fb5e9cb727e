//! In-memory clause store
//!
//! Relations are declared lazily from the applications inside added clauses and
//! deduplicated by name; a second use of a name with a different signature is an
//! error. Clauses and queries are appended under `parking_lot` locks so method
//! workers can flush concurrently.

use crate::errors::{DroidChcError, Result};
use crate::features::chc::domain::clause::collect_apps;
use crate::features::chc::domain::{Clause, Query, RelationDecl};
use crate::features::chc::ports::ClauseSink;
use crate::shared::models::{ClassId, MethodId, RelationApp, Sort};
use dashmap::mapref::entry::Entry;
use dashmap::{DashMap, DashSet};
use parking_lot::Mutex;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StoreStats {
    pub relations: usize,
    pub clauses: usize,
    pub queries: usize,
    pub sink_methods: usize,
}

#[derive(Debug, Default)]
pub struct ClauseStore {
    relations: DashMap<String, Vec<Sort>>,
    clauses: Mutex<Vec<Clause>>,
    queries: Mutex<Vec<Query>>,
    sink_methods: DashSet<(ClassId, MethodId)>,
}

impl ClauseStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare the relation of `app` unless already known
    pub fn declare(&self, app: &RelationApp) -> Result<()> {
        let signature = app.signature();
        match self.relations.entry(app.name.clone()) {
            Entry::Occupied(existing) => {
                if existing.get() != &signature {
                    return Err(DroidChcError::compile(format!(
                        "relation {} used with arity {} but declared with arity {}",
                        app.name,
                        signature.len(),
                        existing.get().len()
                    )));
                }
            }
            Entry::Vacant(slot) => {
                slot.insert(signature);
            }
        }
        Ok(())
    }

    /// Declared relations, sorted by name
    pub fn relations(&self) -> Vec<RelationDecl> {
        let mut decls: Vec<RelationDecl> = self
            .relations
            .iter()
            .map(|entry| RelationDecl::new(entry.key().clone(), entry.value().clone()))
            .collect();
        decls.sort();
        decls
    }

    pub fn relation(&self, name: &str) -> Option<RelationDecl> {
        self.relations
            .get(name)
            .map(|sig| RelationDecl::new(name, sig.value().clone()))
    }

    pub fn clauses(&self) -> Vec<Clause> {
        self.clauses.lock().clone()
    }

    pub fn queries(&self) -> Vec<Query> {
        self.queries.lock().clone()
    }

    pub fn is_sink_method(&self, class: ClassId, method: MethodId) -> bool {
        self.sink_methods.contains(&(class, method))
    }

    pub fn stats(&self) -> StoreStats {
        StoreStats {
            relations: self.relations.len(),
            clauses: self.clauses.lock().len(),
            queries: self.queries.lock().len(),
            sink_methods: self.sink_methods.len(),
        }
    }
}

impl ClauseSink for ClauseStore {
    fn add_clause(&self, clause: Clause) -> Result<()> {
        for app in clause.relation_apps() {
            self.declare(app)?;
        }
        self.clauses.lock().push(clause);
        Ok(())
    }

    fn add_query(&self, query: Query) -> Result<()> {
        let mut apps = Vec::new();
        collect_apps(&query.condition, &mut apps);
        for app in apps {
            self.declare(app)?;
        }
        self.queries.lock().push(query);
        Ok(())
    }

    fn mark_sink_method(&self, class: ClassId, method: MethodId) {
        self.sink_methods.insert((class, method));
    }

    fn add_clauses(&self, clauses: Vec<Clause>) -> Result<()> {
        for clause in &clauses {
            for app in clause.relation_apps() {
                self.declare(app)?;
            }
        }
        self.clauses.lock().extend(clauses);
        Ok(())
    }
}
