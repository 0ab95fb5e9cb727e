//! SMT-LIB2 fixedpoint exporter
//!
//! Renders a `ClauseStore` in the `declare-rel` / `declare-var` / `rule` /
//! `query` dialect. Output is sorted so it does not depend on worker
//! scheduling. Each query becomes a fresh nullary relation `Q_<k>` reached
//! from its condition; with merging on, queries sharing a `QueryKey` share one
//! relation.

use super::clause_store::ClauseStore;
use crate::errors::{DroidChcError, Result};
use crate::features::chc::domain::{Query, QueryKey, RelationDecl};
use crate::shared::models::{BoolExpr, Sort};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt::Write as _;

#[derive(Debug, Clone, Copy, Default)]
pub struct SmtLibExporter {
    merge_queries: bool,
    verbose: bool,
}

impl SmtLibExporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn merge_queries(mut self, enabled: bool) -> Self {
        self.merge_queries = enabled;
        self
    }

    pub fn verbose(mut self, enabled: bool) -> Self {
        self.verbose = enabled;
        self
    }

    pub fn to_smt2(&self, store: &ClauseStore) -> Result<String> {
        let relations = store.relations();
        let queries = self.group_queries(store.queries());

        let mut rules: Vec<String> = store.clauses().iter().map(|c| c.to_string()).collect();
        rules.sort();
        rules.dedup();

        let vars = collect_vars(store, &queries)?;

        let mut out = String::new();
        let _ = writeln!(out, "; droidchc fixedpoint problem");
        let _ = writeln!(out, "(set-option :fixedpoint.engine spacer)");
        for decl in &relations {
            let _ = writeln!(out, "{}", decl);
        }
        for (name, sort) in &vars {
            let _ = writeln!(out, "(declare-var {} {})", name, sort);
        }
        for rule in &rules {
            let _ = writeln!(out, "{}", rule);
        }

        for (k, group) in queries.iter().enumerate() {
            let name = format!("Q_{}", k);
            if self.verbose {
                for description in &group.descriptions {
                    let _ = writeln!(out, "; {}", description);
                }
            }
            let _ = writeln!(out, "{}", RelationDecl::new(name.clone(), vec![]));
            let _ = writeln!(out, "(rule (=> {} {}))", group.condition, name);
            let _ = writeln!(out, "(query {})", name);
        }

        Ok(out)
    }

    fn group_queries(&self, mut queries: Vec<Query>) -> Vec<QueryGroup> {
        queries.sort_by(|a, b| (&a.key, a.register).cmp(&(&b.key, b.register)));

        if !self.merge_queries {
            return queries
                .into_iter()
                .map(|q| QueryGroup {
                    condition: q.condition,
                    descriptions: vec![q.description],
                })
                .collect();
        }

        let mut merged: BTreeMap<QueryKey, Vec<Query>> = BTreeMap::new();
        for query in queries {
            merged.entry(query.key.clone()).or_default().push(query);
        }
        merged
            .into_values()
            .map(|group| QueryGroup {
                descriptions: group.iter().map(|q| q.description.clone()).collect(),
                condition: BoolExpr::any(group.into_iter().map(|q| q.condition)),
            })
            .collect()
    }
}

struct QueryGroup {
    condition: BoolExpr,
    descriptions: Vec<String>,
}

/// Free variables of all rules and queries, each with a single sort
fn collect_vars(store: &ClauseStore, queries: &[QueryGroup]) -> Result<BTreeMap<String, Sort>> {
    let mut vars: BTreeMap<String, Sort> = BTreeMap::new();
    let mut conflicts: BTreeSet<String> = BTreeSet::new();

    let mut record = |name: &str, sort: Sort| match vars.get(name) {
        Some(existing) if *existing != sort => {
            conflicts.insert(name.to_string());
        }
        Some(_) => {}
        None => {
            vars.insert(name.to_string(), sort);
        }
    };

    for clause in store.clauses() {
        for part in &clause.body {
            part.visit_vars(&mut record);
        }
        clause.head.visit_vars(&mut record);
    }
    for group in queries {
        group.condition.visit_vars(&mut record);
    }

    if let Some(name) = conflicts.into_iter().next() {
        return Err(DroidChcError::compile(format!(
            "variable {} is used with more than one sort",
            name
        )));
    }
    Ok(vars)
}
