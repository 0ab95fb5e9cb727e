//! Horn clauses and reachability queries

use crate::shared::models::{BoolExpr, ClassId, MethodId, RelationApp};
use std::fmt;

/// `body ⇒ head`; a clause with an empty body is a fact
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Clause {
    pub body: Vec<BoolExpr>,
    pub head: RelationApp,
}

impl Clause {
    pub fn fact(head: RelationApp) -> Self {
        Self {
            body: Vec::new(),
            head,
        }
    }

    pub fn rule(body: Vec<BoolExpr>, head: RelationApp) -> Self {
        Self { body, head }
    }

    /// Conjunction of the body, constants folded
    pub fn body_formula(&self) -> BoolExpr {
        BoolExpr::all(self.body.iter().cloned())
    }

    pub fn is_fact(&self) -> bool {
        self.body_formula().is_true()
    }

    /// Every relation application in body and head
    pub fn relation_apps(&self) -> Vec<&RelationApp> {
        let mut apps = Vec::new();
        for part in &self.body {
            collect_apps(part, &mut apps);
        }
        apps.push(&self.head);
        apps
    }

    /// Body atoms whose relation is `name`
    pub fn body_apps_named<'a>(&'a self, name: &str) -> Vec<&'a RelationApp> {
        let mut apps = Vec::new();
        for part in &self.body {
            collect_apps(part, &mut apps);
        }
        apps.retain(|app| app.name == name);
        apps
    }
}

pub(crate) fn collect_apps<'a>(expr: &'a BoolExpr, out: &mut Vec<&'a RelationApp>) {
    match expr {
        BoolExpr::App(app) => out.push(app),
        BoolExpr::Not(inner) => collect_apps(inner, out),
        BoolExpr::And(parts) | BoolExpr::Or(parts) => {
            for part in parts {
                collect_apps(part, out);
            }
        }
        BoolExpr::Const(_) | BoolExpr::Var(_) | BoolExpr::Cmp(..) => {}
    }
}

impl fmt::Display for Clause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let body = self.body_formula();
        if body.is_true() {
            write!(f, "(rule {})", self.head)
        } else {
            write!(f, "(rule (=> {} {}))", body, self.head)
        }
    }
}

/// Call site a query belongs to; queries sharing a key may be merged
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct QueryKey {
    pub class: ClassId,
    pub method: MethodId,
    pub pc: u32,
    pub sink: String,
}

/// "Can `condition` hold?" for one argument register of a sink call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Query {
    pub condition: BoolExpr,
    pub key: QueryKey,
    pub register: u32,
    pub description: String,
}
