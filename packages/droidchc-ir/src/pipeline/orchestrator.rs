//! Compilation orchestrator
//!
//! Pre-pass (local-heap layout), program-wide facts, then every method on the
//! rayon pool. Each worker compiles one method into an `Emission` and flushes
//! it to the clause sink, so the only synchronization is inside the sink and
//! the dispatch cache.

use crate::config::AnalysisConfig;
use crate::errors::{DroidChcError, Result};
use crate::features::call_linkage::infrastructure::{DispatchCache, ProgramOracle, SourceSinkTable};
use crate::features::call_linkage::ports::DispatchOracle;
use crate::features::chc::domain::clause::collect_apps;
use crate::features::chc::infrastructure::{ClauseStore, SmtLibExporter};
use crate::features::chc::ports::ClauseSink;
use crate::features::compiler::domain::{CompileEnv, Emission};
use crate::features::compiler::MethodCompiler;
use crate::features::dalvik::domain::{Class, Method, Program};
use crate::features::heap_model::application::LayoutBuilder;
use crate::pipeline::entry_points::GlobalFacts;
use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::{info, warn};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Counts of one compilation run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompilationReport {
    pub methods_compiled: usize,
    pub methods_skipped: usize,
    pub clauses: usize,
    pub queries: usize,
    /// Distinct relation names used by the emitted clauses and queries
    pub relations: usize,
}

/// Result of `Orchestrator::compile`: the clause store and its report
#[derive(Debug)]
pub struct Compilation {
    pub store: ClauseStore,
    pub report: CompilationReport,
}

impl Compilation {
    /// SMT-LIB2 fixedpoint text, honoring the query options of `config`
    pub fn to_smt2(&self, config: &AnalysisConfig) -> Result<String> {
        SmtLibExporter::new()
            .merge_queries(config.merge_queries)
            .verbose(config.verbose_queries)
            .to_smt2(&self.store)
    }
}

/// Per-method outcome merged into the report
#[derive(Default)]
struct Tally {
    compiled: usize,
    skipped: usize,
    clauses: usize,
    queries: usize,
    relations: FxHashSet<String>,
}

impl Tally {
    fn record(&mut self, emission: &Emission) {
        for clause in &emission.clauses {
            for app in clause.relation_apps() {
                self.relations.insert(app.name.clone());
            }
        }
        for query in &emission.queries {
            let mut apps = Vec::new();
            collect_apps(&query.condition, &mut apps);
            for app in apps {
                self.relations.insert(app.name.clone());
            }
        }
        self.clauses += emission.clauses.len();
        self.queries += emission.queries.len();
    }

    fn merge(mut self, other: Tally) -> Tally {
        self.compiled += other.compiled;
        self.skipped += other.skipped;
        self.clauses += other.clauses;
        self.queries += other.queries;
        self.relations.extend(other.relations);
        self
    }

    fn report(self) -> CompilationReport {
        CompilationReport {
            methods_compiled: self.compiled,
            methods_skipped: self.skipped,
            clauses: self.clauses,
            queries: self.queries,
            relations: self.relations.len(),
        }
    }
}

pub struct Orchestrator {
    config: AnalysisConfig,
}

impl Orchestrator {
    pub fn new(config: AnalysisConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    /// Compile `program` against its own dispatch oracle into a fresh store
    pub fn compile(&self, program: &Program) -> Result<Compilation> {
        self.config.validate()?;
        let table = SourceSinkTable::new(&self.config.sources, &self.config.sinks)?;
        let oracle = DispatchCache::new(ProgramOracle::new(program, table));
        let store = ClauseStore::new();
        let report = self.compile_with(program, &oracle, &store)?;
        Ok(Compilation { store, report })
    }

    /// Compile `program` with an external oracle into an external sink
    pub fn compile_with(
        &self,
        program: &Program,
        oracle: &dyn DispatchOracle,
        sink: &dyn ClauseSink,
    ) -> Result<CompilationReport> {
        self.config.validate()?;
        let start = Instant::now();

        let layout = LayoutBuilder::new(oracle).build(program);
        let env = CompileEnv::new(&self.config, oracle, &layout);

        let mut tally = Tally::default();
        let global = Emission {
            clauses: GlobalFacts::new(&self.config, oracle, &layout).clauses(program)?,
            ..Emission::default()
        };
        tally.record(&global);
        sink.add_clauses(global.clauses)?;

        let jobs: Vec<(&Class, &Method)> = program
            .classes
            .iter()
            .flat_map(|class| class.methods.iter().map(move |method| (class, method)))
            .collect();

        let methods = self.run_jobs(&env, &jobs, sink)?;
        let report = tally.merge(methods).report();

        info!(
            methods = report.methods_compiled,
            skipped = report.methods_skipped,
            clauses = report.clauses,
            queries = report.queries,
            relations = report.relations,
            local_heap = layout.size(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "compilation finished"
        );
        Ok(report)
    }

    #[cfg(feature = "parallel")]
    fn run_jobs(
        &self,
        env: &CompileEnv<'_>,
        jobs: &[(&Class, &Method)],
        sink: &dyn ClauseSink,
    ) -> Result<Tally> {
        let threads = self.config.effective_threads();
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .build()
            .map_err(|e| DroidChcError::compile(format!("failed to build thread pool: {}", e)))?;
        info!(threads, methods = jobs.len(), "compiling methods");

        pool.install(|| {
            jobs.par_iter()
                .map(|(class, method)| compile_job(env, class, method, sink))
                .try_reduce(Tally::default, |a, b| Ok(a.merge(b)))
        })
    }

    #[cfg(not(feature = "parallel"))]
    fn run_jobs(
        &self,
        env: &CompileEnv<'_>,
        jobs: &[(&Class, &Method)],
        sink: &dyn ClauseSink,
    ) -> Result<Tally> {
        info!(methods = jobs.len(), "compiling methods");
        jobs.iter().try_fold(Tally::default(), |tally, (class, method)| {
            Ok(tally.merge(compile_job(env, class, method, sink)?))
        })
    }
}

/// Compile and flush one method; non-fatal errors skip the method
fn compile_job(
    env: &CompileEnv<'_>,
    class: &Class,
    method: &Method,
    sink: &dyn ClauseSink,
) -> Result<Tally> {
    let mut tally = Tally::default();
    let outcome = MethodCompiler::new(env)
        .compile(class, method)
        .and_then(|emission| {
            tally.record(&emission);
            emission.flush(sink, class.id(), method.id())
        });

    match outcome {
        Ok(()) => tally.compiled = 1,
        Err(err) if err.is_fatal() => return Err(err),
        Err(err) => {
            warn!(class = %class.name, method = %method.name, error = %err, "method skipped");
            tally = Tally {
                skipped: 1,
                ..Tally::default()
            };
        }
    }
    Ok(tally)
}
