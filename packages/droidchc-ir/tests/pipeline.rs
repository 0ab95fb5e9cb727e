//! End-to-end orchestration: global facts, reporting, error policy, export

mod common;

use common::*;
use droidchc_ir::features::dalvik::domain::field_id;
use droidchc_ir::features::symbolic_state::domain::vars;
use droidchc_ir::shared::models::{
    allocation_hash, java_hash, BoolExpr, BvExpr, ClassId, FieldId, FrameShape, InstanceId, IntExpr,
    MethodId, Term,
};
use droidchc_ir::{
    compile_to_smt2, ClauseStore, DispatchOracle, Orchestrator, Program, ProgramOracle, SourceSinkTable,
};
use droidchc_ir::features::call_linkage::{Definition, Implementation};
use pretty_assertions::assert_eq;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicI32, Ordering};

#[test]
fn test_report_matches_store() {
    let compilation = compile(&field_store_program(), test_config());
    let report = &compilation.report;

    assert_eq!(report.methods_compiled, 1);
    assert_eq!(report.methods_skipped, 0);
    assert_eq!(report.clauses, compilation.store.clauses().len());
    assert_eq!(report.queries, compilation.store.queries().len());
    assert_eq!(report.relations, compilation.store.relations().len());
}

#[test]
fn test_entry_fact_binds_this_and_parameters() {
    let on_create = MethodBuilder::new("onCreate(Landroid/os/Bundle;)V", 3, 2)
        .entry_point()
        .with(ins("return-void", &[]))
        .build();
    let helper = MethodBuilder::new("helper()V", 1, 0)
        .with(ins("return-void", &[]))
        .build();
    let program = ProgramBuilder::new()
        .class(ClassBuilder::new(MAIN).method(on_create).method(helper).build())
        .build();
    let compilation = compile(&program, test_config());
    let clauses = compilation.store.clauses();

    let entry = point(MAIN, "onCreate(Landroid/os/Bundle;)V", 0).relation_name();
    let facts: Vec<_> = clauses
        .iter()
        .filter(|c| c.is_fact() && c.head.name == entry)
        .collect();
    assert_eq!(facts.len(), 1);

    let shape = FrameShape::new(3, 2);
    let this = register(&facts[0].head, shape, 1);
    let instance = allocation_hash(java_hash(MAIN), 0, 0);
    assert_eq!(this.value, &BvExpr::lit(i64::from(instance), WIDTH));
    assert_eq!(this.global, &BoolExpr::tt());
    assert_eq!(this.local, &BoolExpr::ff());

    let bundle = register(&facts[0].head, shape, 2);
    assert_eq!(bundle.value, &BvExpr::var(vars::value(2), WIDTH));
    assert_eq!(bundle.high, &BoolExpr::ff());
    assert_eq!(bundle.global, &BoolExpr::var(vars::global(2)));

    // argument copies start equal to the parameters
    assert_eq!(register(&facts[0].head, shape, shape.argument_copy(1)).value, bundle.value);
    assert_eq!(register(&facts[0].head, shape, 0).value, &BvExpr::zero(WIDTH));

    let helper_entry = point(MAIN, "helper()V", 0).relation_name();
    assert!(!clauses.iter().any(|c| c.is_fact() && c.head.name == helper_entry));
}

#[test]
fn test_static_initial_values_become_facts() {
    let program = ProgramBuilder::new()
        .class(
            ClassBuilder::new(MAIN)
                .static_field("count", "I", Some(5))
                .static_field("name", "Ljava/lang/String;", None)
                .build(),
        )
        .build();
    let compilation = compile(&program, test_config());
    let facts: Vec<_> = compilation
        .store
        .clauses()
        .into_iter()
        .filter(|c| c.head.name == "S")
        .collect();

    assert_eq!(facts.len(), 1);
    assert!(facts[0].is_fact());
    assert_eq!(
        facts[0].head.args,
        vec![
            Term::Int(IntExpr::Lit(i64::from(java_hash(MAIN)))),
            Term::Int(IntExpr::Lit(i64::from(field_id("count", "I")))),
            Term::Bv(BvExpr::lit(5, WIDTH)),
            Term::Bool(BoolExpr::ff()),
            Term::Bool(BoolExpr::ff()),
        ]
    );
}

#[test]
fn test_malformed_method_is_skipped() {
    let broken = MethodBuilder::new("broken(II)V", 1, 3)
        .static_method()
        .with(ins("return-void", &[]))
        .build();
    let mut program = field_store_program();
    program.classes[1].methods.push(broken);

    let compilation = compile(&program, test_config());
    assert_eq!(compilation.report.methods_compiled, 1);
    assert_eq!(compilation.report.methods_skipped, 1);
}

#[test]
fn test_bad_operand_falls_back_to_identity() {
    // `move` without a source register
    let program = single_method_program(run_method(
        2,
        vec![ins("move", &[0]), ins("return-void", &[])],
    ));
    let compilation = compile(&program, test_config());
    assert_all_compiled(&compilation.report);

    let clauses = compilation.store.clauses();
    let run = |pc| point(MAIN, "run()V", pc);
    let clause = single_transition(&clauses, run(0), run(1));
    assert_eq!(clause.body_apps_named(&run(0).relation_name())[0].args, clause.head.args);
}

/// Oracle handing out a different id on every allocation query
struct DriftingOracle {
    inner: ProgramOracle,
    next: AtomicI32,
}

impl DispatchOracle for DriftingOracle {
    fn resolve_virtual(&self, class: ClassId, method: MethodId) -> Option<Vec<Implementation>> {
        self.inner.resolve_virtual(class, method)
    }

    fn resolve_static(&self, class: ClassId, method: MethodId) -> Option<Vec<Definition>> {
        self.inner.resolve_static(class, method)
    }

    fn allocation_id(&self, _class: ClassId, _method: MethodId, _pc: u32) -> InstanceId {
        self.next.fetch_add(1, Ordering::SeqCst)
    }

    fn field_layout(&self, type_name: &str, instance: InstanceId) -> Option<BTreeMap<FieldId, bool>> {
        self.inner.field_layout(type_name, instance)
    }

    fn is_source(&self, class: ClassId, method: MethodId) -> bool {
        self.inner.is_source(class, method)
    }

    fn is_sink(&self, class: ClassId, method: MethodId) -> bool {
        self.inner.is_sink(class, method)
    }

    fn has_static_initializer(&self, class: ClassId) -> bool {
        self.inner.has_static_initializer(class)
    }

    fn method_shape(&self, class: ClassId, method: MethodId) -> Option<FrameShape> {
        self.inner.method_shape(class, method)
    }
}

#[test]
fn test_inconsistent_allocation_aborts_compilation() {
    let program = field_store_program();
    let oracle = DriftingOracle {
        inner: ProgramOracle::new(&program, SourceSinkTable::defaults().unwrap()),
        next: AtomicI32::new(1),
    };
    let store = ClauseStore::new();

    let err = Orchestrator::new(test_config())
        .compile_with(&program, &oracle, &store)
        .unwrap_err();
    assert!(err.is_fatal(), "unexpected error: {}", err);
}

#[test]
fn test_invalid_configuration_is_rejected() {
    let err = Orchestrator::new(test_config().bitvector_size(4))
        .compile(&field_store_program())
        .unwrap_err();
    assert!(err.to_string().contains("bitvector_size"), "{}", err);

    let err = Orchestrator::new(test_config().sinks(["not a signature"]))
        .compile(&field_store_program())
        .unwrap_err();
    assert!(!err.is_fatal());
}

#[test]
fn test_export_is_independent_of_thread_count() {
    let program = field_store_program();
    let sequential = compile_to_smt2(&program, test_config().threads(1)).unwrap();
    let parallel = compile_to_smt2(&program, test_config().threads(4)).unwrap();
    assert_eq!(sequential, parallel);

    assert!(sequential.contains("(declare-rel R_"));
    assert!(sequential.contains("(declare-rel H "));
    assert!(sequential.contains("(rule "));
}

fn log_twice_program() -> Program {
    single_method_program(run_method(
        2,
        vec![
            ins("invoke-static", &[0, 1]).refer(LOG_D),
            ins("move-result", &[0]),
            ins("return-void", &[]),
        ],
    ))
}

#[test]
fn test_merged_queries_share_one_relation() {
    let program = log_twice_program();

    let separate = compile_to_smt2(&program, test_config()).unwrap();
    assert_eq!(separate.matches("(query ").count(), 2);
    assert!(separate.contains("; Test if register 0 leaks @line 0"));

    let merged = compile_to_smt2(&program, test_config().merge_queries(true)).unwrap();
    assert_eq!(merged.matches("(query ").count(), 1);

    let quiet = compile_to_smt2(&program, test_config().verbose_queries(false)).unwrap();
    assert!(!quiet.contains("; Test if register"));
}

#[test]
fn test_program_model_loads_from_json_file() {
    let program = field_store_program();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("app.json");
    std::fs::write(&path, serde_json::to_string_pretty(&program).unwrap()).unwrap();

    let loaded = Program::from_path(&path).unwrap();
    assert_eq!(loaded, program);
    assert_eq!(
        compile_to_smt2(&loaded, test_config()).unwrap(),
        compile_to_smt2(&program, test_config()).unwrap()
    );
}

#[test]
fn test_program_model_rejects_malformed_json() {
    let err = Program::from_json_str("{\"classes\": [{\"name\": 3}]}").unwrap_err();
    assert!(!err.is_fatal());
}
