//! Test fixtures
//!
//! Small program models reused across the integration tests, with the ids
//! the compiler derives from their descriptors.

use super::builders::*;
use droidchc_ir::shared::models::{allocation_hash, java_hash, ProgramPoint};
use droidchc_ir::{AnalysisConfig, Compilation, Instruction, Orchestrator, Program};

pub const WIDTH: u32 = 32;

pub const MAIN: &str = "Lcom/example/MainActivity;";
pub const FOO: &str = "LFoo;";
pub const SINK_CLASS: &str = "Lcom/x/Sink;";
pub const LEAK: &str = "Lcom/x/Sink;->leak(Ljava/lang/Object;)V";
pub const BUNDLE_EMPTY: &str = "Landroid/os/Bundle;->EMPTY:Landroid/os/Bundle;";
pub const LOG_D: &str = "Landroid/util/Log;->d(Ljava/lang/String;Ljava/lang/String;)I";
pub const GET_DEVICE_ID: &str =
    "Landroid/telephony/TelephonyManager;->getDeviceId()Ljava/lang/String;";

/// Deterministic single-threaded configuration with 32-bit values
pub fn test_config() -> AnalysisConfig {
    AnalysisConfig::default().bitvector_size(WIDTH).threads(1)
}

pub fn compile(program: &Program, config: AnalysisConfig) -> Compilation {
    Orchestrator::new(config)
        .compile(program)
        .expect("compilation should succeed")
}

/// Point `pc` of `class->method`
pub fn point(class: &str, method: &str, pc: u32) -> ProgramPoint {
    ProgramPoint::new(java_hash(class), java_hash(method), pc)
}

/// Instance id of the `new-instance` at `class->method@pc`
pub fn site_id(class: &str, method: &str, pc: u32) -> i32 {
    allocation_hash(java_hash(class), java_hash(method), pc)
}

/// Entry class wrapping one static method `run()V`
pub fn single_method_program(method: MethodBuilder) -> Program {
    ProgramBuilder::new()
        .class(
            ClassBuilder::new(MAIN)
                .method(method.static_method().entry_point().build())
                .build(),
        )
        .build()
}

/// `run()V` over `num_registers` registers with the given body
pub fn run_method(num_registers: u32, body: Vec<Instruction>) -> MethodBuilder {
    body.into_iter()
        .fold(MethodBuilder::new("run()V", num_registers, 0), |m, i| m.with(i))
}

/// `const/4 v0, #0; new-instance v1, LFoo;; iput v0, v1, LFoo;->x:I; return-void`
pub fn field_store_program() -> Program {
    let run = run_method(
        2,
        vec![
            ins("const/4", &[0]).lit(0),
            ins("new-instance", &[1]).refer(FOO),
            ins("iput", &[0, 1]).refer("LFoo;->x:I"),
            ins("return-void", &[]),
        ],
    );
    ProgramBuilder::new()
        .class(ClassBuilder::new(FOO).field("x", "I").build())
        .class(
            ClassBuilder::new(MAIN)
                .method(run.static_method().entry_point().build())
                .build(),
        )
        .build()
}

/// `sget-object v0, Bundle.EMPTY; invoke-virtual {v0}, Sink.leak; return-void`
pub fn sink_leak_program() -> Program {
    let run = run_method(
        1,
        vec![
            ins("sget-object", &[0]).refer(BUNDLE_EMPTY),
            ins("invoke-virtual", &[0]).refer(LEAK),
            ins("return-void", &[]),
        ],
    );
    single_method_program(run)
}

/// Configuration with `Sink.leak` as the only sink
pub fn leak_config() -> AnalysisConfig {
    test_config().sinks([LEAK])
}
