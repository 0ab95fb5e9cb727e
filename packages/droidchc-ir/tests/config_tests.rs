//! Configuration loaded from YAML files and its effect on compilation

mod common;

use common::*;
use droidchc_ir::config::{ConfigError, MAX_BITVECTOR_SIZE, MIN_BITVECTOR_SIZE};
use droidchc_ir::{compile_to_smt2, AnalysisConfig, Preset};
use proptest::prelude::*;
use quickcheck_macros::quickcheck;
use std::io::Write;
use tempfile::NamedTempFile;

fn yaml_file(content: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file
}

#[test]
fn test_yaml_file_drives_compilation() {
    let file = yaml_file(&format!(
        r#"
version: 1
preset: fast
overrides:
  bitvector_size: 32
  threads: 2
  sinks:
    - "{}"
"#,
        LOG_D
    ));
    let config = AnalysisConfig::from_yaml(file.path()).unwrap();
    assert_eq!(config.preset, Preset::Fast);
    assert_eq!(config.bitvector_size, 32);
    assert_eq!(config.sinks, vec![LOG_D.to_string()]);

    let program = single_method_program(run_method(
        2,
        vec![
            ins("invoke-static", &[0, 1]).refer(LOG_D),
            ins("return-void", &[]),
        ],
    ));
    let smt2 = compile_to_smt2(&program, config).unwrap();

    // fast merges the two argument queries and drops descriptions
    assert_eq!(smt2.matches("(query ").count(), 1);
    assert!(!smt2.contains("; Test if register"));
    assert!(smt2.contains("(_ BitVec 32)"));
}

#[test]
fn test_exported_preset_loads_back() {
    let config = AnalysisConfig::preset(Preset::Precise)
        .bitvector_size(16)
        .sources([GET_DEVICE_ID]);
    let file = yaml_file(&config.to_yaml().unwrap());

    let loaded = AnalysisConfig::from_yaml(file.path()).unwrap();
    assert_eq!(loaded, config);
}

#[test]
fn test_yaml_errors() {
    let missing = AnalysisConfig::from_yaml_str("preset: fast\n").unwrap_err();
    assert!(matches!(missing, ConfigError::MissingVersion));

    let future = AnalysisConfig::from_yaml_str("version: 2\npreset: fast\n").unwrap_err();
    assert!(matches!(future, ConfigError::UnsupportedVersion { found: 2, .. }));

    let typo = AnalysisConfig::from_yaml_str("version: 1\npreset: fast\noverrides:\n  bitvector: 32\n")
        .unwrap_err();
    match typo {
        ConfigError::UnknownField { field, suggestion, .. } => {
            assert_eq!(field, "bitvector");
            assert!(suggestion.contains("bitvector_size"), "{}", suggestion);
        }
        other => panic!("unexpected error: {}", other),
    }

    let preset = AnalysisConfig::from_yaml_str("version: 1\npreset: thorough\n").unwrap_err();
    assert!(matches!(preset, ConfigError::UnknownPreset(_)));

    let range = AnalysisConfig::from_yaml_str("version: 1\npreset: custom\noverrides:\n  bitvector_size: 256\n")
        .unwrap_err();
    assert!(matches!(range, ConfigError::Range { .. }));
}

#[test]
fn test_missing_file_is_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = AnalysisConfig::from_yaml(dir.path().join("absent.yaml")).unwrap_err();
    assert!(matches!(err, ConfigError::Io(_)));
}

#[quickcheck]
fn qc_thread_counts_up_to_limit_validate(threads: u16) -> bool {
    let config = AnalysisConfig::default().threads(usize::from(threads));
    config.validate().is_ok() == (usize::from(threads) <= 1024)
}

proptest! {
    #[test]
    fn prop_bitvector_range(width in 0u32..300) {
        let valid = (MIN_BITVECTOR_SIZE..=MAX_BITVECTOR_SIZE).contains(&width);
        prop_assert_eq!(AnalysisConfig::default().bitvector_size(width).validate().is_ok(), valid);
    }
}
