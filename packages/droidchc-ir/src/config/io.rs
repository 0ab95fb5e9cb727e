//! Configuration I/O
//!
//! Defines the YAML schema types. Loading and export live on `AnalysisConfig`.

use serde::{Deserialize, Serialize};

/// YAML Schema v1
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigExportV1 {
    /// Schema version (always 1 for v1)
    #[serde(default)]
    pub version: Option<u32>,

    /// Base preset
    pub preset: String,

    /// Field overrides applied on top of the preset
    #[serde(skip_serializing_if = "Option::is_none")]
    pub overrides: Option<AnalysisOverrides>,
}

/// Partial `AnalysisConfig`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AnalysisOverrides {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bitvector_size: Option<u32>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub arrays: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub merge_queries: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub reach_filter: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub verbose_queries: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub intent_summaries: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub threads: Option<usize>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub sources: Option<Vec<String>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub sinks: Option<Vec<String>>,
}

impl AnalysisOverrides {
    pub const FIELDS: &'static [&'static str] = &[
        "bitvector_size",
        "arrays",
        "merge_queries",
        "reach_filter",
        "verbose_queries",
        "intent_summaries",
        "threads",
        "sources",
        "sinks",
    ];
}

#[cfg(test)]
mod tests {
    use crate::config::error::ConfigError;
    use crate::config::{AnalysisConfig, Preset};
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_yaml_roundtrip() {
        let config = AnalysisConfig::preset(Preset::Precise).bitvector_size(32);

        let yaml = config.to_yaml().unwrap();
        assert!(yaml.contains("version: 1"));
        assert!(yaml.contains("preset: precise"));
        assert!(yaml.contains("bitvector_size: 32"));

        let back = AnalysisConfig::from_yaml_str(&yaml).unwrap();
        assert_eq!(back, config);
    }

    #[test]
    fn test_yaml_loading() {
        let yaml_content = r#"
version: 1
preset: fast
overrides:
  bitvector_size: 32
  sinks:
    - "Landroid/util/Log;->i(Ljava/lang/String;Ljava/lang/String;)I"
"#;

        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(yaml_content.as_bytes()).unwrap();

        let config = AnalysisConfig::from_yaml(temp_file.path()).unwrap();
        assert_eq!(config.preset, Preset::Fast);
        assert_eq!(config.bitvector_size, 32);
        assert!(config.merge_queries);
        assert_eq!(config.sinks.len(), 1);
    }

    #[test]
    fn test_yaml_missing_version() {
        let result = AnalysisConfig::from_yaml_str("preset: fast\n");
        assert!(matches!(result, Err(ConfigError::MissingVersion)));
    }

    #[test]
    fn test_yaml_unsupported_version() {
        let result = AnalysisConfig::from_yaml_str("version: 2\npreset: fast\n");
        assert!(matches!(
            result,
            Err(ConfigError::UnsupportedVersion { found: 2, .. })
        ));
    }

    #[test]
    fn test_yaml_unknown_override() {
        let yaml = "version: 1\npreset: custom\noverrides:\n  bitvector_sise: 32\n";
        let err = AnalysisConfig::from_yaml_str(yaml).unwrap_err();
        assert!(err.to_string().contains("Did you mean 'bitvector_size'?"));
    }

    #[test]
    fn test_yaml_out_of_range_rejected() {
        let yaml = "version: 1\npreset: custom\noverrides:\n  bitvector_size: 256\n";
        assert!(matches!(
            AnalysisConfig::from_yaml_str(yaml),
            Err(ConfigError::Range { .. })
        ));
    }
}
