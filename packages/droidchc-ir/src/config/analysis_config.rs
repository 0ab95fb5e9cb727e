//! Analysis configuration
//!
//! One flat struct drives the whole compiler: bit-vector width, the array and
//! reachability encodings, query shaping, library summaries, the worker pool and
//! the source/sink signature lists.

use super::error::{ConfigError, ConfigResult};
use super::io::{AnalysisOverrides, ConfigExportV1};
use super::preset::Preset;
use crate::features::call_linkage::infrastructure::source_sink::{
    parse_signature, DEFAULT_SINKS, DEFAULT_SOURCES,
};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Smallest bit-vector width accepted.
pub const MIN_BITVECTOR_SIZE: u32 = 8;
/// Largest bit-vector width accepted.
pub const MAX_BITVECTOR_SIZE: u32 = 128;
/// Upper bound on explicitly configured worker threads.
pub const MAX_THREADS: usize = 1024;

/// Configuration for one compilation run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Preset this configuration was derived from
    #[serde(skip)]
    pub preset: Preset,

    /// Width of every value bit-vector (8..=128)
    pub bitvector_size: u32,

    /// Index-sensitive arrays (otherwise every element is field 0)
    pub arrays: bool,

    /// OR-merge queries that share (class, method, pc, sink)
    pub merge_queries: bool,

    /// Emit the ReachLH / CFilter auxiliary relations
    pub reach_filter: bool,

    /// Keep query descriptions as comments in the exported file
    pub verbose_queries: bool,

    /// Use the Intent and framework library summaries for unresolved calls
    pub intent_summaries: bool,

    /// Worker threads (0 = 75% of available cores)
    pub threads: usize,

    /// Source methods, `Lcls;->name(params)ret`
    pub sources: Vec<String>,

    /// Sink methods, `Lcls;->name(params)ret`
    pub sinks: Vec<String>,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            preset: Preset::Custom,
            bitvector_size: 64,
            arrays: false,
            merge_queries: false,
            reach_filter: false,
            verbose_queries: true,
            intent_summaries: true,
            threads: 0,
            sources: DEFAULT_SOURCES.iter().map(|s| s.to_string()).collect(),
            sinks: DEFAULT_SINKS.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl AnalysisConfig {
    /// Start from a preset
    pub fn preset(preset: Preset) -> Self {
        let base = Self {
            preset,
            ..Self::default()
        };
        match preset {
            Preset::Fast => base.arrays(false).merge_queries(true).verbose_queries(false),
            Preset::Precise => base.arrays(true).reach_filter(true).merge_queries(false),
            Preset::Custom => base,
        }
    }

    pub fn bitvector_size(mut self, width: u32) -> Self {
        self.bitvector_size = width;
        self
    }

    pub fn arrays(mut self, enabled: bool) -> Self {
        self.arrays = enabled;
        self
    }

    pub fn merge_queries(mut self, enabled: bool) -> Self {
        self.merge_queries = enabled;
        self
    }

    pub fn reach_filter(mut self, enabled: bool) -> Self {
        self.reach_filter = enabled;
        self
    }

    pub fn verbose_queries(mut self, enabled: bool) -> Self {
        self.verbose_queries = enabled;
        self
    }

    pub fn intent_summaries(mut self, enabled: bool) -> Self {
        self.intent_summaries = enabled;
        self
    }

    pub fn threads(mut self, threads: usize) -> Self {
        self.threads = threads;
        self
    }

    /// Replace the source list
    pub fn sources<I, S>(mut self, sources: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.sources = sources.into_iter().map(Into::into).collect();
        self
    }

    /// Replace the sink list
    pub fn sinks<I, S>(mut self, sinks: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.sinks = sinks.into_iter().map(Into::into).collect();
        self
    }

    /// Validate configuration
    pub fn validate(&self) -> ConfigResult<()> {
        if !(MIN_BITVECTOR_SIZE..=MAX_BITVECTOR_SIZE).contains(&self.bitvector_size) {
            return Err(ConfigError::range_with_hint(
                "bitvector_size",
                self.bitvector_size,
                MIN_BITVECTOR_SIZE,
                MAX_BITVECTOR_SIZE,
                "Use 32 for int-only apps or 64 to model long/double registers",
            ));
        }

        if self.threads > MAX_THREADS {
            return Err(ConfigError::range_with_hint(
                "threads",
                self.threads,
                0,
                MAX_THREADS,
                "Use 0 to size the pool from the available cores",
            ));
        }

        for signature in self.sources.iter().chain(self.sinks.iter()) {
            parse_signature(signature).map_err(|e| ConfigError::Validation(e.to_string()))?;
        }

        Ok(())
    }

    /// Threads the compiler pool should use
    pub fn effective_threads(&self) -> usize {
        if self.threads > 0 {
            self.threads
        } else {
            (num_cpus::get() * 3 / 4).max(1)
        }
    }

    // ═══════════════════════════════════════════════════════════════
    // YAML I/O
    // ═══════════════════════════════════════════════════════════════

    /// Load from a YAML v1 file
    pub fn from_yaml(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&content)
    }

    /// Load from YAML v1 text
    pub fn from_yaml_str(content: &str) -> ConfigResult<Self> {
        let raw: serde_yaml::Value = serde_yaml::from_str(content)?;
        check_override_keys(&raw)?;

        let export: ConfigExportV1 = serde_yaml::from_value(raw)?;
        let version = export.version.ok_or(ConfigError::MissingVersion)?;
        if version != 1 {
            return Err(ConfigError::UnsupportedVersion {
                found: version,
                supported: vec![1],
            });
        }

        let preset = Preset::parse(&export.preset)?;
        let mut config = Self::preset(preset);
        if let Some(overrides) = export.overrides {
            config.apply(overrides);
        }

        config.validate()?;
        Ok(config)
    }

    /// Export as YAML v1 (preset plus every field as an override)
    pub fn to_yaml(&self) -> ConfigResult<String> {
        let export = ConfigExportV1 {
            version: Some(1),
            preset: self.preset.to_string(),
            overrides: Some(AnalysisOverrides {
                bitvector_size: Some(self.bitvector_size),
                arrays: Some(self.arrays),
                merge_queries: Some(self.merge_queries),
                reach_filter: Some(self.reach_filter),
                verbose_queries: Some(self.verbose_queries),
                intent_summaries: Some(self.intent_summaries),
                threads: Some(self.threads),
                sources: Some(self.sources.clone()),
                sinks: Some(self.sinks.clone()),
            }),
        };

        Ok(serde_yaml::to_string(&export)?)
    }

    fn apply(&mut self, overrides: AnalysisOverrides) {
        let AnalysisOverrides {
            bitvector_size,
            arrays,
            merge_queries,
            reach_filter,
            verbose_queries,
            intent_summaries,
            threads,
            sources,
            sinks,
        } = overrides;

        if let Some(v) = bitvector_size {
            self.bitvector_size = v;
        }
        if let Some(v) = arrays {
            self.arrays = v;
        }
        if let Some(v) = merge_queries {
            self.merge_queries = v;
        }
        if let Some(v) = reach_filter {
            self.reach_filter = v;
        }
        if let Some(v) = verbose_queries {
            self.verbose_queries = v;
        }
        if let Some(v) = intent_summaries {
            self.intent_summaries = v;
        }
        if let Some(v) = threads {
            self.threads = v;
        }
        if let Some(v) = sources {
            self.sources = v;
        }
        if let Some(v) = sinks {
            self.sinks = v;
        }
    }
}

/// Report unknown override keys with a suggestion before serde rejects them.
fn check_override_keys(raw: &serde_yaml::Value) -> ConfigResult<()> {
    let Some(overrides) = raw.get("overrides").and_then(|v| v.as_mapping()) else {
        return Ok(());
    };

    let valid: Vec<String> = AnalysisOverrides::FIELDS.iter().map(|s| s.to_string()).collect();
    for key in overrides.keys() {
        let key = key.as_str().unwrap_or_default();
        if !AnalysisOverrides::FIELDS.contains(&key) {
            return Err(ConfigError::unknown_field_with_suggestion(
                key,
                "overrides",
                valid,
            ));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = AnalysisConfig::default();
        assert_eq!(config.bitvector_size, 64);
        assert!(!config.arrays);
        assert!(!config.merge_queries);
        assert!(config.intent_summaries);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_presets() {
        let fast = AnalysisConfig::preset(Preset::Fast);
        assert!(fast.merge_queries);
        assert!(!fast.arrays);

        let precise = AnalysisConfig::preset(Preset::Precise);
        assert!(precise.arrays);
        assert!(precise.reach_filter);
        assert!(!precise.merge_queries);
    }

    #[test]
    fn test_bitvector_range() {
        let err = AnalysisConfig::default().bitvector_size(4).validate().unwrap_err();
        assert!(matches!(err, ConfigError::Range { .. }));
        assert!(AnalysisConfig::default().bitvector_size(129).validate().is_err());
        assert!(AnalysisConfig::default().bitvector_size(32).validate().is_ok());
    }

    #[test]
    fn test_malformed_sink_rejected() {
        let err = AnalysisConfig::default()
            .sinks(["Landroid/util/Log;->d"])
            .validate()
            .unwrap_err();
        assert!(matches!(err, ConfigError::Validation(_)));
    }

    #[test]
    fn test_effective_threads() {
        assert_eq!(AnalysisConfig::default().threads(3).effective_threads(), 3);
        assert!(AnalysisConfig::default().effective_threads() >= 1);
    }
}
