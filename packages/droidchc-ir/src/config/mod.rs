//! Analysis configuration
//!
//! Two tiers:
//! - Preset: `fast`, `precise`, or `custom`
//! - YAML v1 / builder overrides on top of the preset
//!
//! # Examples
//!
//! ```rust,ignore
//! use droidchc_ir::config::{AnalysisConfig, Preset};
//!
//! let config = AnalysisConfig::preset(Preset::Precise).bitvector_size(32);
//! config.validate()?;
//!
//! let config = AnalysisConfig::from_yaml("droidchc.yaml")?;
//! ```

pub mod analysis_config;
pub mod error;
pub mod io;
pub mod preset;

// Re-exports
pub use analysis_config::{AnalysisConfig, MAX_BITVECTOR_SIZE, MIN_BITVECTOR_SIZE};
pub use error::{ConfigError, ConfigResult};
pub use io::{AnalysisOverrides, ConfigExportV1};
pub use preset::Preset;
