//! Configuration loading, env substitution, env overrides and validation.
//!
//! Config files: `tvlogo.toml`, `tvlogo.yaml`, `tvlogo.yml`, or `tvlogo.json`,
//! searched in `./` then `~/.config/tvlogo/`.
//!
//! Supports `${ENV_VAR}` substitution in all string values.

pub mod env_subst;
pub mod loader;
pub mod schema;
pub mod validate;

pub use {
    loader::{apply_env_overrides, config_dir, discover_and_load, load_config},
    schema::{DataConfig, PdfConfig, SearchConfig, ServerConfig, TelegramConfig, TvLogoConfig},
    validate::{Diagnostic, Severity, ValidationResult, validate},
};
