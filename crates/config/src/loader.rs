use std::path::{Path, PathBuf};

use {
    secrecy::Secret,
    tracing::{debug, info, warn},
};

use crate::{env_subst::substitute_env, schema::TvLogoConfig};

/// Standard config file names, checked in order.
const CONFIG_FILENAMES: &[&str] = &["tvlogo.toml", "tvlogo.yaml", "tvlogo.yml", "tvlogo.json"];

const ENV_BOT_TOKEN: &str = "BOT_TOKEN";
const ENV_WEBHOOK_URL: &str = "WEBHOOK_URL";
const ENV_PORT: &str = "TVLOGO_PORT";

/// Load config from the given path (any supported format).
pub fn load_config(path: &Path) -> anyhow::Result<TvLogoConfig> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("failed to read {}: {e}", path.display()))?;
    let raw = substitute_env(&raw);
    parse_config(&raw, path)
        .map_err(|e| anyhow::anyhow!("failed to parse {}: {e}", path.display()))
}

/// Load the effective configuration.
///
/// An explicit path must exist and parse. Otherwise the standard locations
/// are searched:
/// 1. `./tvlogo.{toml,yaml,yml,json}`
/// 2. `~/.config/tvlogo/tvlogo.{toml,yaml,yml,json}`
///
/// A discovered file that fails to load is logged and defaults are used.
/// Environment overrides are applied last in every case.
pub fn discover_and_load(explicit: Option<&Path>) -> anyhow::Result<TvLogoConfig> {
    let mut config = match explicit {
        Some(path) => {
            let config = load_config(path)?;
            info!(path = %path.display(), "config loaded");
            config
        },
        None => match find_config_file() {
            Some(path) => match load_config(&path) {
                Ok(config) => {
                    info!(path = %path.display(), "config loaded");
                    config
                },
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "failed to load config, using defaults");
                    TvLogoConfig::default()
                },
            },
            None => {
                debug!("no config file found, using defaults");
                TvLogoConfig::default()
            },
        },
    };
    apply_env_overrides(&mut config);
    Ok(config)
}

/// Apply `BOT_TOKEN`, `WEBHOOK_URL` and `TVLOGO_PORT` on top of `config`.
pub fn apply_env_overrides(config: &mut TvLogoConfig) {
    apply_overrides_with(config, |name| std::env::var(name).ok());
}

fn apply_overrides_with(config: &mut TvLogoConfig, lookup: impl Fn(&str) -> Option<String>) {
    let set = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

    if let Some(token) = set(ENV_BOT_TOKEN) {
        debug!(var = ENV_BOT_TOKEN, "overriding telegram.token from env");
        config.telegram.token = Secret::new(token);
    }
    if let Some(url) = set(ENV_WEBHOOK_URL) {
        debug!(var = ENV_WEBHOOK_URL, "overriding telegram.webhook_url from env");
        config.telegram.webhook_url = url;
    }
    if let Some(port) = set(ENV_PORT) {
        match port.trim().parse::<u16>() {
            Ok(port) => config.server.port = port,
            Err(e) => warn!(var = ENV_PORT, value = %port, error = %e, "ignoring invalid port"),
        }
    }
}

fn find_config_file() -> Option<PathBuf> {
    CONFIG_FILENAMES
        .iter()
        .map(PathBuf::from)
        .find(|p| p.exists())
        .or_else(|| {
            let dir = config_dir()?;
            CONFIG_FILENAMES
                .iter()
                .map(|name| dir.join(name))
                .find(|p| p.exists())
        })
}

/// Returns the user-global config directory (`~/.config/tvlogo/`).
pub fn config_dir() -> Option<PathBuf> {
    directories::ProjectDirs::from("", "", "tvlogo").map(|d| d.config_dir().to_path_buf())
}

fn parse_config(raw: &str, path: &Path) -> anyhow::Result<TvLogoConfig> {
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("toml");

    match ext {
        "toml" => Ok(toml::from_str(raw)?),
        "yaml" | "yml" => Ok(serde_yaml::from_str(raw)?),
        "json" => Ok(serde_json::from_str(raw)?),
        _ => anyhow::bail!("unsupported config format: .{ext}"),
    }
}
