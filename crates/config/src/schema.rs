/// Config schema types (telegram, server, data, search, pdf).
use std::path::PathBuf;

use {
    secrecy::{ExposeSecret, Secret},
    serde::{Deserialize, Serialize},
};

/// Root configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TvLogoConfig {
    pub telegram: TelegramConfig,
    pub server: ServerConfig,
    pub data: DataConfig,
    pub search: SearchConfig,
    pub pdf: PdfConfig,
}

/// Bot credentials and webhook registration.
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TelegramConfig {
    /// Bot token from @BotFather.
    #[serde(serialize_with = "serialize_secret")]
    pub token: Secret<String>,

    /// Public base URL Telegram should deliver updates to (e.g. `https://bot.example.com`).
    pub webhook_url: String,

    /// Route the webhook is served on, appended to `webhook_url`.
    pub webhook_path: String,

    /// Value Telegram echoes back in `X-Telegram-Bot-Api-Secret-Token`.
    #[serde(
        serialize_with = "serialize_optional_secret",
        skip_serializing_if = "Option::is_none"
    )]
    pub webhook_secret: Option<Secret<String>>,
}

impl TelegramConfig {
    /// Full URL handed to `setWebhook`.
    pub fn webhook_endpoint(&self) -> String {
        format!(
            "{}{}",
            self.webhook_url.trim_end_matches('/'),
            self.webhook_path
        )
    }

    pub fn has_token(&self) -> bool {
        !self.token.expose_secret().trim().is_empty()
    }
}

impl Default for TelegramConfig {
    fn default() -> Self {
        Self {
            token: Secret::new(String::new()),
            webhook_url: String::new(),
            webhook_path: "/webhook".into(),
            webhook_secret: None,
        }
    }
}

impl std::fmt::Debug for TelegramConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TelegramConfig")
            .field("token", &"[REDACTED]")
            .field("webhook_url", &self.webhook_url)
            .field("webhook_path", &self.webhook_path)
            .field(
                "webhook_secret",
                &self.webhook_secret.as_ref().map(|_| "[REDACTED]"),
            )
            .finish()
    }
}

fn serialize_secret<S: serde::Serializer>(
    secret: &Secret<String>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(secret.expose_secret())
}

fn serialize_optional_secret<S: serde::Serializer>(
    secret: &Option<Secret<String>>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    match secret {
        Some(secret) => serializer.serialize_some(secret.expose_secret()),
        None => serializer.serialize_none(),
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0".into(),
            port: 8000,
        }
    }
}

/// Where the catalog, logos and galleries live on disk.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DataConfig {
    pub catalog_path: PathBuf,
    /// Root for relative logo paths; defaults to the catalog's directory.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub logo_root: Option<PathBuf>,
    pub gallery_path: PathBuf,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            catalog_path: PathBuf::from("channels.json"),
            logo_root: None,
            gallery_path: PathBuf::from("galleries.json"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Maximum number of `select` buttons offered for an ambiguous query.
    pub display_limit: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self { display_limit: 10 }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PdfConfig {
    /// When set, every rendered sheet is also written here as `gallery_<user>.pdf`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub export_dir: Option<PathBuf>,
}
