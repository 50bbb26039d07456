//! Semantic checks on a loaded configuration.
//!
//! Syntax and type errors are already reported by the loader; this pass looks
//! at values that parse fine but cannot work at runtime.

use std::path::Path;

use crate::schema::TvLogoConfig;

/// Largest `search.display_limit` that does not trigger a warning.
const DISPLAY_LIMIT_SOFT_MAX: usize = 100;

/// Severity level for a diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Error,
    Warning,
    Info,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Error => write!(f, "error"),
            Self::Warning => write!(f, "warning"),
            Self::Info => write!(f, "info"),
        }
    }
}

/// A single validation diagnostic.
#[derive(Debug, Clone)]
pub struct Diagnostic {
    pub severity: Severity,
    /// "credentials", "webhook", "search", or "file-ref"
    pub category: &'static str,
    /// Dotted path, e.g. "telegram.webhook_path"
    pub path: String,
    pub message: String,
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} [{}] {}: {}",
            self.severity, self.category, self.path, self.message
        )
    }
}

#[derive(Debug, Clone, Default)]
pub struct ValidationResult {
    pub diagnostics: Vec<Diagnostic>,
}

impl ValidationResult {
    /// Returns `true` if any diagnostic is an error.
    #[must_use]
    pub fn has_errors(&self) -> bool {
        self.diagnostics
            .iter()
            .any(|d| d.severity == Severity::Error)
    }

    /// Count diagnostics by severity.
    #[must_use]
    pub fn count(&self, severity: Severity) -> usize {
        self.diagnostics
            .iter()
            .filter(|d| d.severity == severity)
            .count()
    }

    fn push(
        &mut self,
        severity: Severity,
        category: &'static str,
        path: &str,
        message: impl Into<String>,
    ) {
        self.diagnostics.push(Diagnostic {
            severity,
            category,
            path: path.into(),
            message: message.into(),
        });
    }
}

/// Validate `config`.
///
/// Credentials and the webhook URL are only required when `for_serve` is set;
/// offline commands work without them.
pub fn validate(config: &TvLogoConfig, for_serve: bool) -> ValidationResult {
    let mut result = ValidationResult::default();
    let telegram = &config.telegram;

    if for_serve {
        if !telegram.has_token() {
            result.push(
                Severity::Error,
                "credentials",
                "telegram.token",
                "bot token is empty (set it in the config or via BOT_TOKEN)",
            );
        }
        if telegram.webhook_url.trim().is_empty() {
            result.push(
                Severity::Error,
                "webhook",
                "telegram.webhook_url",
                "webhook URL is empty (set it in the config or via WEBHOOK_URL)",
            );
        }
    }

    let url = telegram.webhook_url.trim();
    if !url.is_empty() {
        match url::Url::parse(url) {
            Ok(parsed) if parsed.scheme() != "https" => result.push(
                Severity::Warning,
                "webhook",
                "telegram.webhook_url",
                format!("Telegram only delivers to https, got {}", parsed.scheme()),
            ),
            Ok(_) => {},
            Err(e) => result.push(
                Severity::Error,
                "webhook",
                "telegram.webhook_url",
                format!("not a valid URL: {e}"),
            ),
        }
    }

    if !telegram.webhook_path.starts_with('/') {
        result.push(
            Severity::Error,
            "webhook",
            "telegram.webhook_path",
            format!("must start with '/', got {:?}", telegram.webhook_path),
        );
    }

    match config.search.display_limit {
        0 => result.push(
            Severity::Error,
            "search",
            "search.display_limit",
            "must be at least 1",
        ),
        n if n > DISPLAY_LIMIT_SOFT_MAX => result.push(
            Severity::Warning,
            "search",
            "search.display_limit",
            format!("{n} buttons will not fit in one Telegram message"),
        ),
        _ => {},
    }

    check_files(config, &mut result);
    result
}

fn check_files(config: &TvLogoConfig, result: &mut ValidationResult) {
    let data = &config.data;
    if !data.catalog_path.is_file() {
        result.push(
            Severity::Error,
            "file-ref",
            "data.catalog_path",
            format!("catalog not found at {}", data.catalog_path.display()),
        );
    }
    if let Some(root) = &data.logo_root
        && !root.is_dir()
    {
        result.push(
            Severity::Warning,
            "file-ref",
            "data.logo_root",
            format!("{} is not a directory", root.display()),
        );
    }
    if !data.gallery_path.exists() {
        result.push(
            Severity::Info,
            "file-ref",
            "data.gallery_path",
            format!("{} will be created on first save", data.gallery_path.display()),
        );
    }
    if let Some(dir) = config.pdf.export_dir.as_deref()
        && is_existing_file(dir)
    {
        result.push(
            Severity::Error,
            "file-ref",
            "pdf.export_dir",
            format!("{} is a file, not a directory", dir.display()),
        );
    }
}

fn is_existing_file(path: &Path) -> bool {
    path.metadata().is_ok_and(|m| m.is_file())
}
