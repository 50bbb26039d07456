//! `tvlogo check`: validate the configuration and the catalog behind it.
//!
//! Prints a report with `[ok]`, `[warn]`, `[fail]` or `[info]` per item and
//! fails when any item failed.

use {
    anyhow::{Result, bail},
    tvlogo_catalog::Catalog,
    tvlogo_config::{Severity, TvLogoConfig, validate},
};

use crate::startup;

const GREEN: &str = "\x1b[32m";
const RED: &str = "\x1b[31m";
const YELLOW: &str = "\x1b[33m";
const CYAN: &str = "\x1b[36m";
const BOLD: &str = "\x1b[1m";
const RESET: &str = "\x1b[0m";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Status {
    Ok,
    Warn,
    Fail,
    Info,
}

impl Status {
    fn label(self) -> &'static str {
        match self {
            Self::Ok => "ok",
            Self::Warn => "warn",
            Self::Fail => "fail",
            Self::Info => "info",
        }
    }

    fn color(self) -> &'static str {
        match self {
            Self::Ok => GREEN,
            Self::Warn => YELLOW,
            Self::Fail => RED,
            Self::Info => CYAN,
        }
    }
}

impl From<Severity> for Status {
    fn from(severity: Severity) -> Self {
        match severity {
            Severity::Error => Self::Fail,
            Severity::Warning => Self::Warn,
            Severity::Info => Self::Info,
        }
    }
}

struct CheckItem {
    status: Status,
    message: String,
}

struct Section {
    title: String,
    items: Vec<CheckItem>,
}

impl Section {
    fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            items: Vec::new(),
        }
    }

    fn push(&mut self, status: Status, message: impl Into<String>) {
        self.items.push(CheckItem {
            status,
            message: message.into(),
        });
    }
}

fn print_report(sections: &[Section]) -> (usize, usize) {
    let mut errors = 0usize;
    let mut warnings = 0usize;

    for section in sections {
        eprintln!("{BOLD}{}{RESET}", section.title);
        for item in &section.items {
            let color = item.status.color();
            let label = item.status.label();
            eprintln!("  [{color}{label}{RESET}]  {}", item.message);
            match item.status {
                Status::Fail => errors += 1,
                Status::Warn => warnings += 1,
                _ => {},
            }
        }
        eprintln!();
    }

    (errors, warnings)
}

pub fn handle_check(config: &TvLogoConfig) -> Result<()> {
    let sections = vec![config_section(config), catalog_section(config)];
    let (errors, warnings) = print_report(&sections);

    if errors > 0 {
        bail!("{errors} check(s) failed, {warnings} warning(s)");
    }
    eprintln!("{GREEN}all checks passed{RESET} ({warnings} warning(s))");
    Ok(())
}

fn config_section(config: &TvLogoConfig) -> Section {
    let mut section = Section::new("Configuration");
    let result = validate(config, true);
    if result.diagnostics.is_empty() {
        section.push(Status::Ok, "no issues");
    }
    for diagnostic in &result.diagnostics {
        section.push(
            diagnostic.severity.into(),
            format!(
                "[{}] {}: {}",
                diagnostic.category, diagnostic.path, diagnostic.message
            ),
        );
    }
    section
}

fn catalog_section(config: &TvLogoConfig) -> Section {
    let mut section = Section::new("Catalog");
    match startup::load_catalog(&config.data) {
        Ok(catalog) => audit_catalog(&catalog, &mut section),
        Err(e) => section.push(Status::Fail, format!("{e:#}")),
    }
    section
}

fn audit_catalog(catalog: &Catalog, section: &mut Section) {
    section.push(Status::Ok, format!("{} channels", catalog.len()));

    let mut without_logo = Vec::new();
    let mut missing_file = Vec::new();
    for (key, _) in catalog.iter() {
        match catalog.logo_path(key) {
            Some(path) if path.is_file() => {},
            Some(_) => missing_file.push(key),
            None => without_logo.push(key),
        }
    }

    if !without_logo.is_empty() {
        section.push(
            Status::Info,
            format!(
                "{} channel(s) list no logo: {}",
                without_logo.len(),
                without_logo.join(", ")
            ),
        );
    }
    if missing_file.is_empty() {
        section.push(Status::Ok, "every listed logo file exists");
    } else {
        section.push(
            Status::Warn,
            format!(
                "{} logo file(s) not found: {}",
                missing_file.len(),
                missing_file.join(", ")
            ),
        );
    }
}
