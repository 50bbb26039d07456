//! `tvlogo serve`: startup wiring and the webhook HTTP server.

use std::sync::Arc;

use {
    anyhow::bail,
    tracing::{error, info, warn},
    tvlogo_config::{Severity, TvLogoConfig, validate},
    tvlogo_gallery::SelectionMachine,
    tvlogo_telegram::{BotState, HandlerSettings, TelegramResponder, bot, webhook},
};

use crate::startup;

/// Listen address overrides from the command line.
#[derive(Debug, Default)]
pub struct ListenOverrides {
    pub bind: Option<String>,
    pub port: Option<u16>,
}

pub async fn run(config: TvLogoConfig, overrides: ListenOverrides) -> anyhow::Result<()> {
    let report = validate(&config, true);
    for diagnostic in &report.diagnostics {
        match diagnostic.severity {
            Severity::Error => error!(path = %diagnostic.path, "{}", diagnostic.message),
            Severity::Warning => warn!(path = %diagnostic.path, "{}", diagnostic.message),
            Severity::Info => info!(path = %diagnostic.path, "{}", diagnostic.message),
        }
    }
    if report.has_errors() {
        bail!(
            "configuration has {} error(s), run `tvlogo check` for details",
            report.count(Severity::Error)
        );
    }

    let catalog = Arc::new(startup::load_catalog(&config.data)?);
    let store = Arc::new(startup::open_gallery(&config.data).await);
    let bot = bot::start(&config.telegram).await?;

    let state = BotState {
        catalog,
        selection: Arc::new(SelectionMachine::new(store)),
        responder: Arc::new(TelegramResponder::new(bot)),
        settings: handler_settings(&config),
    };
    let app = webhook::router(
        state,
        &config.telegram.webhook_path,
        config.telegram.webhook_secret.clone(),
    );

    let (bind, port) = listen_address(&config, overrides);
    let listener = tokio::net::TcpListener::bind((bind.as_str(), port)).await?;
    info!(
        addr = %listener.local_addr()?,
        webhook_path = %config.telegram.webhook_path,
        "listening for telegram updates"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    info!("server stopped");
    Ok(())
}

fn handler_settings(config: &TvLogoConfig) -> HandlerSettings {
    HandlerSettings {
        display_limit: config.search.display_limit,
        export_dir: config.pdf.export_dir.clone(),
        ..HandlerSettings::default()
    }
}

fn listen_address(config: &TvLogoConfig, overrides: ListenOverrides) -> (String, u16) {
    (
        overrides
            .bind
            .unwrap_or_else(|| config.server.bind.clone()),
        overrides.port.unwrap_or(config.server.port),
    )
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "failed to listen for ctrl-c");
        std::future::pending::<()>().await;
    }
    info!("shutdown requested");
}
