use {
    secrecy::ExposeSecret,
    teloxide::{
        prelude::*,
        types::{AllowedUpdate, BotCommand},
    },
    tracing::{info, warn},
    tvlogo_config::TelegramConfig,
};

/// Slash commands advertised to Telegram clients.
pub fn bot_commands() -> Vec<BotCommand> {
    vec![
        BotCommand::new("start", "Start the bot"),
        BotCommand::new("gallery", "Show your gallery"),
        BotCommand::new("pdf", "Create the gallery PDF"),
        BotCommand::new("clear", "Empty your gallery"),
        BotCommand::new("help", "Show available commands"),
    ]
}

/// Connect the bot and point Telegram at our webhook.
///
/// Verifies the token with `getMe` and registers the webhook; both are fatal
/// on failure. Command registration only logs a warning.
pub async fn start(config: &TelegramConfig) -> anyhow::Result<Bot> {
    let bot = Bot::new(config.token.expose_secret());

    let me = bot.get_me().await?;
    let username = me.username.clone();

    let endpoint = config.webhook_endpoint();
    let url = url::Url::parse(&endpoint)
        .map_err(|e| anyhow::anyhow!("invalid webhook URL {endpoint}: {e}"))?;

    let mut request = bot
        .set_webhook(url)
        .allowed_updates(vec![AllowedUpdate::Message, AllowedUpdate::CallbackQuery]);
    if let Some(secret) = &config.webhook_secret {
        request = request.secret_token(secret.expose_secret().clone());
    }
    request.await?;

    if let Err(e) = bot.set_my_commands(bot_commands()).await {
        warn!("failed to register bot commands: {e}");
    }

    info!(
        username = ?username,
        webhook = %endpoint,
        secret = config.webhook_secret.is_some(),
        "telegram bot connected (webhook set)"
    );
    Ok(bot)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn commands_are_valid_for_telegram() {
        let commands = bot_commands();
        assert_eq!(commands.len(), 5);
        for c in &commands {
            assert!(!c.command.is_empty() && c.command.len() <= 32);
            assert!(
                c.command
                    .chars()
                    .all(|ch| ch.is_ascii_lowercase() || ch.is_ascii_digit() || ch == '_')
            );
            assert!(!c.description.is_empty());
        }
    }
}
