use std::{future::Future, path::Path, time::Duration};

use {
    async_trait::async_trait,
    teloxide::{
        ApiError, RequestError,
        prelude::*,
        types::{ChatId, InlineKeyboardButton, InlineKeyboardMarkup, InputFile, MessageId},
    },
    tracing::{debug, info, warn},
};

use crate::{
    callback::CallbackAction,
    error::{Error, Result},
};

const TELEGRAM_RETRY_AFTER_MAX_RETRIES: usize = 4;

/// One inline button: label plus encoded callback payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Button {
    pub text: String,
    pub data: String,
}

impl Button {
    /// Fails when the encoded payload exceeds Telegram's limit.
    pub fn new(text: impl Into<String>, action: &CallbackAction) -> Result<Self> {
        Ok(Self {
            text: text.into(),
            data: action.encode()?,
        })
    }
}

/// Rows of inline buttons. An empty keyboard means "no buttons".
pub type Keyboard = Vec<Vec<Button>>;

/// Everything the handlers need to say to a user.
#[async_trait]
pub trait Responder: Send + Sync {
    async fn send_text(&self, chat_id: i64, text: &str, keyboard: Keyboard) -> Result<()>;

    async fn send_photo(
        &self,
        chat_id: i64,
        photo: &Path,
        caption: &str,
        keyboard: Keyboard,
    ) -> Result<()>;

    async fn send_document(
        &self,
        chat_id: i64,
        bytes: Vec<u8>,
        filename: &str,
        caption: &str,
    ) -> Result<()>;

    /// Replace the caption (and buttons) of a media message.
    async fn edit_caption(
        &self,
        chat_id: i64,
        message_id: i32,
        caption: &str,
        keyboard: Keyboard,
    ) -> Result<()>;

    /// Replace the text (and buttons) of a text message.
    async fn edit_text(
        &self,
        chat_id: i64,
        message_id: i32,
        text: &str,
        keyboard: Keyboard,
    ) -> Result<()>;

    /// Stop the client's spinner, optionally showing a toast.
    async fn answer_callback(&self, callback_id: &str, text: Option<&str>) -> Result<()>;
}

/// [`Responder`] backed by the Bot API.
pub struct TelegramResponder {
    bot: Bot,
}

impl TelegramResponder {
    pub fn new(bot: Bot) -> Self {
        Self { bot }
    }
}

fn to_markup(keyboard: &Keyboard) -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(keyboard.iter().map(|row| {
        row.iter()
            .map(|b| InlineKeyboardButton::callback(b.text.clone(), b.data.clone()))
            .collect::<Vec<_>>()
    }))
}

#[async_trait]
impl Responder for TelegramResponder {
    async fn send_text(&self, chat_id: i64, text: &str, keyboard: Keyboard) -> Result<()> {
        let markup = (!keyboard.is_empty()).then(|| to_markup(&keyboard));
        run_with_retry(chat_id, "send message", || {
            let mut req = self.bot.send_message(ChatId(chat_id), text);
            if let Some(markup) = &markup {
                req = req.reply_markup(markup.clone());
            }
            async move { req.await }
        })
        .await?;
        debug!(chat_id, text_len = text.len(), "telegram text sent");
        Ok(())
    }

    async fn send_photo(
        &self,
        chat_id: i64,
        photo: &Path,
        caption: &str,
        keyboard: Keyboard,
    ) -> Result<()> {
        let markup = (!keyboard.is_empty()).then(|| to_markup(&keyboard));
        let input = InputFile::file(photo.to_path_buf());
        run_with_retry(chat_id, "send photo", || {
            let mut req = self
                .bot
                .send_photo(ChatId(chat_id), input.clone())
                .caption(caption);
            if let Some(markup) = &markup {
                req = req.reply_markup(markup.clone());
            }
            async move { req.await }
        })
        .await?;
        debug!(chat_id, photo = %photo.display(), "telegram photo sent");
        Ok(())
    }

    async fn send_document(
        &self,
        chat_id: i64,
        bytes: Vec<u8>,
        filename: &str,
        caption: &str,
    ) -> Result<()> {
        let size = bytes.len();
        let input = InputFile::memory(bytes).file_name(filename.to_string());
        run_with_retry(chat_id, "send document", || {
            let req = self
                .bot
                .send_document(ChatId(chat_id), input.clone())
                .caption(caption);
            async move { req.await }
        })
        .await?;
        info!(chat_id, filename, size, "telegram document sent");
        Ok(())
    }

    async fn edit_caption(
        &self,
        chat_id: i64,
        message_id: i32,
        caption: &str,
        keyboard: Keyboard,
    ) -> Result<()> {
        let markup = to_markup(&keyboard);
        let result = run_with_retry(chat_id, "edit caption", || {
            let req = self
                .bot
                .edit_message_caption(ChatId(chat_id), MessageId(message_id))
                .caption(caption)
                .reply_markup(markup.clone());
            async move { req.await }
        })
        .await;
        ignore_not_modified(result, chat_id)
    }

    async fn edit_text(
        &self,
        chat_id: i64,
        message_id: i32,
        text: &str,
        keyboard: Keyboard,
    ) -> Result<()> {
        let markup = to_markup(&keyboard);
        let result = run_with_retry(chat_id, "edit text", || {
            let req = self
                .bot
                .edit_message_text(ChatId(chat_id), MessageId(message_id), text)
                .reply_markup(markup.clone());
            async move { req.await }
        })
        .await;
        ignore_not_modified(result, chat_id)
    }

    async fn answer_callback(&self, callback_id: &str, text: Option<&str>) -> Result<()> {
        let mut req = self.bot.answer_callback_query(callback_id);
        if let Some(text) = text {
            req = req.text(text);
        }
        req.await?;
        Ok(())
    }
}

fn ignore_not_modified<T>(
    result: std::result::Result<T, RequestError>,
    chat_id: i64,
) -> Result<()> {
    match result {
        Ok(_) => Ok(()),
        Err(e) if is_message_not_modified_error(&e) => {
            debug!(chat_id, "telegram edit skipped: message not modified");
            Ok(())
        },
        Err(e) => Err(Error::from(e)),
    }
}

async fn run_with_retry<T, F, Fut>(
    chat_id: i64,
    operation: &'static str,
    mut request: F,
) -> std::result::Result<T, RequestError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = std::result::Result<T, RequestError>>,
{
    let mut retries = 0usize;

    loop {
        match request().await {
            Ok(value) => return Ok(value),
            Err(err) => {
                let Some(wait) = retry_after_duration(&err) else {
                    return Err(err);
                };

                if retries >= TELEGRAM_RETRY_AFTER_MAX_RETRIES {
                    warn!(
                        chat_id,
                        operation,
                        retries,
                        retry_after_secs = wait.as_secs(),
                        "telegram rate limit persisted after retries"
                    );
                    return Err(err);
                }

                retries += 1;
                warn!(
                    chat_id,
                    operation,
                    retries,
                    max_retries = TELEGRAM_RETRY_AFTER_MAX_RETRIES,
                    retry_after_secs = wait.as_secs(),
                    "telegram rate limited, waiting before retry"
                );
                tokio::time::sleep(wait).await;
            },
        }
    }
}

fn retry_after_duration(error: &RequestError) -> Option<Duration> {
    match error {
        RequestError::RetryAfter(wait) => Some(wait.duration()),
        _ => None,
    }
}

fn is_message_not_modified_error(error: &RequestError) -> bool {
    matches!(error, RequestError::Api(ApiError::MessageNotModified))
}
