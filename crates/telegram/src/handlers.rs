//! Update handling: channel search, bot commands and inline-button callbacks.

use std::path::{Path, PathBuf};

use {
    teloxide::types::{MaybeInaccessibleMessage, Update, UpdateKind},
    tracing::{debug, error, info, warn},
    tvlogo_gallery::{GALLERY_CAPACITY, SelectionCommand, SelectionOutcome, UserId},
};

use crate::{
    callback::CallbackAction,
    error::{Error, Result},
    outbound::{Button, Keyboard},
    state::BotState,
};

const GALLERY_PDF_NAME: &str = "gallery.pdf";

const HELP_TEXT: &str = "Send me the name of a TV channel and I will find its logo.\n\
Add up to 10 logos to your gallery and get them back as a single PDF sheet.\n\n\
/gallery - show your gallery\n\
/pdf - create the PDF\n\
/clear - empty your gallery\n\
/help - show this message";
const UNKNOWN_COMMAND_TEXT: &str = "Unknown command. Send /help to see what I can do.";
const EMPTY_GALLERY_TEXT: &str =
    "Your gallery is empty. Search for a channel and tap \"Add to gallery\".";
const ALREADY_EMPTY_TEXT: &str = "Your gallery is already empty.";
const PDF_FAILED_TEXT: &str = "Sorry, the PDF could not be created. Please try again later.";
const NOT_FOUND_TOAST: &str = "Channel not found";
const ALREADY_ADDED_TOAST: &str = "Already in your gallery";
const NOT_OWNER_TOAST: &str = "This is not your gallery";
const STALE_MESSAGE_TOAST: &str = "This message is too old, please search again";
const FAILED_TOAST: &str = "Something went wrong";
const FAILED_TEXT: &str = "Something went wrong, please try again.";

/// The message an inline button was attached to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Origin {
    pub chat_id: i64,
    pub message_id: i32,
    /// Photo messages are edited through their caption.
    pub has_photo: bool,
}

/// The parts of a Telegram update the bot reacts to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Incoming {
    Text {
        user: UserId,
        chat_id: i64,
        text: String,
    },
    Callback {
        id: String,
        user: UserId,
        origin: Option<Origin>,
        data: String,
    },
}

impl Incoming {
    /// `None` for updates the bot ignores (non-text messages, channel posts, ...).
    pub fn from_update(update: Update) -> Option<Self> {
        match update.kind {
            UpdateKind::Message(msg) => {
                let user = msg.from.as_ref()?;
                let text = msg.text()?;
                Some(Self::Text {
                    user: UserId::from(user.id.0),
                    chat_id: msg.chat.id.0,
                    text: text.to_string(),
                })
            },
            UpdateKind::CallbackQuery(query) => {
                let origin = query.message.as_ref().map(|m| Origin {
                    chat_id: m.chat().id.0,
                    message_id: m.id().0,
                    has_photo: match m {
                        MaybeInaccessibleMessage::Regular(msg) => msg.photo().is_some(),
                        MaybeInaccessibleMessage::Inaccessible(_) => false,
                    },
                });
                Some(Self::Callback {
                    id: query.id,
                    user: UserId::from(query.from.id.0),
                    origin,
                    data: query.data.unwrap_or_default(),
                })
            },
            _ => None,
        }
    }
}

pub async fn handle_update(state: &BotState, update: Update) -> Result<()> {
    let update_id = update.id;
    match Incoming::from_update(update) {
        Some(incoming) => handle_incoming(state, incoming).await,
        None => {
            debug!(?update_id, "ignoring unsupported update");
            Ok(())
        },
    }
}

pub async fn handle_incoming(state: &BotState, incoming: Incoming) -> Result<()> {
    match incoming {
        Incoming::Text {
            user,
            chat_id,
            text,
        } => {
            let result = handle_text(state, &user, chat_id, &text).await;
            if result.is_err()
                && let Err(reply_err) = state
                    .responder
                    .send_text(chat_id, FAILED_TEXT, Vec::new())
                    .await
            {
                warn!(chat_id, error = %reply_err, "failed to report error to user");
            }
            result
        },
        Incoming::Callback {
            id,
            user,
            origin,
            data,
        } => handle_callback(state, &id, &user, origin, &data).await,
    }
}

async fn handle_text(state: &BotState, user: &UserId, chat_id: i64, text: &str) -> Result<()> {
    let text = text.trim();
    let Some(command) = parse_command(text) else {
        return search(state, user, chat_id, text).await;
    };

    info!(user_id = %user, chat_id, command = %command, "bot command");
    match command.as_str() {
        "start" | "help" => {
            state
                .responder
                .send_text(chat_id, HELP_TEXT, Vec::new())
                .await
        },
        "gallery" => show_gallery(state, user, chat_id).await,
        "pdf" => send_gallery_pdf(state, user, chat_id).await,
        "clear" => clear_now(state, user, chat_id).await,
        _ => {
            state
                .responder
                .send_text(chat_id, UNKNOWN_COMMAND_TEXT, Vec::new())
                .await
        },
    }
}

/// `/name@bot args` → `name`, lowercased.
fn parse_command(text: &str) -> Option<String> {
    let word = text.strip_prefix('/')?.split_whitespace().next()?;
    let name = word.split_once('@').map_or(word, |(name, _)| name);
    Some(name.to_lowercase())
}

async fn search(state: &BotState, user: &UserId, chat_id: i64, query: &str) -> Result<()> {
    let hits = state.catalog.search(query);
    info!(user_id = %user, chat_id, hits = hits.len(), "channel search");

    match hits.as_slice() {
        [] => {
            let suggestions = state
                .catalog
                .suggestions(state.settings.suggestion_count)
                .join(" / ");
            let text = format!("Nothing found for \"{query}\". Try: {suggestions}");
            state.responder.send_text(chat_id, &text, Vec::new()).await
        },
        [key] => send_channel_card(state, chat_id, key).await,
        many => {
            let limit = state.settings.display_limit;
            let keyboard = many
                .iter()
                .take(limit)
                .map(|key| {
                    Button::new(
                        display_name(state, key),
                        &CallbackAction::Select((*key).to_string()),
                    )
                    .map(|button| vec![button])
                })
                .collect::<Result<Keyboard>>()?;
            let text = if many.len() > limit {
                format!(
                    "Found {} channels, showing the first {limit}. Pick one:",
                    many.len()
                )
            } else {
                format!("Found {} channels. Pick one:", many.len())
            };
            state.responder.send_text(chat_id, &text, keyboard).await
        },
    }
}

/// Logo photo with an "Add to gallery" button, or a warning when the file is gone.
async fn send_channel_card(state: &BotState, chat_id: i64, key: &str) -> Result<()> {
    let name = display_name(state, key);
    let keyboard = vec![vec![Button::new(
        "Add to gallery",
        &CallbackAction::Add(key.to_string()),
    )?]];

    let logo = state.catalog.logo_path(key);
    let available = match &logo {
        Some(path) => is_file(path).await,
        None => false,
    };
    match logo {
        Some(path) if available => {
            state
                .responder
                .send_photo(chat_id, &path, name, keyboard)
                .await
        },
        path => {
            warn!(key, path = ?path, "logo file missing");
            let text = format!(
                "{name}\nThe logo file for this channel is missing, but you can still add it to your gallery."
            );
            state.responder.send_text(chat_id, &text, keyboard).await
        },
    }
}

async fn handle_callback(
    state: &BotState,
    callback_id: &str,
    user: &UserId,
    origin: Option<Origin>,
    data: &str,
) -> Result<()> {
    let action = match data.parse::<CallbackAction>() {
        Ok(action) => action,
        Err(e) => {
            warn!(user_id = %user, data, error = %e, "ignoring undecodable callback");
            return state.responder.answer_callback(callback_id, None).await;
        },
    };
    debug!(user_id = %user, ?action, "callback");

    let toast = match dispatch_callback(state, user, origin, action).await {
        Ok(toast) => toast,
        Err(e) => {
            if let Err(answer_err) = state
                .responder
                .answer_callback(callback_id, Some(FAILED_TOAST))
                .await
            {
                warn!(error = %answer_err, "failed to answer callback");
            }
            return Err(e);
        },
    };
    state
        .responder
        .answer_callback(callback_id, toast.as_deref())
        .await
}

/// Run one decoded callback and return the toast to answer it with.
async fn dispatch_callback(
    state: &BotState,
    user: &UserId,
    origin: Option<Origin>,
    action: CallbackAction,
) -> Result<Option<String>> {
    let Some(origin) = origin else {
        return Ok(Some(STALE_MESSAGE_TOAST.into()));
    };
    let chat_id = origin.chat_id;

    match action {
        CallbackAction::Select(key) => {
            if !state.catalog.contains(&key) {
                return Ok(Some(NOT_FOUND_TOAST.into()));
            }
            send_channel_card(state, chat_id, &key).await?;
            Ok(None)
        },
        CallbackAction::Add(key) => add_channel(state, user, origin, key).await,
        CallbackAction::ShowGallery => {
            show_gallery(state, user, chat_id).await?;
            Ok(None)
        },
        CallbackAction::RenderPdf => {
            send_gallery_pdf(state, user, chat_id).await?;
            Ok(None)
        },
        CallbackAction::ClearNow => {
            clear_now(state, user, chat_id).await?;
            Ok(None)
        },
        CallbackAction::ClearConfirm(owner) => confirm_clear(state, user, origin, owner).await,
        CallbackAction::ClearCancel => {
            let transition = state
                .selection
                .handle(user, SelectionCommand::CancelClear)
                .await?;
            if let SelectionOutcome::Kept { count } = transition.outcome {
                let text = format!("Kept your gallery ({count}/{GALLERY_CAPACITY}).");
                state
                    .responder
                    .edit_text(chat_id, origin.message_id, &text, Vec::new())
                    .await?;
            }
            Ok(None)
        },
    }
}

async fn add_channel(
    state: &BotState,
    user: &UserId,
    origin: Origin,
    key: String,
) -> Result<Option<String>> {
    if !state.catalog.contains(&key) {
        return Ok(Some(NOT_FOUND_TOAST.into()));
    }

    let transition = state
        .selection
        .handle(user, SelectionCommand::Add(key.clone()))
        .await?;

    match transition.outcome {
        SelectionOutcome::Added { count } => {
            let text = format!(
                "{}\nAdded to your gallery ({count}/{GALLERY_CAPACITY})",
                display_name(state, &key)
            );
            let keyboard = vec![vec![
                Button::new("Show gallery", &CallbackAction::ShowGallery)?,
                Button::new("Create PDF", &CallbackAction::RenderPdf)?,
            ]];
            if origin.has_photo {
                state
                    .responder
                    .edit_caption(origin.chat_id, origin.message_id, &text, keyboard)
                    .await?;
            } else {
                state
                    .responder
                    .edit_text(origin.chat_id, origin.message_id, &text, keyboard)
                    .await?;
            }
            Ok(Some(format!("Added ({count}/{GALLERY_CAPACITY})")))
        },
        SelectionOutcome::AlreadyPresent => Ok(Some(ALREADY_ADDED_TOAST.into())),
        SelectionOutcome::ConfirmClearPrompt { owner } => {
            let text = format!(
                "Your gallery is full ({GALLERY_CAPACITY}/{GALLERY_CAPACITY}). Clear it and start over?"
            );
            let keyboard = vec![vec![
                Button::new("Clear gallery", &CallbackAction::ClearConfirm(owner))?,
                Button::new("Keep it", &CallbackAction::ClearCancel)?,
            ]];
            state
                .responder
                .send_text(origin.chat_id, &text, keyboard)
                .await?;
            Ok(None)
        },
        other => {
            warn!(user_id = %user, ?other, "unexpected outcome for add");
            Ok(None)
        },
    }
}

async fn confirm_clear(
    state: &BotState,
    user: &UserId,
    origin: Origin,
    owner: UserId,
) -> Result<Option<String>> {
    let transition = match state
        .selection
        .handle(user, SelectionCommand::ConfirmClear { owner })
        .await
    {
        Ok(transition) => transition,
        Err(tvlogo_gallery::Error::NotOwner { .. }) => return Ok(Some(NOT_OWNER_TOAST.into())),
        Err(e) => return Err(e.into()),
    };

    if let SelectionOutcome::Cleared { removed } = transition.outcome {
        let text = format!("Gallery cleared, {removed} channels removed.");
        state
            .responder
            .edit_text(origin.chat_id, origin.message_id, &text, Vec::new())
            .await?;
    }
    Ok(Some("Gallery cleared".into()))
}

async fn clear_now(state: &BotState, user: &UserId, chat_id: i64) -> Result<()> {
    let transition = state
        .selection
        .handle(user, SelectionCommand::ClearNow)
        .await?;
    let text = match transition.outcome {
        SelectionOutcome::Cleared { removed: 0 } => ALREADY_EMPTY_TEXT.to_string(),
        SelectionOutcome::Cleared { removed } => {
            format!("Gallery cleared, {removed} channels removed.")
        },
        other => {
            warn!(user_id = %user, ?other, "unexpected outcome for clear");
            return Ok(());
        },
    };
    state.responder.send_text(chat_id, &text, Vec::new()).await
}

async fn show_gallery(state: &BotState, user: &UserId, chat_id: i64) -> Result<()> {
    let keys = state.selection.store().get(user).await;
    if keys.is_empty() {
        return state
            .responder
            .send_text(chat_id, EMPTY_GALLERY_TEXT, Vec::new())
            .await;
    }

    let lines: Vec<String> = keys
        .iter()
        .enumerate()
        .map(|(i, key)| format!("{}. {}", i + 1, display_name(state, key)))
        .collect();
    let text = format!(
        "Your gallery ({}/{GALLERY_CAPACITY}):\n{}",
        keys.len(),
        lines.join("\n")
    );
    let keyboard = vec![vec![
        Button::new("Create PDF", &CallbackAction::RenderPdf)?,
        Button::new("Clear", &CallbackAction::ClearNow)?,
    ]];
    state.responder.send_text(chat_id, &text, keyboard).await
}

async fn send_gallery_pdf(state: &BotState, user: &UserId, chat_id: i64) -> Result<()> {
    let keys = state.selection.store().get(user).await;
    if keys.is_empty() {
        return state
            .responder
            .send_text(chat_id, EMPTY_GALLERY_TEXT, Vec::new())
            .await;
    }

    // A channel without a logo reference gets an empty path, which the
    // renderer skips, leaving its cell blank.
    let paths: Vec<PathBuf> = keys
        .iter()
        .map(|key| state.catalog.logo_path(key).unwrap_or_default())
        .collect();
    let export = state
        .settings
        .export_dir
        .as_ref()
        .map(|dir| dir.join(tvlogo_pdf::export_file_name(user.as_str())));

    let outcome = tokio::task::spawn_blocking(move || -> tvlogo_pdf::Result<_> {
        let rendered = tvlogo_pdf::render(&paths)?;
        if let Some(dest) = &export {
            tvlogo_pdf::write_document(dest, &rendered.bytes)?;
        }
        Ok(rendered)
    })
    .await
    .map_err(|e| Error::external("pdf render task failed", e))?;

    let rendered = match outcome {
        Ok(rendered) => rendered,
        Err(e) => {
            error!(user_id = %user, chat_id, error = %e, "gallery pdf failed");
            return state
                .responder
                .send_text(chat_id, PDF_FAILED_TEXT, Vec::new())
                .await;
        },
    };

    let placed = rendered.placements.len();
    let caption = if rendered.skipped == 0 {
        format!("Your gallery: {placed} logos")
    } else {
        format!(
            "Your gallery: {placed} logos ({} could not be loaded)",
            rendered.skipped
        )
    };
    info!(user_id = %user, chat_id, placed, skipped = rendered.skipped, "sending gallery pdf");
    state
        .responder
        .send_document(chat_id, rendered.bytes, GALLERY_PDF_NAME, &caption)
        .await
}

fn display_name<'a>(state: &'a BotState, key: &'a str) -> &'a str {
    state.catalog.get(key).map_or(key, |entry| entry.name.as_str())
}

async fn is_file(path: &Path) -> bool {
    tokio::fs::metadata(path)
        .await
        .is_ok_and(|meta| meta.is_file())
}
