//! Telegram front end for the logo bot.
//!
//! Decodes webhook updates, runs them against the catalog and the gallery
//! selection machine, and answers through a [`Responder`], which is teloxide
//! in production and a recorder in tests.

pub mod bot;
pub mod callback;
pub mod error;
pub mod handlers;
pub mod outbound;
pub mod state;
pub mod webhook;

#[cfg(test)]
mod testing;

pub use {
    callback::{CallbackAction, CallbackError},
    error::{Error, Result},
    handlers::{Incoming, Origin, handle_incoming, handle_update},
    outbound::{Button, Keyboard, Responder, TelegramResponder},
    state::{BotState, HandlerSettings},
};
