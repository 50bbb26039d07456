//! In-memory [`Responder`] that records every call.

use std::{
    path::{Path, PathBuf},
    sync::Mutex,
};

use async_trait::async_trait;

use crate::{
    error::Result,
    outbound::{Keyboard, Responder},
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Sent {
    Text {
        chat_id: i64,
        text: String,
        keyboard: Keyboard,
    },
    Photo {
        chat_id: i64,
        photo: PathBuf,
        caption: String,
        keyboard: Keyboard,
    },
    Document {
        chat_id: i64,
        bytes: Vec<u8>,
        filename: String,
        caption: String,
    },
    EditCaption {
        chat_id: i64,
        message_id: i32,
        caption: String,
        keyboard: Keyboard,
    },
    EditText {
        chat_id: i64,
        message_id: i32,
        text: String,
        keyboard: Keyboard,
    },
    Answer {
        callback_id: String,
        text: Option<String>,
    },
}

impl Sent {
    /// Callback payloads of all buttons, row by row.
    pub fn button_data(&self) -> Vec<String> {
        let keyboard = match self {
            Self::Text { keyboard, .. }
            | Self::Photo { keyboard, .. }
            | Self::EditCaption { keyboard, .. }
            | Self::EditText { keyboard, .. } => keyboard,
            Self::Document { .. } | Self::Answer { .. } => return Vec::new(),
        };
        keyboard.iter().flatten().map(|b| b.data.clone()).collect()
    }
}

#[derive(Default)]
pub struct RecordingResponder {
    sent: Mutex<Vec<Sent>>,
}

impl RecordingResponder {
    /// Drain everything recorded so far.
    pub fn take(&self) -> Vec<Sent> {
        std::mem::take(&mut *self.sent.lock().unwrap_or_else(|e| e.into_inner()))
    }

    fn record(&self, sent: Sent) -> Result<()> {
        self.sent
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(sent);
        Ok(())
    }
}

#[async_trait]
impl Responder for RecordingResponder {
    async fn send_text(&self, chat_id: i64, text: &str, keyboard: Keyboard) -> Result<()> {
        self.record(Sent::Text {
            chat_id,
            text: text.into(),
            keyboard,
        })
    }

    async fn send_photo(
        &self,
        chat_id: i64,
        photo: &Path,
        caption: &str,
        keyboard: Keyboard,
    ) -> Result<()> {
        self.record(Sent::Photo {
            chat_id,
            photo: photo.to_path_buf(),
            caption: caption.into(),
            keyboard,
        })
    }

    async fn send_document(
        &self,
        chat_id: i64,
        bytes: Vec<u8>,
        filename: &str,
        caption: &str,
    ) -> Result<()> {
        self.record(Sent::Document {
            chat_id,
            bytes,
            filename: filename.into(),
            caption: caption.into(),
        })
    }

    async fn edit_caption(
        &self,
        chat_id: i64,
        message_id: i32,
        caption: &str,
        keyboard: Keyboard,
    ) -> Result<()> {
        self.record(Sent::EditCaption {
            chat_id,
            message_id,
            caption: caption.into(),
            keyboard,
        })
    }

    async fn edit_text(
        &self,
        chat_id: i64,
        message_id: i32,
        text: &str,
        keyboard: Keyboard,
    ) -> Result<()> {
        self.record(Sent::EditText {
            chat_id,
            message_id,
            text: text.into(),
            keyboard,
        })
    }

    async fn answer_callback(&self, callback_id: &str, text: Option<&str>) -> Result<()> {
        self.record(Sent::Answer {
            callback_id: callback_id.into(),
            text: text.map(str::to_string),
        })
    }
}
