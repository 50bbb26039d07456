//! Inline-button payloads.
//!
//! Wire form is `<verb>:<argument>` for verbs that carry one and the bare verb
//! otherwise. Telegram caps `callback_data` at 64 bytes.

use std::{fmt, str::FromStr};

use tvlogo_gallery::UserId;

/// Telegram's limit on `callback_data`, in bytes.
pub const MAX_CALLBACK_DATA_LEN: usize = 64;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallbackAction {
    /// Show one channel out of an ambiguous result list.
    Select(String),
    /// Add a channel to the caller's gallery.
    Add(String),
    /// List the gallery contents.
    ShowGallery,
    /// Render and send the gallery PDF.
    RenderPdf,
    ClearNow,
    /// Confirm clearing the gallery owned by the given user.
    ClearConfirm(UserId),
    ClearCancel,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CallbackError {
    #[error("unknown callback verb: {0:?}")]
    UnknownVerb(String),
    #[error("callback verb {verb:?} needs an argument")]
    MissingArgument { verb: &'static str },
    #[error("callback verb {verb:?} takes no argument")]
    UnexpectedArgument { verb: &'static str },
    #[error("invalid user id in callback: {0:?}")]
    InvalidUser(String),
    #[error("callback data is {len} bytes, limit is {MAX_CALLBACK_DATA_LEN}")]
    TooLong { len: usize },
}

impl CallbackAction {
    pub fn verb(&self) -> &'static str {
        match self {
            Self::Select(_) => "select",
            Self::Add(_) => "add",
            Self::ShowGallery => "show_pdf",
            Self::RenderPdf => "show_pdf_now",
            Self::ClearNow => "clear_now",
            Self::ClearConfirm(_) => "clear_confirm",
            Self::ClearCancel => "clear_cancel",
        }
    }

    /// Wire form, checked against [`MAX_CALLBACK_DATA_LEN`].
    pub fn encode(&self) -> Result<String, CallbackError> {
        let data = self.to_string();
        if data.len() > MAX_CALLBACK_DATA_LEN {
            return Err(CallbackError::TooLong { len: data.len() });
        }
        Ok(data)
    }
}

impl fmt::Display for CallbackAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Select(key) | Self::Add(key) => write!(f, "{}:{key}", self.verb()),
            Self::ClearConfirm(owner) => write!(f, "{}:{owner}", self.verb()),
            _ => f.write_str(self.verb()),
        }
    }
}

impl FromStr for CallbackAction {
    type Err = CallbackError;

    fn from_str(data: &str) -> Result<Self, Self::Err> {
        let (verb, arg) = match data.split_once(':') {
            Some((verb, arg)) => (verb, Some(arg).filter(|a| !a.is_empty())),
            None => (data, None),
        };

        let required = |verb: &'static str| arg.ok_or(CallbackError::MissingArgument { verb });
        let bare = |verb: &'static str, action: Self| match arg {
            Some(_) => Err(CallbackError::UnexpectedArgument { verb }),
            None => Ok(action),
        };

        match verb {
            "select" => Ok(Self::Select(required("select")?.to_string())),
            "add" => Ok(Self::Add(required("add")?.to_string())),
            "clear_confirm" => {
                let raw = required("clear_confirm")?;
                raw.parse::<UserId>()
                    .map(Self::ClearConfirm)
                    .map_err(|_| CallbackError::InvalidUser(raw.to_string()))
            },
            "show_pdf" => bare("show_pdf", Self::ShowGallery),
            "show_pdf_now" => bare("show_pdf_now", Self::RenderPdf),
            "clear_now" => bare("clear_now", Self::ClearNow),
            "clear_cancel" => bare("clear_cancel", Self::ClearCancel),
            other => Err(CallbackError::UnknownVerb(other.to_string())),
        }
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use {super::*, rstest::rstest};

    #[rstest]
    #[case("select:ntv", CallbackAction::Select("ntv".into()))]
    #[case("add:perviy", CallbackAction::Add("perviy".into()))]
    #[case("add:a:b", CallbackAction::Add("a:b".into()))]
    #[case("show_pdf", CallbackAction::ShowGallery)]
    #[case("show_pdf:", CallbackAction::ShowGallery)]
    #[case("show_pdf_now", CallbackAction::RenderPdf)]
    #[case("clear_now", CallbackAction::ClearNow)]
    #[case("clear_cancel:", CallbackAction::ClearCancel)]
    #[case("clear_confirm:123456", CallbackAction::ClearConfirm(UserId::from(123_456)))]
    fn decodes(#[case] data: &str, #[case] expected: CallbackAction) {
        assert_eq!(data.parse::<CallbackAction>().unwrap(), expected);
    }

    #[rstest]
    #[case("", CallbackError::UnknownVerb(String::new()))]
    #[case("delete:ntv", CallbackError::UnknownVerb("delete".into()))]
    #[case("add", CallbackError::MissingArgument { verb: "add" })]
    #[case("select:", CallbackError::MissingArgument { verb: "select" })]
    #[case("clear_confirm", CallbackError::MissingArgument { verb: "clear_confirm" })]
    #[case("clear_confirm:bob", CallbackError::InvalidUser("bob".into()))]
    #[case("clear_now:7", CallbackError::UnexpectedArgument { verb: "clear_now" })]
    fn rejects(#[case] data: &str, #[case] expected: CallbackError) {
        assert_eq!(data.parse::<CallbackAction>().unwrap_err(), expected);
    }

    #[rstest]
    #[case(CallbackAction::Add("ntv".into()), "add:ntv")]
    #[case(CallbackAction::ShowGallery, "show_pdf")]
    #[case(CallbackAction::ClearConfirm(UserId::from(9)), "clear_confirm:9")]
    fn encodes(#[case] action: CallbackAction, #[case] expected: &str) {
        assert_eq!(action.encode().unwrap(), expected);
    }

    #[test]
    fn encode_enforces_telegram_limit() {
        let fits = CallbackAction::Select("k".repeat(MAX_CALLBACK_DATA_LEN - "select:".len()));
        assert_eq!(fits.encode().unwrap().len(), MAX_CALLBACK_DATA_LEN);

        let long = CallbackAction::Select("k".repeat(MAX_CALLBACK_DATA_LEN));
        assert!(matches!(long.encode(), Err(CallbackError::TooLong { .. })));
    }

    #[test]
    fn longest_catalog_key_fits_every_key_button() {
        let key = "k".repeat(tvlogo_catalog::MAX_KEY_LEN);
        assert!(CallbackAction::Select(key.clone()).encode().is_ok());
        assert!(CallbackAction::Add(key).encode().is_ok());
    }

    #[test]
    fn encoded_actions_decode_to_themselves() {
        for action in [
            CallbackAction::Select("discovery".into()),
            CallbackAction::RenderPdf,
            CallbackAction::ClearNow,
            CallbackAction::ClearCancel,
            CallbackAction::ClearConfirm(UserId::from(1)),
        ] {
            assert_eq!(action.encode().unwrap().parse::<CallbackAction>().unwrap(), action);
        }
    }
}
