//! Query/alias tokenizer.
//!
//! Both user queries and catalog aliases go through [`normalize`], so the
//! matcher only ever compares canonical tokens.

use std::{collections::BTreeSet, sync::LazyLock};

/// Closed substitution table applied after lower-casing.
///
/// Cyrillic letters that render like Latin ones are folded onto the Latin
/// letter, so "СТС" typed on either keyboard layout ends up identical.
const SUBSTITUTIONS: &[(char, char)] = &[
    ('ё', 'e'),
    ('й', 'и'),
    ('а', 'a'),
    ('в', 'b'),
    ('е', 'e'),
    ('к', 'k'),
    ('м', 'm'),
    ('н', 'h'),
    ('о', 'o'),
    ('р', 'p'),
    ('с', 'c'),
    ('т', 't'),
    ('у', 'y'),
    ('х', 'x'),
];

/// Filler words people wrap around a channel name.
const STOP_WORDS: &[&str] = &[
    "channel",
    "channels",
    "watch",
    "want",
    "show",
    "give",
    "me",
    "please",
    "logo",
    "канал",
    "каналы",
    "канала",
    "смотреть",
    "посмотреть",
    "хочу",
    "покажи",
    "дай",
    "мне",
    "пожалуйста",
    "логотип",
];

/// Stop words in their post-substitution spelling.
static STOP_SET: LazyLock<BTreeSet<String>> =
    LazyLock::new(|| STOP_WORDS.iter().map(|w| fold(w)).collect());

/// Minimum token length (in characters) that survives normalization.
const MIN_TOKEN_CHARS: usize = 2;

fn substitute(c: char) -> char {
    SUBSTITUTIONS
        .iter()
        .find_map(|&(from, to)| (from == c).then_some(to))
        .unwrap_or(c)
}

/// Lower-case and apply the substitution table.
pub fn fold(text: &str) -> String {
    text.to_lowercase().chars().map(substitute).collect()
}

/// Turn free text into a set of comparable tokens.
///
/// Never fails: text without usable tokens yields an empty set.
pub fn normalize(text: &str) -> BTreeSet<String> {
    fold(text)
        .split_whitespace()
        .filter(|token| token.chars().all(char::is_alphanumeric))
        .filter(|token| !STOP_SET.contains(*token))
        .filter(|token| token.chars().count() >= MIN_TOKEN_CHARS)
        .map(str::to_owned)
        .collect()
}
