//! Static channel catalog and alias matcher.

use std::{
    collections::{BTreeSet, HashMap},
    path::{Path, PathBuf},
};

use {
    serde::{
        Deserialize, Serialize,
        de::{MapAccess, Visitor},
    },
    tracing::{debug, info},
};

use crate::{
    error::{Error, Result},
    normalize::normalize,
};

/// Longest channel key, in bytes, that still fits a `select:<key>` button
/// payload within Telegram's 64-byte `callback_data` limit.
pub const MAX_KEY_LEN: usize = 64 - "select:".len();

/// One channel as described by the catalog source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelEntry {
    /// Display name shown to users.
    pub name: String,
    /// Alternate spellings a user might type.
    pub aliases: Vec<String>,
    /// Logo file references; only the first one is used.
    pub logos: Vec<String>,
}

/// The top-level catalog object as `(key, value)` pairs in source order.
///
/// Unlike a map, repeated keys are kept so they can be rejected.
struct RawDocument(Vec<(String, serde_json::Value)>);

impl<'de> Deserialize<'de> for RawDocument {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        struct PairsVisitor;

        impl<'de> Visitor<'de> for PairsVisitor {
            type Value = RawDocument;

            fn expecting(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str("an object of channel entries")
            }

            fn visit_map<A>(self, mut map: A) -> std::result::Result<Self::Value, A::Error>
            where
                A: MapAccess<'de>,
            {
                let mut pairs = Vec::with_capacity(map.size_hint().unwrap_or(0));
                while let Some(pair) = map.next_entry::<String, serde_json::Value>()? {
                    pairs.push(pair);
                }
                Ok(RawDocument(pairs))
            }
        }

        deserializer.deserialize_map(PairsVisitor)
    }
}

struct IndexedEntry {
    key: String,
    entry: ChannelEntry,
    /// Union of the normalized tokens of every alias.
    alias_tokens: BTreeSet<String>,
}

/// Immutable, fully loaded channel table.
pub struct Catalog {
    entries: Vec<IndexedEntry>,
    by_key: HashMap<String, usize>,
    logo_root: PathBuf,
}

impl std::fmt::Debug for Catalog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Catalog")
            .field("entries", &self.entries.len())
            .field("logo_root", &self.logo_root)
            .finish()
    }
}

impl Catalog {
    /// Load the catalog document at `path`.
    ///
    /// Relative logo paths resolve against `logo_root`, or against the
    /// catalog file's directory when no root is given.
    pub fn load(path: &Path, logo_root: Option<&Path>) -> Result<Self> {
        let raw = std::fs::read_to_string(path).map_err(|source| Error::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let root = match logo_root {
            Some(root) => root.to_path_buf(),
            None => path
                .parent()
                .map(Path::to_path_buf)
                .unwrap_or_else(|| PathBuf::from(".")),
        };
        let catalog = Self::from_json(&raw, root).map_err(|e| match e {
            Error::Parse { source, .. } => Error::Parse {
                origin: path.display().to_string(),
                source,
            },
            other => other,
        })?;
        info!(
            path = %path.display(),
            channels = catalog.len(),
            "channel catalog loaded"
        );
        Ok(catalog)
    }

    /// Build a catalog from a JSON document. All-or-nothing.
    pub fn from_json(raw: &str, logo_root: impl Into<PathBuf>) -> Result<Self> {
        let RawDocument(document) = serde_json::from_str(raw).map_err(|source| Error::Parse {
            origin: "<inline>".into(),
            source,
        })?;

        let mut pairs = Vec::with_capacity(document.len());
        for (key, value) in document {
            let entry: ChannelEntry =
                serde_json::from_value(value).map_err(|e| Error::invalid_entry(&key, e))?;
            pairs.push((key, entry));
        }
        Self::from_entries(pairs, logo_root)
    }

    /// Build a catalog from already-parsed entries, keeping their order.
    pub fn from_entries(
        pairs: impl IntoIterator<Item = (String, ChannelEntry)>,
        logo_root: impl Into<PathBuf>,
    ) -> Result<Self> {
        let mut entries = Vec::new();
        let mut by_key = HashMap::new();

        for (key, entry) in pairs {
            if key.trim().is_empty() {
                return Err(Error::invalid_entry(&key, "empty channel key"));
            }
            if key.len() > MAX_KEY_LEN {
                return Err(Error::invalid_entry(
                    &key,
                    format!(
                        "key is {} bytes, longer than the {MAX_KEY_LEN} that fit in callback data",
                        key.len()
                    ),
                ));
            }
            if entry.name.trim().is_empty() {
                return Err(Error::invalid_entry(&key, "empty display name"));
            }
            if by_key.contains_key(&key) {
                return Err(Error::invalid_entry(&key, "duplicate channel key"));
            }

            let alias_tokens: BTreeSet<String> =
                entry.aliases.iter().flat_map(|a| normalize(a)).collect();
            if alias_tokens.is_empty() {
                debug!(key, "channel has no searchable aliases");
            }

            by_key.insert(key.clone(), entries.len());
            entries.push(IndexedEntry {
                key,
                entry,
                alias_tokens,
            });
        }

        if entries.is_empty() {
            return Err(Error::Empty);
        }

        Ok(Self {
            entries,
            by_key,
            logo_root: logo_root.into(),
        })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, key: &str) -> Option<&ChannelEntry> {
        self.by_key.get(key).map(|&i| &self.entries[i].entry)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.by_key.contains_key(key)
    }

    /// Iterate `(key, entry)` pairs in source order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &ChannelEntry)> {
        self.entries.iter().map(|e| (e.key.as_str(), &e.entry))
    }

    /// Keys whose alias tokens share at least one token with `query`.
    ///
    /// Results follow catalog order and are not truncated. A query with no
    /// usable tokens matches nothing.
    pub fn search(&self, query: &str) -> Vec<&str> {
        let query_tokens = normalize(query);
        if query_tokens.is_empty() {
            return Vec::new();
        }
        self.entries
            .iter()
            .filter(|e| !e.alias_tokens.is_disjoint(&query_tokens))
            .map(|e| e.key.as_str())
            .collect()
    }

    /// Resolved path of the channel's first logo.
    pub fn logo_path(&self, key: &str) -> Option<PathBuf> {
        let logo = self.get(key)?.logos.first()?;
        let path = Path::new(logo);
        if path.is_absolute() {
            Some(path.to_path_buf())
        } else {
            Some(self.logo_root.join(path))
        }
    }

    /// First `n` display names, used as "try one of these" hints.
    pub fn suggestions(&self, n: usize) -> Vec<&str> {
        self.entries
            .iter()
            .take(n)
            .map(|e| e.entry.name.as_str())
            .collect()
    }
}
