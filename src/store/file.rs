//! Whole-file persistence for the credential store.
//!
//! The file is a single JSON object keyed by lowercase hyphenated UUID:
//!
//! ```text
//! {
//!   "0f8fad5b-d9cb-469f-a165-70867728950e": {
//!     "hash": "<64 hex chars>",
//!     "salt": "<64 hex chars>"
//!   }
//! }
//! ```
//!
//! Each identifier may appear once. A key repeated verbatim, or two keys
//! spelling the same UUID differently, make the whole file malformed.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::fs;
use std::path::Path;
use std::time::Instant;

use serde::de::{Deserializer, MapAccess, Visitor};
use serde::Deserialize;
use tracing::{debug, info};
use uuid::Uuid;

use super::record::StoredRecord;
use super::{CredentialRecord, CredentialStore};
use crate::{GatekeeperError, Result};

/// Contents written for a store with no records.
pub const EMPTY_DATABASE: &str = "{\n}";

impl CredentialStore {
    /// Create the credential file with an empty object if it does not exist.
    ///
    /// Parent directories are created as needed. An existing file is left
    /// as-is; its contents are only checked by [`load_from_file`].
    ///
    /// Returns `true` if the file was created.
    ///
    /// [`load_from_file`]: CredentialStore::load_from_file
    pub fn ensure_file_exists<P: AsRef<Path>>(path: P) -> Result<bool> {
        let path = path.as_ref();
        if path.exists() {
            return Ok(false);
        }

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        fs::write(path, EMPTY_DATABASE)?;

        info!(path = %path.display(), "Created empty credential file");
        Ok(true)
    }

    /// Replace the whole in-memory mapping with the contents of `path`.
    ///
    /// Fails with [`GatekeeperError::Io`] if the file cannot be read and
    /// [`GatekeeperError::Format`] if any part of it is malformed. On error
    /// the current mapping is left untouched.
    pub fn load_from_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = fs::read_to_string(path.as_ref())?;
        let users = parse_database(&content)?;
        let count = users.len();

        self.replace_all(users);

        debug!(path = %path.as_ref().display(), count, "Loaded credentials");
        Ok(())
    }

    /// Write the whole mapping to `path`, overwriting it.
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = self.render()?;
        fs::write(path.as_ref(), content)?;

        debug!(path = %path.as_ref().display(), count = self.len(), "Saved credentials");
        Ok(())
    }

    /// Create a store from `path`, creating an empty file first if needed.
    ///
    /// This is the startup sequence: ensure the file, then load it.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let started = Instant::now();

        let store = Self::new();
        Self::ensure_file_exists(path)?;
        store.load_from_file(path)?;

        info!(
            path = %path.display(),
            count = store.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Deserialized credential store"
        );
        Ok(store)
    }

    /// Save the store to `path` at shutdown, logging how long it took.
    pub fn close<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let started = Instant::now();

        self.save_to_file(path)?;

        info!(
            path = %path.display(),
            count = self.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Serialized credential store"
        );
        Ok(())
    }

    fn render(&self) -> Result<String> {
        let users = self.read();
        if users.is_empty() {
            return Ok(EMPTY_DATABASE.to_string());
        }

        let stored: BTreeMap<String, StoredRecord> = users
            .iter()
            .map(|(id, record)| (id.hyphenated().to_string(), StoredRecord::from(record)))
            .collect();
        Ok(serde_json::to_string_pretty(&stored)?)
    }
}

/// Top-level entries of the credential file, in file order.
///
/// Unlike a map, repeated keys are kept so they can be rejected.
struct DatabaseEntries(Vec<(String, StoredRecord)>);

impl<'de> Deserialize<'de> for DatabaseEntries {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct EntriesVisitor;

        impl<'de> Visitor<'de> for EntriesVisitor {
            type Value = DatabaseEntries;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("an object of credential records")
            }

            fn visit_map<A>(self, mut map: A) -> std::result::Result<Self::Value, A::Error>
            where
                A: MapAccess<'de>,
            {
                let mut entries = Vec::with_capacity(map.size_hint().unwrap_or(0));
                while let Some(entry) = map.next_entry::<String, StoredRecord>()? {
                    entries.push(entry);
                }
                Ok(DatabaseEntries(entries))
            }
        }

        deserializer.deserialize_map(EntriesVisitor)
    }
}

fn parse_database(content: &str) -> Result<HashMap<Uuid, CredentialRecord>> {
    let DatabaseEntries(entries) = serde_json::from_str(content)?;

    let mut users = HashMap::with_capacity(entries.len());
    for (key, value) in &entries {
        let id = Uuid::parse_str(key).map_err(|e| {
            GatekeeperError::Format(format!("invalid identifier '{key}': {e}"))
        })?;
        let record = value.decode(key)?;
        if users.insert(id, record).is_some() {
            return Err(GatekeeperError::Format(format!(
                "duplicate identifier '{key}'"
            )));
        }
    }
    Ok(users)
}

#[cfg(test)]
mod tests {
    use super::*;

    const ID: &str = "0f8fad5b-d9cb-469f-a165-70867728950e";

    fn record_json(id: &str) -> String {
        format!(
            r#"{{"{id}": {{"hash": "{}", "salt": "{}"}}}}"#,
            "11".repeat(32),
            "22".repeat(32)
        )
    }

    #[test]
    fn test_parse_empty_object() {
        assert!(parse_database(EMPTY_DATABASE).unwrap().is_empty());
        assert!(parse_database("{}").unwrap().is_empty());
    }

    #[test]
    fn test_parse_single_record() {
        let users = parse_database(&record_json(ID)).unwrap();
        let record = &users[&Uuid::parse_str(ID).unwrap()];

        assert_eq!(record.hash(), &[0x11; 32]);
        assert_eq!(record.salt(), &[0x22; 32]);
    }

    #[test]
    fn test_parse_rejects_non_object() {
        for content in ["[]", "42", "\"text\"", "null", ""] {
            let result = parse_database(content);
            assert!(
                matches!(result, Err(GatekeeperError::Format(_))),
                "accepted {content:?}"
            );
        }
    }

    #[test]
    fn test_parse_rejects_bad_identifier() {
        let result = parse_database(&record_json("bad-uuid"));
        let err = result.unwrap_err();
        assert!(matches!(err, GatekeeperError::Format(_)));
        assert!(err.to_string().contains("bad-uuid"));
    }

    #[test]
    fn test_parse_rejects_missing_field() {
        let content = format!(r#"{{"{ID}": {{"hash": "{}"}}}}"#, "11".repeat(32));
        assert!(matches!(
            parse_database(&content),
            Err(GatekeeperError::Format(_))
        ));
    }

    #[test]
    fn test_parse_rejects_non_string_field() {
        let content = format!(r#"{{"{ID}": {{"hash": 1, "salt": 2}}}}"#);
        assert!(parse_database(&content).is_err());
    }

    #[test]
    fn test_parse_rejects_same_uuid_twice() {
        let upper = ID.to_uppercase();
        let content = format!(
            r#"{{"{ID}": {{"hash": "{h}", "salt": "{s}"}}, "{upper}": {{"hash": "{h}", "salt": "{s}"}}}}"#,
            h = "11".repeat(32),
            s = "22".repeat(32)
        );
        let err = parse_database(&content).unwrap_err();
        assert!(err.to_string().contains("duplicate"));
    }

    #[test]
    fn test_parse_rejects_repeated_key() {
        let content = format!(
            r#"{{"{ID}": {{"hash": "{a}", "salt": "{a}"}}, "{ID}": {{"hash": "{b}", "salt": "{b}"}}}}"#,
            a = "11".repeat(32),
            b = "22".repeat(32)
        );
        let err = parse_database(&content).unwrap_err();
        assert!(matches!(err, GatekeeperError::Format(_)));
        assert!(err.to_string().contains("duplicate identifier"));
        assert!(err.to_string().contains(ID));
    }

    #[test]
    fn test_render_empty_store() {
        let store = CredentialStore::new();
        assert_eq!(store.render().unwrap(), EMPTY_DATABASE);
    }

    #[test]
    fn test_render_uses_canonical_keys_and_hex() {
        let store = CredentialStore::new();
        let id = Uuid::parse_str(ID).unwrap();
        store.register(id, "secret");

        let rendered = store.render().unwrap();
        let value: serde_json::Value = serde_json::from_str(&rendered).unwrap();
        let entry = &value[ID];
        let record = store.record(id).unwrap();

        assert_eq!(entry["hash"], hex::encode(record.hash()));
        assert_eq!(entry["salt"], hex::encode(record.salt()));
        assert_eq!(entry.as_object().unwrap().len(), 2);
    }
}
