//! `KEY[@DB]` address parsing.

use crate::core::error::StashError;

/// Namespace used when an address names no database.
pub const DEFAULT_DB: &str = "default";

/// A parsed `KEY[@DB]` address. Both parts are lowercased.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Address {
    pub key: Vec<u8>,
    /// Empty when the address carried no `@DB` part.
    pub db: String,
}

/// Map an empty database name to [`DEFAULT_DB`].
pub fn effective_name(db: &str) -> &str {
    if db.is_empty() { DEFAULT_DB } else { db }
}

/// A database name must be a single directory name under the registry.
///
/// The empty name stands for [`DEFAULT_DB`] and is accepted.
pub fn validate_db_name(name: &str) -> Result<(), StashError> {
    if name == "." || name == ".." || name.contains(['/', '\\', '\0']) {
        return Err(StashError::Format(format!(
            "invalid database name \"@{}\"",
            name.escape_debug()
        )));
    }
    Ok(())
}

pub fn parse(input: &str) -> Result<Address, StashError> {
    let parts: Vec<&str> = input.split('@').collect();
    let (key, db) = match parts.as_slice() {
        [key] => (key, String::new()),
        [key, db] => (key, db.to_lowercase()),
        _ => return Err(StashError::Format("bad key format, use KEY@DB".to_string())),
    };
    validate_db_name(&db)?;
    Ok(Address {
        key: key.to_lowercase().into_bytes(),
        db,
    })
}

/// Database part of an optional `[@DB]` argument, as taken by `list`, `sync` and `delete-db`.
pub fn db_from_arg(arg: Option<&str>) -> Result<String, StashError> {
    match arg {
        None => Ok(String::new()),
        Some(a) => Ok(parse(a)?.db),
    }
}
