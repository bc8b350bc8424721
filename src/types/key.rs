use super::CacheError;
use std::fmt::{self, Display};

/// Longest key memcached accepts, in bytes, not characters.
pub const MAX_KEY_LENGTH: usize = 250;

/// Characters a key may never contain.
pub const RESERVED_CHARACTERS: &str = "{}()/\\@:";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InvalidKeyReason {
    Empty,
    TooLong { key: String, length: usize },
    ReservedCharacter { key: String, character: char },
    ControlCharacter { key: String, character: char },
}

impl Display for InvalidKeyReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InvalidKeyReason::Empty => write!(f, "key is empty"),
            InvalidKeyReason::TooLong { key, length } => write!(
                f,
                "key \"{}\" is {} bytes long, the maximum is {}",
                key, length, MAX_KEY_LENGTH
            ),
            InvalidKeyReason::ReservedCharacter { key, character } => write!(
                f,
                "key \"{}\" contains reserved character '{}'",
                key, character
            ),
            InvalidKeyReason::ControlCharacter { key, character } => write!(
                f,
                "key {:?} contains whitespace or control character {:?}",
                key, character
            ),
        }
    }
}

pub fn validate_key(key: &str) -> Result<(), CacheError> {
    if key.is_empty() {
        return Err(CacheError::InvalidKey(InvalidKeyReason::Empty));
    }
    if key.len() > MAX_KEY_LENGTH {
        return Err(CacheError::InvalidKey(InvalidKeyReason::TooLong {
            key: key.to_string(),
            length: key.len(),
        }));
    }
    if let Some(character) = key.chars().find(|c| RESERVED_CHARACTERS.contains(*c)) {
        return Err(CacheError::InvalidKey(InvalidKeyReason::ReservedCharacter {
            key: key.to_string(),
            character,
        }));
    }
    // memcached's text protocol frames keys with whitespace
    if let Some(character) = key.chars().find(|c| c.is_whitespace() || c.is_control()) {
        return Err(CacheError::InvalidKey(InvalidKeyReason::ControlCharacter {
            key: key.to_string(),
            character,
        }));
    }
    Ok(())
}

/// Validates every key and returns them in order. Fails on the first bad one,
/// so nothing is sent to the transport for a partially valid batch.
pub(crate) fn validate_keys<I, K>(keys: I) -> Result<Vec<String>, CacheError>
where
    I: IntoIterator<Item = K>,
    K: AsRef<str>,
{
    keys.into_iter()
        .map(|k| {
            let k = k.as_ref();
            validate_key(k).map(|_| k.to_string())
        })
        .collect()
}
