pub mod config;
pub mod key;
pub mod ttl;

use key::InvalidKeyReason;
use serde::{de::DeserializeOwned, Serialize};
use std::{
    collections::HashMap,
    error::Error,
    fmt::{self, Display},
};
use ttl::Ttl;

/// The caller facing cache contract.
///
/// Keys are validated before anything reaches the backing store, and store
/// failures never surface as errors: they read as misses or as `false`.
pub trait CacheContract {
    /// Returns the stored value, or `default` when the key is absent.
    fn get<V: DeserializeOwned>(&self, key: &str, default: V) -> Result<V, CacheError>;

    /// Stores `value`. A ttl that normalizes to zero or less deletes the key
    /// instead.
    fn set<V: Serialize + ?Sized>(
        &self,
        key: &str,
        value: &V,
        ttl: Option<Ttl>,
    ) -> Result<bool, CacheError>;

    /// Deleting an absent key succeeds.
    fn delete(&self, key: &str) -> Result<bool, CacheError>;

    /// Flushes the whole backing store, including keys outside this cache's
    /// prefix.
    fn clear(&self) -> bool;

    /// Advisory only. Another client may change the key right after this
    /// returns.
    fn has(&self, key: &str) -> Result<bool, CacheError>;

    /// The result holds exactly the requested keys.
    fn get_multiple<I, K, V>(&self, keys: I, default: V) -> Result<HashMap<String, V>, CacheError>
    where
        I: IntoIterator<Item = K>,
        K: AsRef<str>,
        V: DeserializeOwned + Clone;

    fn set_multiple<I, K, V>(&self, values: I, ttl: Option<Ttl>) -> Result<bool, CacheError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Serialize;

    fn delete_multiple<I, K>(&self, keys: I) -> Result<bool, CacheError>
    where
        I: IntoIterator<Item = K>,
        K: AsRef<str>;
}

pub(crate) fn encode<V: Serialize + ?Sized>(value: &V) -> Result<Vec<u8>, CacheError> {
    bincode::serialize(value).map_err(CacheError::MalformedValue)
}

pub(crate) fn decode<V: DeserializeOwned>(bytes: &[u8]) -> Result<V, CacheError> {
    bincode::deserialize(bytes).map_err(CacheError::MalformedValue)
}

#[derive(Debug)]
pub enum CacheError {
    InvalidKey(InvalidKeyReason),
    MalformedValue(bincode::Error),
}

impl Display for CacheError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CacheError::InvalidKey(reason) => write!(f, "invalid key: {}", reason),
            CacheError::MalformedValue(e) => std::fmt::Display::fmt(&e, f),
        }
    }
}

impl Error for CacheError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            CacheError::InvalidKey(_) => None,
            CacheError::MalformedValue(e) => Some(e.as_ref()),
        }
    }
}
