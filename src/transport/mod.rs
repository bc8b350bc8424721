pub mod local;

#[cfg(feature = "memcache")]
#[cfg_attr(docsrs, doc(cfg(feature = "memcache")))]
pub mod memcache;

#[cfg(feature = "memcache")]
use ::memcache::MemcacheError;
use serde::{Deserialize, Serialize};
use std::{
    collections::HashMap,
    error::Error,
    fmt::{self, Display},
};

/// The storage collaborator behind a [`CacheFacade`](crate::CacheFacade).
///
/// A missing key is always reported as `Err(TransportError::KeyMissing)`, never
/// as an empty value.
pub trait Transport: Clone {
    fn get(&self, key: &str) -> Result<Vec<u8>, TransportError>;
    /// `ttl` is in seconds relative to now. `None` uses the transport default.
    fn set(&self, key: &str, value: &[u8], ttl: Option<u32>) -> Result<(), TransportError>;
    fn delete(&self, key: &str) -> Result<(), TransportError>;
    fn flush(&self) -> Result<(), TransportError>;

    fn get_multi(&self, keys: &[&str]) -> Result<HashMap<String, Vec<u8>>, TransportError> {
        let mut found = HashMap::with_capacity(keys.len());
        for key in keys {
            match self.get(key) {
                Ok(v) => {
                    found.insert(key.to_string(), v);
                }
                Err(TransportError::KeyMissing) => continue,
                Err(e) => return Err(e),
            }
        }
        Ok(found)
    }

    /// Stores every item, even after a failure. Only the last failure is
    /// reported.
    fn set_multi(&self, items: &[(&str, &[u8])], ttl: Option<u32>) -> Result<(), TransportError> {
        let mut err = None;
        for (key, value) in items {
            if let Err(e) = self.set(key, value, ttl) {
                log::warn!("bulk set failed for key {}: {}", key, e);
                err = Some(e);
            }
        }
        match err {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    /// Deletes every key. A genuine error takes precedence over `KeyMissing`.
    fn delete_multi(&self, keys: &[&str]) -> Result<(), TransportError> {
        let mut err = None;
        for key in keys {
            match self.delete(key) {
                Ok(()) => {}
                Err(TransportError::KeyMissing) => {
                    if err.is_none() {
                        err = Some(TransportError::KeyMissing);
                    }
                }
                Err(e) => {
                    log::warn!("bulk delete failed for key {}: {}", key, e);
                    err = Some(e);
                }
            }
        }
        match err {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    fn add_servers(&self, _servers: &[Server]) -> Result<(), TransportError> {
        Ok(())
    }

    fn set_option(&self, _name: &str, _value: &str) -> Result<(), TransportError> {
        Ok(())
    }

    fn option(&self, _name: &str) -> Option<String> {
        None
    }
}

/// A cache server entry, in the order it was configured.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Server {
    pub host: String,
    pub port: u16,
    #[serde(default = "default_weight")]
    pub weight: u32,
}

fn default_weight() -> u32 {
    1
}

impl Server {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Server {
            host: host.into(),
            port,
            weight: default_weight(),
        }
    }

    pub fn with_weight(mut self, weight: u32) -> Self {
        self.weight = weight;
        self
    }
}

#[derive(Debug)]
pub enum TransportError {
    #[cfg(feature = "memcache")]
    MemCacheError(MemcacheError),
    LockPoisoned,
    NoServers,
    KeyMissing,
}

impl Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            #[cfg(feature = "memcache")]
            TransportError::MemCacheError(e) => std::fmt::Display::fmt(&e, f),
            TransportError::LockPoisoned => write!(f, "mutex poison error"),
            TransportError::NoServers => write!(f, "no servers configured"),
            TransportError::KeyMissing => write!(f, "key missing"),
        }
    }
}

impl Error for TransportError {}

#[cfg(feature = "memcache")]
impl From<MemcacheError> for TransportError {
    fn from(e: MemcacheError) -> Self {
        TransportError::MemCacheError(e)
    }
}
