#![cfg_attr(docsrs, feature(doc_cfg))]
//! # memfacade
//!
//! **memfacade** is a small key-value cache facade over memcached. It validates keys, namespaces them under a prefix, encodes values with `bincode`, and maps the driver's results onto a plain cache contract: `get`, `set`, `delete`, `has`, `clear` and their bulk variants.
//!
//! ## Features
//! - A single `CacheContract` trait for callers
//! - Relative, interval, or point-in-time TTLs
//! - Pluggable transports:
//!   - Local memory
//!   - Memcache (crate feature `memcache`, enabled by default)
//! - Store failures never escape as errors. They read as misses or as `false`.
//!
//! ## Usage
//!
//! ```rust
//! use memfacade::{transport::local::Memory, CacheContract, CacheFacade, FacadeConfig};
//!
//! fn main() {
//!     let cache = CacheFacade::new(Memory::new(), FacadeConfig::new().with_prefix("test."));
//!
//!     assert_eq!(cache.set("a", &"1".to_string(), None).unwrap(), true);
//!     assert_eq!(cache.get("a", String::new()).unwrap(), "1");
//!     assert_eq!(cache.delete("a").unwrap(), true);
//!     assert_eq!(cache.get("a", "miss".to_string()).unwrap(), "miss");
//! }
//! ```
//!
//! ### Memcache
//!
//! **Available on crate feature `memcache` only**
//!
//! Servers and options come from the configuration. The client connects on first use, so building the facade never fails, even when no server is reachable yet.
//!
//! ```rust,ignore
//! let config = FacadeConfig::new()
//!     .with_prefix("app.")
//!     .with_server(Server::new("127.0.0.1", 11211))
//!     .with_option("timeout", "0.5")
//!     .with_option("tcp_nodelay", "true");
//! let cache = CacheFacade::memcached(config);
//!
//! cache.set("session", &session, Some(Ttl::Interval(Duration::from_secs(900))))?;
//! ```
//!
//! Options are passed verbatim to the `memcache` client as URL query parameters. The `prefix_key` option, when set, overrides `prefix`.
//!
//! ## Keys
//!
//! A key must be non-empty, at most 250 bytes, and free of the reserved characters `{}()/\@:`. Every operation validates its keys before talking to the transport, so an invalid key in a batch leaves the store untouched.
//!
//! ## TTL
//!
//! `None` uses the transport default (no expiry for memcached). `Ttl::Seconds`, `Ttl::Interval` and `Ttl::At` are all turned into seconds relative to now. A ttl that ends up at zero or below deletes the key instead of storing it.
//!
//! ## Caveats
//!
//! - `clear` flushes the whole memcached store, not only the keys under this facade's prefix.
//! - `has` is advisory. Another client can change the key right after it returns.
//! - `set_multiple` reports a single boolean. When some keys fail, it is `false`, and the failed keys are logged.
//!
pub mod transport;
pub mod types;

pub use crate::{
    transport::{Server, Transport},
    types::{config::FacadeConfig, ttl::Ttl, CacheContract, CacheError},
};

use crate::{
    transport::TransportError,
    types::{
        decode, encode,
        key::{validate_key, validate_keys},
        ttl,
    },
};
use log::{debug, warn};
use serde::{de::DeserializeOwned, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone)]
pub struct CacheFacade<T> {
    transport: T,
    prefix: String,
}

impl<T: Transport> CacheFacade<T> {
    /// Hands the configured servers and options to `transport`. Anything the
    /// transport refuses is logged and skipped.
    pub fn new(transport: T, config: FacadeConfig) -> Self {
        if !config.servers.is_empty() {
            if let Err(e) = transport.add_servers(&config.servers) {
                warn!("transport refused servers {:?}: {}", config.servers, e);
            }
        }
        for (name, value) in &config.options {
            if let Err(e) = transport.set_option(name, value) {
                warn!("transport refused option {}={}: {}", name, value, e);
            }
        }
        CacheFacade {
            prefix: config.effective_prefix().to_string(),
            transport,
        }
    }

    pub fn builder() -> CacheFacadeBuilder<T> {
        CacheFacadeBuilder {
            transport: None,
            config: FacadeConfig::default(),
        }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    fn prefixed(&self, key: &str) -> String {
        format!("{}{}", self.prefix, key)
    }

    fn expired(ttl: Option<i64>) -> bool {
        matches!(ttl, Some(secs) if secs <= 0)
    }
}

#[cfg(feature = "memcache")]
#[cfg_attr(docsrs, doc(cfg(feature = "memcache")))]
impl CacheFacade<transport::memcache::MemcacheTransport> {
    pub fn memcached(config: FacadeConfig) -> Self {
        CacheFacade::new(transport::memcache::MemcacheTransport::new(), config)
    }
}

impl<T: Transport> CacheContract for CacheFacade<T> {
    fn get<V: DeserializeOwned>(&self, key: &str, default: V) -> Result<V, CacheError> {
        validate_key(key)?;
        match self.transport.get(&self.prefixed(key)) {
            Ok(bytes) => decode(&bytes),
            Err(TransportError::KeyMissing) => {
                debug!("cache miss for key {}", key);
                Ok(default)
            }
            Err(e) => {
                warn!("get failed for key {}: {}", key, e);
                Ok(default)
            }
        }
    }

    fn set<V: Serialize + ?Sized>(
        &self,
        key: &str,
        value: &V,
        ttl: Option<Ttl>,
    ) -> Result<bool, CacheError> {
        validate_key(key)?;
        let ttl = ttl::normalize(ttl);
        if Self::expired(ttl) {
            debug!("ttl {:?} already expired, deleting key {}", ttl, key);
            return self.delete(key);
        }
        let bytes = encode(value)?;
        match self
            .transport
            .set(&self.prefixed(key), &bytes, ttl::transport_ttl(ttl))
        {
            Ok(()) => Ok(true),
            Err(e) => {
                warn!("set failed for key {}: {}", key, e);
                Ok(false)
            }
        }
    }

    fn delete(&self, key: &str) -> Result<bool, CacheError> {
        validate_key(key)?;
        match self.transport.delete(&self.prefixed(key)) {
            Ok(()) | Err(TransportError::KeyMissing) => Ok(true),
            Err(e) => {
                warn!("delete failed for key {}: {}", key, e);
                Ok(false)
            }
        }
    }

    fn clear(&self) -> bool {
        match self.transport.flush() {
            Ok(()) => true,
            Err(e) => {
                warn!("flush failed: {}", e);
                false
            }
        }
    }

    fn has(&self, key: &str) -> Result<bool, CacheError> {
        validate_key(key)?;
        match self.transport.get(&self.prefixed(key)) {
            Ok(_) => Ok(true),
            Err(TransportError::KeyMissing) => Ok(false),
            Err(e) => {
                warn!("has failed for key {}: {}", key, e);
                Ok(false)
            }
        }
    }

    fn get_multiple<I, K, V>(&self, keys: I, default: V) -> Result<HashMap<String, V>, CacheError>
    where
        I: IntoIterator<Item = K>,
        K: AsRef<str>,
        V: DeserializeOwned + Clone,
    {
        let keys = validate_keys(keys)?;
        if keys.is_empty() {
            return Ok(HashMap::new());
        }
        let prefixed = keys.iter().map(|k| self.prefixed(k)).collect::<Vec<_>>();
        let refs = prefixed.iter().map(String::as_str).collect::<Vec<_>>();
        let found = match self.transport.get_multi(&refs) {
            Ok(found) => found,
            Err(e) => {
                warn!("bulk get failed for {} keys: {}", keys.len(), e);
                HashMap::new()
            }
        };

        let mut result = HashMap::with_capacity(keys.len());
        for (key, full) in keys.into_iter().zip(&prefixed) {
            let value = match found.get(full) {
                Some(bytes) => decode(bytes)?,
                None => default.clone(),
            };
            result.insert(key, value);
        }
        Ok(result)
    }

    fn set_multiple<I, K, V>(&self, values: I, ttl: Option<Ttl>) -> Result<bool, CacheError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Serialize,
    {
        let mut pairs = vec![];
        for (key, value) in values {
            validate_key(key.as_ref())?;
            pairs.push((key.as_ref().to_string(), value));
        }
        let ttl = ttl::normalize(ttl);
        if Self::expired(ttl) {
            debug!("ttl {:?} already expired, deleting {} keys", ttl, pairs.len());
            return self.delete_multiple(pairs.iter().map(|(k, _)| k));
        }
        if pairs.is_empty() {
            return Ok(true);
        }

        let mut encoded = Vec::with_capacity(pairs.len());
        for (key, value) in &pairs {
            encoded.push((self.prefixed(key), encode(value)?));
        }
        let items = encoded
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_slice()))
            .collect::<Vec<_>>();
        match self.transport.set_multi(&items, ttl::transport_ttl(ttl)) {
            Ok(()) => Ok(true),
            Err(e) => {
                warn!("bulk set failed for {} keys: {}", items.len(), e);
                Ok(false)
            }
        }
    }

    fn delete_multiple<I, K>(&self, keys: I) -> Result<bool, CacheError>
    where
        I: IntoIterator<Item = K>,
        K: AsRef<str>,
    {
        let keys = validate_keys(keys)?;
        if keys.is_empty() {
            return Ok(true);
        }
        let prefixed = keys.iter().map(|k| self.prefixed(k)).collect::<Vec<_>>();
        let refs = prefixed.iter().map(String::as_str).collect::<Vec<_>>();
        match self.transport.delete_multi(&refs) {
            Ok(()) | Err(TransportError::KeyMissing) => Ok(true),
            Err(e) => {
                warn!("bulk delete failed for {} keys: {}", keys.len(), e);
                Ok(false)
            }
        }
    }
}

pub struct CacheFacadeBuilder<T> {
    transport: Option<T>,
    config: FacadeConfig,
}

impl<T: Transport> CacheFacadeBuilder<T> {
    pub fn with_transport(mut self, transport: T) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Replaces everything configured so far.
    pub fn with_config(mut self, config: FacadeConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.config.prefix = prefix.into();
        self
    }

    pub fn with_server(mut self, server: Server) -> Self {
        self.config.servers.push(server);
        self
    }

    pub fn with_option(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.config.options.insert(name.into(), value.into());
        self
    }

    pub fn build(self) -> CacheFacade<T> {
        match self.transport {
            Some(transport) => CacheFacade::new(transport, self.config),
            None => panic!("no transport specified"),
        }
    }
}
