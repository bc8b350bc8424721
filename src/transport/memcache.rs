use super::{Server, Transport, TransportError};
use crate::types::config::PREFIX_KEY_OPTION;
use log::debug;
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex};
use std::time::{SystemTime, UNIX_EPOCH};

/// memcached reads any expiration above 30 days as a unix timestamp.
const MAX_RELATIVE_EXPIRATION: u32 = 60 * 60 * 24 * 30;

#[derive(Default)]
struct State {
    servers: Vec<Server>,
    options: BTreeMap<String, String>,
    client: Option<memcache::Client>,
}

impl State {
    fn urls(&self) -> Vec<String> {
        let query = self
            .options
            .iter()
            .filter(|(name, _)| name.as_str() != PREFIX_KEY_OPTION)
            .map(|(name, value)| format!("{}={}", name, value))
            .collect::<Vec<_>>()
            .join("&");
        self.servers
            .iter()
            .map(|s| match query.is_empty() {
                true => format!("memcache://{}:{}", s.host, s.port),
                false => format!("memcache://{}:{}?{}", s.host, s.port, query),
            })
            .collect()
    }
}

/// A transport over a `memcache::Client`.
///
/// The client is built on first use from the configured servers and options,
/// and rebuilt after either changes. Options are passed through as URL query
/// parameters of every server (`timeout`, `tcp_nodelay`, `protocol`, ...).
///
/// Connecting holds the transport's lock, so every clone waits on it. Without a
/// `timeout` option an unresponsive server can stall that for about 30 seconds;
/// set one (for example `timeout=1`) in production.
#[derive(Clone, Default)]
pub struct MemcacheTransport {
    state: Arc<Mutex<State>>,
}

impl MemcacheTransport {
    pub fn new() -> Self {
        MemcacheTransport::default()
    }

    /// Wraps an already connected client. Adding servers or options later
    /// replaces it with one built from the configured servers.
    pub fn from_client(client: memcache::Client) -> Self {
        MemcacheTransport {
            state: Arc::new(Mutex::new(State {
                client: Some(client),
                ..State::default()
            })),
        }
    }

    pub fn servers(&self) -> Vec<Server> {
        match self.state.lock() {
            Ok(s) => s.servers.clone(),
            Err(_) => vec![],
        }
    }

    fn client(&self) -> Result<memcache::Client, TransportError> {
        let mut state = self.state.lock().map_err(|_| TransportError::LockPoisoned)?;
        if let Some(client) = &state.client {
            return Ok(client.clone());
        }
        if state.servers.is_empty() {
            return Err(TransportError::NoServers);
        }
        let urls = state.urls();
        debug!("connecting to memcached servers {:?}", urls);
        let client = memcache::Client::connect(urls)?;
        state.client = Some(client.clone());
        Ok(client)
    }
}

fn expiration(ttl: Option<u32>) -> u32 {
    match ttl {
        None => 0,
        Some(secs) if secs > MAX_RELATIVE_EXPIRATION => {
            let now = SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .map(|d| d.as_secs())
                .unwrap_or(0);
            u32::try_from(now + u64::from(secs)).unwrap_or(u32::MAX)
        }
        Some(secs) => secs,
    }
}

impl Transport for MemcacheTransport {
    fn get(&self, key: &str) -> Result<Vec<u8>, TransportError> {
        match self.client()?.get::<Vec<u8>>(key) {
            Ok(Some(v)) => Ok(v),
            Ok(None) => Err(TransportError::KeyMissing),
            Err(e) => Err(TransportError::MemCacheError(e)),
        }
    }

    fn set(&self, key: &str, value: &[u8], ttl: Option<u32>) -> Result<(), TransportError> {
        self.client()?
            .set(key, value, expiration(ttl))
            .map_err(TransportError::MemCacheError)
    }

    fn delete(&self, key: &str) -> Result<(), TransportError> {
        match self.client()?.delete(key) {
            Ok(true) => Ok(()),
            Ok(false) => Err(TransportError::KeyMissing),
            Err(e) => Err(TransportError::MemCacheError(e)),
        }
    }

    fn flush(&self) -> Result<(), TransportError> {
        self.client()?.flush().map_err(TransportError::MemCacheError)
    }

    fn get_multi(&self, keys: &[&str]) -> Result<HashMap<String, Vec<u8>>, TransportError> {
        self.client()?
            .gets::<Vec<u8>>(keys)
            .map_err(TransportError::MemCacheError)
    }

    fn add_servers(&self, servers: &[Server]) -> Result<(), TransportError> {
        let mut state = self.state.lock().map_err(|_| TransportError::LockPoisoned)?;
        for server in servers {
            if server.weight != 1 {
                debug!(
                    "server {}:{} has weight {}, memcache hashing ignores weights",
                    server.host, server.port, server.weight
                );
            }
            state.servers.push(server.clone());
        }
        state.client = None;
        Ok(())
    }

    fn set_option(&self, name: &str, value: &str) -> Result<(), TransportError> {
        let mut state = self.state.lock().map_err(|_| TransportError::LockPoisoned)?;
        state.options.insert(name.to_string(), value.to_string());
        if !state.servers.is_empty() {
            state.client = None;
        }
        Ok(())
    }

    fn option(&self, name: &str) -> Option<String> {
        self.state.lock().ok()?.options.get(name).cloned()
    }
}
