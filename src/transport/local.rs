use super::{Transport, TransportError};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

#[derive(Debug, Clone)]
struct Entry {
    value: Vec<u8>,
    expires_at: Option<Instant>,
}

impl Entry {
    fn is_expired(&self, now: Instant) -> bool {
        matches!(self.expires_at, Some(at) if at <= now)
    }
}

/// An in-process transport backed by a `HashMap`.
///
/// Clones share the same map. Expired entries are dropped lazily on access.
#[derive(Debug, Clone, Default)]
pub struct Memory {
    map: Arc<Mutex<HashMap<String, Entry>>>,
    options: Arc<Mutex<HashMap<String, String>>>,
}

impl Memory {
    pub fn new() -> Self {
        Memory::default()
    }

    /// Number of live entries.
    pub fn len(&self) -> usize {
        let now = Instant::now();
        match self.map.lock() {
            Ok(m) => m.values().filter(|e| !e.is_expired(now)).count(),
            Err(_) => 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Transport for Memory {
    fn get(&self, key: &str) -> Result<Vec<u8>, TransportError> {
        let now = Instant::now();
        match self.map.lock() {
            Ok(mut m) => match m.get(key) {
                Some(e) if e.is_expired(now) => {
                    m.remove(key);
                    Err(TransportError::KeyMissing)
                }
                Some(e) => Ok(e.value.clone()),
                None => Err(TransportError::KeyMissing),
            },
            Err(_) => Err(TransportError::LockPoisoned),
        }
    }

    fn set(&self, key: &str, value: &[u8], ttl: Option<u32>) -> Result<(), TransportError> {
        let expires_at = match ttl {
            Some(0) | None => None,
            Some(secs) => Some(Instant::now() + Duration::from_secs(secs.into())),
        };
        match self.map.lock() {
            Ok(mut m) => {
                m.insert(
                    key.to_string(),
                    Entry {
                        value: value.to_vec(),
                        expires_at,
                    },
                );
                Ok(())
            }
            Err(_) => Err(TransportError::LockPoisoned),
        }
    }

    fn delete(&self, key: &str) -> Result<(), TransportError> {
        let now = Instant::now();
        match self.map.lock() {
            Ok(mut m) => match m.remove(key) {
                Some(e) if !e.is_expired(now) => Ok(()),
                _ => Err(TransportError::KeyMissing),
            },
            Err(_) => Err(TransportError::LockPoisoned),
        }
    }

    fn flush(&self) -> Result<(), TransportError> {
        match self.map.lock() {
            Ok(mut m) => {
                m.clear();
                Ok(())
            }
            Err(_) => Err(TransportError::LockPoisoned),
        }
    }

    fn set_option(&self, name: &str, value: &str) -> Result<(), TransportError> {
        match self.options.lock() {
            Ok(mut o) => {
                o.insert(name.to_string(), value.to_string());
                Ok(())
            }
            Err(_) => Err(TransportError::LockPoisoned),
        }
    }

    fn option(&self, name: &str) -> Option<String> {
        self.options.lock().ok()?.get(name).cloned()
    }
}
