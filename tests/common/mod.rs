#![allow(dead_code)]

use memfacade::transport::{local::Memory, Server, Transport, TransportError};
use std::collections::{HashMap, HashSet};
use std::sync::{
    atomic::{AtomicBool, AtomicUsize, Ordering},
    Arc, Mutex,
};

/// Wraps `Memory`, counting every call that reaches it. When `failing` is set,
/// every store operation errors as if the server were down. Keys passed to
/// `fail_key` error the same way on their own.
#[derive(Clone, Default)]
pub struct Recording {
    pub inner: Memory,
    calls: Arc<AtomicUsize>,
    failing: Arc<AtomicBool>,
    failing_keys: Arc<Mutex<HashSet<String>>>,
    pub servers: Arc<Mutex<Vec<Server>>>,
}

impl Recording {
    pub fn new() -> Self {
        Recording::default()
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn fail(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn fail_key(&self, key: &str) {
        self.failing_keys.lock().unwrap().insert(key.to_string());
    }

    fn check(&self, keys: &[&str]) -> Result<(), TransportError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.failing.load(Ordering::SeqCst) {
            return Err(TransportError::NoServers);
        }
        let failing_keys = self.failing_keys.lock().unwrap();
        match keys.iter().any(|k| failing_keys.contains(*k)) {
            true => Err(TransportError::NoServers),
            false => Ok(()),
        }
    }
}

impl Transport for Recording {
    fn get(&self, key: &str) -> Result<Vec<u8>, TransportError> {
        self.check(&[key])?;
        self.inner.get(key)
    }

    fn set(&self, key: &str, value: &[u8], ttl: Option<u32>) -> Result<(), TransportError> {
        self.check(&[key])?;
        self.inner.set(key, value, ttl)
    }

    fn delete(&self, key: &str) -> Result<(), TransportError> {
        self.check(&[key])?;
        self.inner.delete(key)
    }

    fn flush(&self) -> Result<(), TransportError> {
        self.check(&[])?;
        self.inner.flush()
    }

    fn get_multi(&self, keys: &[&str]) -> Result<HashMap<String, Vec<u8>>, TransportError> {
        self.check(keys)?;
        self.inner.get_multi(keys)
    }

    fn add_servers(&self, servers: &[Server]) -> Result<(), TransportError> {
        self.servers.lock().unwrap().extend_from_slice(servers);
        Ok(())
    }

    fn set_option(&self, name: &str, value: &str) -> Result<(), TransportError> {
        self.inner.set_option(name, value)
    }

    fn option(&self, name: &str) -> Option<String> {
        self.inner.option(name)
    }
}

pub fn encoded<V: serde::Serialize>(value: &V) -> Vec<u8> {
    bincode::serialize(value).unwrap()
}
