use crate::transport::Server;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Option name that, when present, overrides [`FacadeConfig::prefix`].
pub const PREFIX_KEY_OPTION: &str = "prefix_key";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FacadeConfig {
    /// Namespace prepended to every key sent to the transport.
    pub prefix: String,
    /// Added to the transport's server list, in order.
    pub servers: Vec<Server>,
    /// Transport specific options, applied verbatim.
    pub options: BTreeMap<String, String>,
}

impl FacadeConfig {
    pub fn new() -> Self {
        FacadeConfig::default()
    }

    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    pub fn with_server(mut self, server: Server) -> Self {
        self.servers.push(server);
        self
    }

    pub fn with_option(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.options.insert(name.into(), value.into());
        self
    }

    /// The prefix actually applied to keys.
    pub fn effective_prefix(&self) -> &str {
        match self.options.get(PREFIX_KEY_OPTION) {
            Some(p) => p.as_str(),
            None => self.prefix.as_str(),
        }
    }
}
