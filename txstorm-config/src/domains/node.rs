//! Remote node endpoints

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::certs::load_tls_ca_cert;
use crate::error::ConfigResult;
use crate::validation::{validate_required_string, Validatable};

/// Address of a peer or orderer together with the CA that signed its TLS cert
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeConfig {
    /// `host:port` of the node
    pub addr: String,

    /// PEM CA bundle used to verify the node; plaintext when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tls_ca_cert: Option<PathBuf>,
}

impl NodeConfig {
    pub fn new(addr: impl Into<String>) -> Self {
        Self {
            addr: addr.into(),
            tls_ca_cert: None,
        }
    }

    /// Load the CA bundle, or an empty buffer for plaintext connections
    pub fn load_ca_cert(&self) -> ConfigResult<Vec<u8>> {
        match &self.tls_ca_cert {
            Some(path) => load_tls_ca_cert(path),
            None => Ok(Vec::new()),
        }
    }

    pub(crate) fn resolve_paths(&mut self, base: &Path) {
        if let Some(path) = self.tls_ca_cert.as_mut() {
            if path.is_relative() {
                *path = base.join(&*path);
            }
        }
    }
}

impl Validatable for NodeConfig {
    fn validate(&self) -> ConfigResult<()> {
        validate_required_string(&self.addr, "addr", self.domain_name())
    }

    fn domain_name(&self) -> &'static str {
        "node"
    }
}
