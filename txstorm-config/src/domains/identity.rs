//! Client identity configuration

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::ConfigResult;
use crate::validation::{validate_required_string, Validatable};

/// Where the client's signing material lives
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentityConfig {
    /// Membership service provider id
    pub msp_id: String,

    /// Hex encoded ed25519 seed; an ephemeral key is used when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub private_key: Option<PathBuf>,

    /// Signing certificate used as the creator identity
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sign_cert: Option<PathBuf>,
}

impl Default for IdentityConfig {
    fn default() -> Self {
        Self {
            msp_id: "Org1MSP".to_string(),
            private_key: None,
            sign_cert: None,
        }
    }
}

impl IdentityConfig {
    pub(crate) fn resolve_paths(&mut self, base: &Path) {
        for path in [self.private_key.as_mut(), self.sign_cert.as_mut()]
            .into_iter()
            .flatten()
        {
            if path.is_relative() {
                *path = base.join(&*path);
            }
        }
    }
}

impl Validatable for IdentityConfig {
    fn validate(&self) -> ConfigResult<()> {
        validate_required_string(&self.msp_id, "msp_id", self.domain_name())
    }

    fn domain_name(&self) -> &'static str {
        "identity"
    }
}
