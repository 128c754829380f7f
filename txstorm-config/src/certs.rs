//! TLS CA certificate loading

use std::path::Path;

use crate::error::{ConfigError, ConfigResult};

const PEM_CERT_HEADER: &str = "-----BEGIN CERTIFICATE-----";

/// Read a PEM encoded CA bundle, rejecting files without a certificate block
pub fn load_tls_ca_cert(path: impl AsRef<Path>) -> ConfigResult<Vec<u8>> {
    let path = path.as_ref();
    let bytes = std::fs::read(path).map_err(|e| ConfigError::CertificateError {
        path: path.display().to_string(),
        message: e.to_string(),
    })?;

    if !String::from_utf8_lossy(&bytes).contains(PEM_CERT_HEADER) {
        return Err(ConfigError::CertificateError {
            path: path.display().to_string(),
            message: "no PEM certificate block found".to_string(),
        });
    }

    Ok(bytes)
}
