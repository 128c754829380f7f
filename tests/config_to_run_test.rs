//! A configuration file with TLS and key material on disk drives a full run

use anyhow::Result;
use std::fs;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;
use txstorm_config::{ConfigLoader, TxStormConfig};
use txstorm_core::Ed25519Identity;
use txstorm_pipeline::{Orchestrator, PipelineError, PipelineSettings};
use txstorm_sim::SimNetwork;

const CA_PEM: &str = "-----BEGIN CERTIFICATE-----\nMIIBszCCAVmgAwIBAgIUZ\n-----END CERTIFICATE-----\n";
const SEED_HEX: &str = "0707070707070707070707070707070707070707070707070707070707070707";

const CONFIG: &str = r#"
channel: mychannel
chaincode: basic
version: "1.0"
args: ["CreateAsset", "asset1", "blue", "5", "tom", "100"]
num_of_conn: 2
endorsers:
  - addr: peer0.org1.example.com:7051
    tls_ca_cert: crypto/org1-ca.pem
  - addr: peer0.org2.example.com:9051
    tls_ca_cert: crypto/org2-ca.pem
orderer:
  addr: orderer.example.com:7050
  tls_ca_cert: crypto/orderer-ca.pem
committer:
  addr: peer0.org1.example.com:7051
identity:
  msp_id: Org1MSP
  private_key: crypto/user.key
  sign_cert: crypto/user.pem
pipeline:
  workers: 4
  channel_capacity: 20
  report_interval: 3600
  shutdown_grace: 2
network:
  block_size: 5
  block_timeout_ms: 20
"#;

fn write_fixture(dir: &Path, org2_ca: &str) -> Result<()> {
    let crypto = dir.join("crypto");
    fs::create_dir_all(&crypto)?;
    fs::write(crypto.join("org1-ca.pem"), CA_PEM)?;
    fs::write(crypto.join("org2-ca.pem"), org2_ca)?;
    fs::write(crypto.join("orderer-ca.pem"), CA_PEM)?;
    fs::write(crypto.join("user.key"), format!("{}\n", SEED_HEX))?;
    fs::write(crypto.join("user.pem"), "-----BEGIN CERTIFICATE-----\nuser\n-----END CERTIFICATE-----\n")?;
    fs::write(dir.join("txstorm.yaml"), CONFIG)?;
    Ok(())
}

fn load_identity(config: &TxStormConfig) -> Result<Ed25519Identity> {
    Ok(Ed25519Identity::load(
        config.identity.msp_id.clone(),
        config.identity.private_key.as_deref(),
        config.identity.sign_cert.as_deref(),
    )?)
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_run_from_config_file() -> Result<()> {
    let dir = tempfile::tempdir()?;
    write_fixture(dir.path(), CA_PEM)?;

    let config = ConfigLoader::new().from_file(dir.path().join("txstorm.yaml"))?;
    let identity = load_identity(&config)?;
    assert_eq!(
        identity.public_key(),
        Ed25519Identity::from_seed("Org1MSP", [7u8; 32], None).public_key()
    );

    let settings = PipelineSettings::from_config(&config)?;
    assert_eq!(settings.quorum_threshold(), 2);
    assert!(settings.endorsers.iter().all(|e| !e.tls_ca_cert.is_empty()));
    assert!(!settings.orderer.tls_ca_cert.is_empty());

    let network = Arc::new(SimNetwork::new(config.network.clone()));
    let observer = network.observer(&config.committer.addr);
    let orchestrator =
        Orchestrator::new(settings, Arc::new(identity), network.clone(), Arc::new(observer));

    let summary = timeout(Duration::from_secs(10), orchestrator.run(20)).await??;
    assert_eq!(summary.confirmed, 20);
    assert!(network.ledger().height() >= 4);
    Ok(())
}

#[test]
fn test_ca_bundle_without_certificate_is_rejected() -> Result<()> {
    let dir = tempfile::tempdir()?;
    write_fixture(dir.path(), "not a certificate")?;

    let config = ConfigLoader::new().from_file(dir.path().join("txstorm.yaml"))?;
    let err = PipelineSettings::from_config(&config).unwrap_err();
    assert!(matches!(err, PipelineError::Certificate(_)));
    assert!(err.to_string().contains("org2-ca.pem"));
    Ok(())
}

#[test]
fn test_env_overrides_pool_sizes() -> Result<()> {
    let dir = tempfile::tempdir()?;
    write_fixture(dir.path(), CA_PEM)?;
    let path = dir.path().join("txstorm.yaml");

    let config = temp_env::with_vars(
        [
            ("TXSTORM_WORKERS", Some("16")),
            ("TXSTORM_NUM_OF_CONN", Some("3")),
        ],
        || ConfigLoader::new().from_file(&path),
    )?;

    let settings = PipelineSettings::from_config(&config)?.with_workers(32);
    assert_eq!(config.pipeline.workers, 16);
    assert_eq!(settings.workers, 32);
    assert_eq!(settings.num_of_conn, 3);
    Ok(())
}
