//! nildb-node entry point.
//!
//! Boots the capability engine, the shared `AppState`, and the minimal
//! `axum` router (§6.1) over an in-memory [`nildb_node::store::MemoryStore`]
//! — the degraded, non-persistent mode named in SPEC_FULL §B.1. A
//! production deployment supplies its own `DocumentStore`,
//! `RevocationClient` and signing key management; main.rs never reaches
//! into those subsystems' internals directly.

use std::process;
use std::sync::Arc;

use chrono::Utc;
use clap::{Parser, Subcommand};
use k256::ecdsa::{SigningKey, VerifyingKey};
use k256::SecretKey;

use nildb_node::capability::{CapabilityEngine, K256Verifier, NullRevocationClient};
use nildb_node::config::NodeConfig;
use nildb_node::entities::{BuilderRepo, UserRepo};
use nildb_node::http::{self, AppState};
use nildb_node::ids::Did;
use nildb_node::store::{DocumentStore, MemoryStore};
use nildb_node::system::logger::{self, Severity};

#[derive(Parser, Debug)]
#[command(name = "nildb-node")]
#[command(version, about = "Capability-gated document service node", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Boot the node and serve the HTTP surface.
    Serve,
    /// Print the node's derived DID and exit.
    Whoami,
}

fn node_did(config: &NodeConfig) -> Result<Did, String> {
    let key_bytes = hex::decode(&config.node_secret_key)
        .map_err(|e| format!("node_secret_key is not valid hex: {e}"))?;
    let secret_key = SecretKey::from_slice(&key_bytes)
        .map_err(|e| format!("node_secret_key is not a valid secp256k1 scalar: {e}"))?;
    let signing_key = SigningKey::from(secret_key);
    let verifying_key = VerifyingKey::from(&signing_key);
    let key_hex = hex::encode(verifying_key.to_encoded_point(true).as_bytes());
    Did::parse(&format!("did:nil:{key_hex}")).map_err(|e| e.to_string())
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    if let Err(message) = run(cli.command).await {
        logger::log(Severity::Error, "NODE_FATAL", &[("message", &message)]);
        eprintln!("{message}");
        process::exit(1);
    }
}

async fn run(command: Command) -> Result<(), String> {
    let config = NodeConfig::from_env();
    logger::set_level(match config.log_level {
        nildb_node::config::LogLevel::Debug => Severity::Debug,
        nildb_node::config::LogLevel::Info => Severity::Info,
        nildb_node::config::LogLevel::Warn => Severity::Warn,
        nildb_node::config::LogLevel::Error => Severity::Error,
    });

    let node_did = node_did(&config)?;

    match command {
        Command::Whoami => {
            println!("{node_did}");
            Ok(())
        }
        Command::Serve => serve(config, node_did).await,
    }
}

async fn serve(config: NodeConfig, node_did: Did) -> Result<(), String> {
    let started = Utc::now();
    let store: Arc<dyn DocumentStore> = Arc::new(MemoryStore::new());

    let builders = Arc::new(BuilderRepo::new(store.clone()));
    let users = Arc::new(UserRepo::new(store.clone()));
    let capability = Arc::new(CapabilityEngine::new(
        node_did.clone(),
        config.trust_anchor_public_key.clone(),
        Arc::new(K256Verifier),
        Arc::new(NullRevocationClient),
        builders,
        users,
    ));

    let web_port = config.web_port;
    let state = AppState::new(store, &config, capability, started);
    let app = http::router(state);

    logger::log(
        Severity::Info,
        "NODE_STARTING",
        &[("did", &node_did.to_string()), ("port", &web_port.to_string())],
    );

    let listener = tokio::net::TcpListener::bind(("0.0.0.0", web_port))
        .await
        .map_err(|e| format!("failed to bind port {web_port}: {e}"))?;
    axum::serve(listener, app)
        .await
        .map_err(|e| format!("server error: {e}"))
}
