use anyhow::{Context, Result};
use serde_json::{json, Map, Value};
use std::path::Path;
use std::time::Duration;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use rust_request_manager::config::{self, ManagerConfig};
use rust_request_manager::env::EnvOverrides;
use rust_request_manager::models::{AccountBalanceRequest, PingRequest};
use rust_request_manager::transport::{channel_transport, Client, RemoteEnd};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args: Vec<String> = std::env::args().collect();
    if let (Some("--init-config"), Some(path)) = (args.get(1).map(|s| s.as_str()), args.get(2)) {
        return config::create_default_config_file(Path::new(path));
    }

    let mut config = match config::load_config() {
        Ok(config) => config,
        Err(e) => {
            warn!("Using default configuration: {}", e);
            ManagerConfig::default()
        }
    };
    EnvOverrides::load()
        .context("Invalid request manager environment overrides")?
        .apply(&mut config);

    let (transport, inbound, remote) = channel_transport();
    let client = Client::new(transport, config.build_manager(), config.default_timeout());

    let peer = tokio::spawn(loopback_peer(remote));
    let pump = tokio::spawn(client.pump().run(inbound));

    match client.request(AccountBalanceRequest::new("rAlice")).await {
        Ok(balance) => info!(amount = %balance.amount, "Balance for rAlice"),
        Err(e) => error!(error = %e, "Balance request failed"),
    }

    match client.request(AccountBalanceRequest::new("rNobody")).await {
        Ok(balance) => info!(amount = %balance.amount, "Balance for rNobody"),
        Err(e) => info!(error = %e, "Balance request rejected as expected"),
    }

    let silent = AccountBalanceRequest {
        command: "silent".to_string(),
        ..AccountBalanceRequest::new("rAlice")
    };
    match client.request_with_timeout(silent, Duration::from_millis(200)).await {
        Ok(_) => warn!("Silent request unexpectedly answered"),
        Err(e) => info!(error = %e, "Silent request gave up"),
    }

    client.request(PingRequest::default()).await.context("Ping failed")?;
    info!("Ping answered");

    // Ask the peer to hang up while one request is still outstanding.
    let mut hang_up = Map::new();
    hang_up.insert("command".to_string(), json!("hang_up"));
    match client.request_json(hang_up).await {
        Ok(value) => warn!(%value, "Hang-up unexpectedly answered"),
        Err(e) => info!(error = %e, "Outstanding request rejected on teardown"),
    }

    peer.await.context("Loopback peer panicked")?;
    pump.await.context("Response pump panicked")?;
    Ok(())
}

/// Answers requests the way a ledger node would, until told to hang up.
async fn loopback_peer(mut remote: RemoteEnd) {
    while let Some(text) = remote.requests.recv().await {
        let request: Value = match serde_json::from_str(&text) {
            Ok(request) => request,
            Err(e) => {
                error!("Peer received invalid JSON: {}", e);
                continue;
            }
        };
        let id = request["id"].clone();

        let response = match request["command"].as_str() {
            Some("account_balance") if request["account"] == "rAlice" => json!({
                "id": id, "status": "success", "type": "response",
                "result": {"amount": "100"}
            }),
            Some("account_balance") => json!({
                "id": id, "status": "error", "type": "response",
                "error": "actNotFound", "errorMessage": "Account not found."
            }),
            Some("ping") => json!({"id": id, "status": "success", "result": {}}),
            Some("silent") => continue,
            Some("hang_up") => break,
            _ => json!({"id": id, "status": "error", "error": "unknownCmd"}),
        };

        if remote.responses.send(response.to_string()).is_err() {
            break;
        }
    }
    info!("Loopback peer closed the connection");
}
