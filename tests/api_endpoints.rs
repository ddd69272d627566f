//! Integration tests for the StakeChain REST API
//!
//! Each test builds a seeded ledger, mounts the router on an in-process
//! test server and drives it through HTTP only.

use axum_test::TestServer;
use serde_json::{json, Value};
use std::sync::Arc;
use tokio::sync::RwLock;
use stakechain::api::{build_api_router, ApiNode};
use stakechain::config::{Config, ConsensusConfig};
use stakechain::ledger::Ledger;
use stakechain::node::NodeState;

fn server_with_state(state: NodeState) -> TestServer {
    let config = Config {
        consensus: ConsensusConfig { rng_seed: Some(99) },
        ..Config::default()
    };
    let ledger = Ledger::from_config(&config).expect("Failed to build ledger");
    let api_node = Arc::new(ApiNode::new_shared(
        Arc::new(RwLock::new(ledger)),
        Some(Arc::new(RwLock::new(state))),
    ));
    TestServer::new(build_api_router(api_node)).expect("Failed to create test server")
}

fn server() -> TestServer {
    server_with_state(NodeState::Ready)
}

#[tokio::test]
async fn test_health_and_chain_info() {
    let server = server();

    let response = server.get("/api/health").await;
    assert_eq!(response.status_code(), 200);
    let json: Value = response.json();
    assert_eq!(json["status"], "healthy");
    assert!(json["timestamp"].is_string());

    let response = server.get("/api/blockchain/height").await;
    assert_eq!(response.status_code(), 200);
    let height: u64 = response.json();
    assert_eq!(height, 1); // Genesis block

    let json: Value = server.get("/api/blockchain/info").await.json();
    assert_eq!(json["length"], 1);
    assert_eq!(json["isValid"], true);
    assert_eq!(json["validatorCount"], 3);
    assert_eq!(json["latestBlock"]["previousHash"], "0");
}

#[tokio::test]
async fn test_health_reports_degraded_node() {
    let server = server_with_state(NodeState::Degraded);
    let response = server.get("/api/health").await;
    assert_eq!(response.status_code(), 503);
    let json: Value = response.json();
    assert_eq!(json["status"], "unhealthy");
}

#[tokio::test]
async fn test_transfer_flow() {
    let server = server();

    // Unfunded sender
    let response = server
        .post("/api/transaction")
        .json(&json!({"from": "alice", "to": "bob", "amount": 10}))
        .await;
    assert_eq!(response.status_code(), 400);
    let json: Value = response.json();
    assert_eq!(json["kind"], "InsufficientBalance");
    assert_eq!(json["error"], "Insufficient balance: 0 < 10");

    let response = server
        .post("/api/faucet")
        .json(&json!({"address": "alice", "amount": 10}))
        .await;
    assert_eq!(response.status_code(), 201);

    let response = server.post("/api/blocks/process").await;
    assert_eq!(response.status_code(), 200);
    let processed: Value = response.json();
    assert_eq!(processed["index"], 1);
    assert_eq!(processed["transactions"], 1);

    let response = server
        .post("/api/transaction")
        .json(&json!({"from": "alice", "to": "bob", "amount": 10}))
        .await;
    assert_eq!(response.status_code(), 201);
    let tx: Value = response.json();
    let id = tx["id"].as_str().unwrap().to_string();

    let lookup: Value = server.get(&format!("/api/transaction/{}", id)).await.json();
    assert_eq!(lookup["status"], "pending");

    server.post("/api/blocks/process").await;

    let lookup: Value = server.get(&format!("/api/transaction/{}", id)).await.json();
    assert_eq!(lookup["status"], "committed");
    assert_eq!(lookup["blockIndex"], 2);

    let balance: Value = server.get("/api/address/bob/balance").await.json();
    assert_eq!(balance["balance"], 10);
    let balance: Value = server.get("/api/address/alice/balance").await.json();
    assert_eq!(balance["balance"], 0);

    let history: Value = server.get("/api/address/alice/transactions").await.json();
    assert_eq!(history["count"], 2);

    let height: u64 = server.get("/api/blockchain/height").await.json();
    assert_eq!(height, 3);
}

#[tokio::test]
async fn test_process_without_pending_is_rejected() {
    let server = server();
    let response = server.post("/api/blocks/process").await;
    assert_eq!(response.status_code(), 400);
    let json: Value = response.json();
    assert_eq!(json["kind"], "EmptyPool");
}

#[tokio::test]
async fn test_not_found_responses() {
    let server = server();

    let response = server.get("/api/blockchain/block/42").await;
    assert_eq!(response.status_code(), 404);
    let json: Value = response.json();
    assert_eq!(json["kind"], "BlockNotFound");

    let response = server.get("/api/transaction/nope").await;
    assert_eq!(response.status_code(), 404);

    let response = server.delete("/api/validators/ghost").await;
    assert_eq!(response.status_code(), 404);
    let json: Value = response.json();
    assert_eq!(json["kind"], "ValidatorNotFound");
}

#[tokio::test]
async fn test_blocks_pagination() {
    let server = server();
    for n in 1..=3 {
        server
            .post("/api/faucet")
            .json(&json!({"address": "alice", "amount": n}))
            .await;
        server.post("/api/blocks/process").await;
    }

    let json: Value = server.get("/api/blockchain/blocks?page=0&limit=2").await.json();
    assert_eq!(json["total"], 4);
    let blocks = json["blocks"].as_array().unwrap();
    assert_eq!(blocks.len(), 2);
    assert_eq!(blocks[0]["index"], 3);

    let response = server.get("/api/blockchain/blocks?limit=0").await;
    assert_eq!(response.status_code(), 400);
}

#[tokio::test]
async fn test_mempool_audit_and_evict() {
    let server = server();
    server
        .post("/api/faucet")
        .json(&json!({"address": "alice", "amount": 10}))
        .await;
    server.post("/api/blocks/process").await;

    // Pending issuance is never an overdraft.
    server
        .post("/api/faucet")
        .json(&json!({"address": "dave", "amount": 5}))
        .await;
    let audit: Value = server.get("/api/mempool/audit").await.json();
    assert_eq!(audit["valid"], true);

    for to in ["bob", "carol"] {
        let response = server
            .post("/api/transaction")
            .json(&json!({"from": "alice", "to": to, "amount": 8}))
            .await;
        assert_eq!(response.status_code(), 201);
    }

    let json: Value = server.get("/api/mempool").await.json();
    assert_eq!(json["count"], 3);
    let second = json["transactions"][2]["id"].as_str().unwrap().to_string();

    let audit: Value = server.get("/api/mempool/audit").await.json();
    assert_eq!(audit["valid"], false);
    assert_eq!(audit["invalidTransactions"], json!([second]));
    assert_eq!(audit["errors"][0], "Insufficient balance: 2 < 8");

    let json: Value = server
        .post("/api/mempool/evict")
        .json(&json!({"ids": [second]}))
        .await
        .json();
    assert_eq!(json["removed"], 1);

    let json: Value = server.get("/api/mempool").await.json();
    assert_eq!(json["count"], 2);
    let audit: Value = server.get("/api/mempool/audit").await.json();
    assert_eq!(audit["valid"], true);
}

#[tokio::test]
async fn test_full_range_values_are_rejected_not_fatal() {
    let server = server();

    let response = server
        .post("/api/faucet")
        .json(&json!({"address": "alice", "amount": i64::MAX}))
        .await;
    assert_eq!(response.status_code(), 201);
    let response = server
        .post("/api/faucet")
        .json(&json!({"address": "alice", "amount": i64::MAX}))
        .await;
    assert_eq!(response.status_code(), 400);
    let json: Value = response.json();
    assert_eq!(json["kind"], "InvalidTransaction");

    server.post("/api/blocks/process").await;
    let balance: Value = server.get("/api/address/alice/balance").await.json();
    assert_eq!(balance["balance"], i64::MAX);

    let response = server
        .post("/api/validators")
        .json(&json!({"name": "Whale", "stake": u64::MAX}))
        .await;
    assert_eq!(response.status_code(), 400);
    let json: Value = response.json();
    assert_eq!(json["kind"], "StakeOverflow");

    let response = server.get("/api/validators/stats").await;
    assert_eq!(response.status_code(), 200);
    let stats: Value = response.json();
    assert_eq!(stats["network"]["totalStake"], 14_500);
}

#[tokio::test]
async fn test_validator_lifecycle() {
    let server = server();

    let response = server
        .post("/api/validators")
        .json(&json!({"name": "Epsilon", "stake": 999}))
        .await;
    assert_eq!(response.status_code(), 400);
    let json: Value = response.json();
    assert_eq!(json["kind"], "StakeTooLow");

    let response = server
        .post("/api/validators")
        .json(&json!({"name": "Epsilon", "stake": 1000}))
        .await;
    assert_eq!(response.status_code(), 201);
    let validator: Value = response.json();
    let id = validator["id"].as_str().unwrap().to_string();
    assert_eq!(validator["reputation"], 100);

    let validators: Value = server.get("/api/validators").await.json();
    assert_eq!(validators.as_array().unwrap().len(), 5);

    let penalized: Value = server
        .post(&format!("/api/validators/{}/penalize", id))
        .json(&json!({"amount": 60}))
        .await
        .json();
    assert_eq!(penalized["reputation"], 40);
    assert_eq!(penalized["isActive"], false);

    let stats: Value = server.get("/api/validators/stats").await.json();
    assert_eq!(stats["network"]["totalValidators"], 5);
    assert_eq!(stats["network"]["activeValidators"], 4);

    let consensus: Value = server.get("/api/consensus").await.json();
    assert_eq!(consensus["algorithm"], "Tower BFT (simplified)");
    assert_eq!(consensus["requiredVotes"], 3);

    let response = server.delete(&format!("/api/validators/{}", id)).await;
    assert_eq!(response.status_code(), 204);
    let validators: Value = server.get("/api/validators").await.json();
    assert_eq!(validators.as_array().unwrap().len(), 4);
}

#[tokio::test]
async fn test_wallet_create_and_stats() {
    let server = server();

    let wallet: Value = server
        .post("/api/wallet/create")
        .json(&json!({"name": "taro"}))
        .await
        .json();
    assert!(wallet["address"].as_str().unwrap().starts_with("taro_"));
    assert!(wallet["publicKey"].is_string());

    let wallet: Value = server.post("/api/wallet/create").await.json();
    assert_eq!(wallet["address"].as_str().unwrap().len(), 32);

    let stats: Value = server.get("/api/stats").await.json();
    assert!(stats["totalRequests"].as_u64().unwrap() >= 2);
    assert!(stats["uptimeSeconds"].is_number());
}
