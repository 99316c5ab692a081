//! The host-facing HTTP API served on a loopback port.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;

use trustedcoin::config::FeeShape;
use trustedcoin::http::{ChainInfoResponse, HttpServer, RawBlockResponse, UtxoResponse};
use trustedcoin::lifecycle::Shutdown;
use trustedcoin::chain::BroadcastResult;

mod common;
use common::{chain, engine, MockProviders};

async fn start_api(esplora: Vec<String>, shape: FeeShape) -> (SocketAddr, Shutdown) {
    let server = HttpServer::new(Arc::new(engine(esplora, None)), shape, Duration::from_secs(30));
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let shutdown = Shutdown::new();
    tokio::spawn(server.run(listener, shutdown.subscribe()));
    (addr, shutdown)
}

#[tokio::test]
async fn test_getrawblockbyheight() {
    let mock = MockProviders::start().await;
    let blocks = chain(2);
    mock.serve_block("a", 1, &blocks[1]);
    let (addr, _shutdown) = start_api(vec![mock.base("a")], FeeShape::FeerateTable).await;

    let found: RawBlockResponse = reqwest::get(format!("http://{}/getrawblockbyheight/1", addr))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(found.blockhash, Some(blocks[1].block_hash().to_string()));
    assert_eq!(found.block.unwrap().len(), bitcoin::consensus::serialize(&blocks[1]).len() * 2);

    let missing: RawBlockResponse = reqwest::get(format!("http://{}/getrawblockbyheight/5", addr))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(missing.blockhash, None);
    assert_eq!(missing.block, None);
}

#[tokio::test]
async fn test_getchaininfo() {
    let mock = MockProviders::start().await;
    mock.respond("a", "GET", "/blocks/tip/height", 200, "123");
    let (addr, _shutdown) = start_api(vec![mock.base("a")], FeeShape::FeerateTable).await;

    let info: ChainInfoResponse = reqwest::get(format!("http://{}/getchaininfo", addr))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(info.chain, "main");
    assert_eq!(info.headercount, 123);
    assert_eq!(info.blockcount, 123);
    assert!(!info.ibd);
}

#[tokio::test]
async fn test_getchaininfo_failure_is_bad_gateway() {
    let mock = MockProviders::start().await;
    let (addr, _shutdown) = start_api(vec![mock.base("a")], FeeShape::FeerateTable).await;

    let response = reqwest::get(format!("http://{}/getchaininfo", addr)).await.unwrap();
    assert_eq!(response.status(), reqwest::StatusCode::BAD_GATEWAY);
}

#[tokio::test]
async fn test_estimatefees_shapes() {
    let mock = MockProviders::start().await;
    mock.respond("a", "GET", "/fee-estimates", 200, r#"{"2": 3.0, "5": 2.0, "10": 1.5, "504": 1.0}"#);

    let (addr, _shutdown) = start_api(vec![mock.base("a")], FeeShape::FeerateTable).await;
    let table: serde_json::Value = reqwest::get(format!("http://{}/estimatefees", addr))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(table["feerate_floor"], 1000);
    assert_eq!(table["feerates"][0]["blocks"], 2);
    assert_eq!(table["feerates"][0]["feerate"], 3000);

    let (addr, _shutdown) = start_api(vec![mock.base("a")], FeeShape::Channel).await;
    let channel: serde_json::Value = reqwest::get(format!("http://{}/estimatefees", addr))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(channel["opening"], 1000);
    assert_eq!(channel["penalty"], 2000);
    assert_eq!(channel["min_acceptable"], 500);
}

#[tokio::test]
async fn test_getutxout_unknown_is_null() {
    let mock = MockProviders::start().await;
    let (addr, _shutdown) = start_api(vec![mock.base("a")], FeeShape::FeerateTable).await;

    let utxo: UtxoResponse = reqwest::get(format!(
        "http://{}/getutxout/4a5e1e4baab89f3a32518a88c31bc87f618f76673e2cc77ab2127b7afdeda33b/0",
        addr
    ))
    .await
    .unwrap()
    .json()
    .await
    .unwrap();
    assert_eq!(utxo.amount, None);
    assert_eq!(utxo.script, None);
}

#[tokio::test]
async fn test_sendrawtransaction() {
    let mock = MockProviders::start().await;
    mock.respond("a", "POST", "/tx", 400, "sendrawtransaction RPC error: bad-txns");
    let (addr, _shutdown) = start_api(vec![mock.base("a")], FeeShape::FeerateTable).await;

    let result: BroadcastResult = reqwest::Client::new()
        .post(format!("http://{}/sendrawtransaction", addr))
        .json(&serde_json::json!({ "tx": "0100" }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert!(!result.success);
    assert_eq!(result.errmsg, "sendrawtransaction RPC error: bad-txns");
}

#[tokio::test]
async fn test_shutdown_stops_server() {
    let mock = MockProviders::start().await;
    let server = HttpServer::new(
        Arc::new(engine(vec![mock.base("a")], None)),
        FeeShape::FeerateTable,
        Duration::from_secs(5),
    );
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let shutdown = Shutdown::new();
    let task = tokio::spawn(server.run(listener, shutdown.subscribe()));

    shutdown.trigger();
    let result = tokio::time::timeout(Duration::from_secs(5), task).await;
    assert!(matches!(result, Ok(Ok(Ok(())))));
}
