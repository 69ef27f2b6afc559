mod common;

use common::{init_logging, refused_addr, scripted, FixtureServer, Step};
use linekv::{AsyncClient, ClientConfig, ClientState, Error, SetOptions};
use std::time::Duration;

#[tokio::test]
async fn test_async_set_get_delete() {
    init_logging();
    let server = FixtureServer::start();
    let mut client = AsyncClient::connect(server.addr()).await.unwrap();

    assert!(client.set("async_key", "async_value").await.unwrap());
    assert_eq!(client.get("async_key").await.unwrap(), "async_value");
    assert!(client.delete("async_key").await.unwrap());
    assert_eq!(client.get("async_key").await.unwrap(), "");

    client.close().await.unwrap();
}

#[tokio::test]
async fn test_async_counters_and_add() {
    let server = FixtureServer::start();
    let mut client = AsyncClient::connect(server.addr()).await.unwrap();

    assert!(client.add("n", "1").await.unwrap());
    assert!(!client.add("n", "9").await.unwrap());
    assert_eq!(client.incr_by("n", 2).await.unwrap(), "3");
    assert_eq!(client.incr_by("n", 3).await.unwrap(), "6");
    assert_eq!(client.decr("n").await.unwrap(), "5");
    assert_eq!(client.decr_by("n", 5).await.unwrap(), "0");
    assert_eq!(client.incr("n").await.unwrap(), "1");
}

#[tokio::test]
async fn test_async_wire_format() {
    let (addr, server) = scripted(vec![Step::Reply("v"), Step::Reply("v"), Step::Reply("2")]);
    let mut client = AsyncClient::connect(addr).await.unwrap();

    client.set_with("k", "v", &SetOptions::new().ttl(60)).await.unwrap();
    client.add_with("k", "v", &SetOptions::new()).await.unwrap();
    client.incr_by("n", 2).await.unwrap();
    client.close().await.unwrap();

    let received = tokio::task::spawn_blocking(move || server.join().unwrap()).await.unwrap();
    assert_eq!(received, vec!["SET k v 60", "ADD k v", "INCR n 2"]);
}

#[tokio::test]
async fn test_async_sentinels_fold_into_zero_values() {
    let (addr, _server) = scripted(vec![
        Step::Reply("protoerr"),
        Step::Reply("wrongcommand"),
        Step::Reply("emptycommand"),
        Step::Reply("protoerr"),
    ]);
    let mut client = AsyncClient::connect(addr).await.unwrap();

    assert_eq!(client.get("k").await.unwrap(), "");
    assert!(!client.set("k", "v").await.unwrap());
    assert_eq!(client.incr("k").await.unwrap(), "");
    assert!(!client.delete("k").await.unwrap());
}

#[tokio::test]
async fn test_async_peer_close_is_transport_error() {
    let (addr, _server) = scripted(vec![Step::Close]);
    let mut client = AsyncClient::connect(addr).await.unwrap();

    let err = client.set("k", "v").await.unwrap_err();
    assert!(matches!(err, Error::Transport { .. }), "{:?}", err);
    assert!(client.is_closed());
}

#[tokio::test]
async fn test_async_late_reply_is_never_read_by_next_command() {
    let (addr, server) = scripted(vec![
        Step::Delayed(Duration::from_millis(200), "first"),
        Step::Reply("second"),
    ]);
    let port = addr.rsplit_once(':').unwrap().1.parse().unwrap();
    let config = ClientConfig {
        read_timeout_ms: Some(50),
        ..ClientConfig::with_host_port("127.0.0.1", port)
    };
    let mut client = AsyncClient::connect_with_config(&config).await.unwrap();

    let err = client.get("a").await.unwrap_err();
    assert!(matches!(err, Error::Timeout { .. }), "{:?}", err);
    tokio::time::sleep(Duration::from_millis(300)).await;

    assert!(matches!(client.get("b").await, Err(Error::Closed)));
    assert!(matches!(client.incr("b").await, Err(Error::Closed)));
    assert_eq!(client.state(), ClientState::Closed);

    let received = tokio::task::spawn_blocking(move || server.join().unwrap()).await.unwrap();
    assert_eq!(received, vec!["GET a"]);
}

#[tokio::test]
async fn test_async_negative_ttl_and_empty_value_on_the_wire() {
    let (addr, server) = scripted(vec![Step::Reply("v"), Step::Reply("")]);
    let mut client = AsyncClient::connect(addr).await.unwrap();

    assert!(client.set_with("k", "v", &SetOptions::new().ttl(-1)).await.unwrap());
    assert!(client.add("e", "").await.unwrap());
    client.close().await.unwrap();

    let received = tokio::task::spawn_blocking(move || server.join().unwrap()).await.unwrap();
    assert_eq!(received, vec!["SET k v -1", "ADD e "]);
}

#[tokio::test]
async fn test_async_connect_refused() {
    let result = AsyncClient::connect(refused_addr()).await;
    assert!(matches!(result, Err(Error::Connection { .. })));
}

#[tokio::test]
async fn test_async_connect_with_config() {
    let server = FixtureServer::start();
    let port = server.addr().rsplit_once(':').unwrap().1.parse().unwrap();
    let config = ClientConfig {
        connect_timeout_ms: Some(1000),
        read_timeout_ms: Some(1000),
        ..ClientConfig::with_host_port("127.0.0.1", port)
    };

    let mut client = AsyncClient::connect_with_config(&config).await.unwrap();
    assert!(client.set("k", "v").await.unwrap());
    assert_eq!(client.server_addr(), server.addr());
}

#[tokio::test]
async fn test_async_operations_after_close_fail_fast() {
    let server = FixtureServer::start();
    let mut client = AsyncClient::connect(server.addr()).await.unwrap();
    client.close().await.unwrap();

    assert!(matches!(client.get("k").await, Err(Error::Closed)));
    assert!(matches!(client.add("k", "v").await, Err(Error::Closed)));
    assert!(matches!(client.decr("k").await, Err(Error::Closed)));
    assert!(server.received().is_empty());
}
