use linekv::{AsyncClient, ClientConfig, Result};
use std::env;

/// Asynchronous linekv client example
///
/// Runs a short counter workload on tokio with a request timeout, showing
/// that each AsyncClient owns exactly one connection.

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();

    let port = env::var("LINEKV_PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(1234);
    let config = ClientConfig {
        read_timeout_ms: Some(2_000),
        ..ClientConfig::with_host_port("127.0.0.1", port)
    };

    println!("linekv Asynchronous Client Example");
    println!("==================================");
    println!("Connecting to server: {}", config.addr());

    let mut client = AsyncClient::connect_with_config(&config).await?;

    client.set("visits", "0").await?;
    for _ in 0..5 {
        let visits = client.incr("visits").await?;
        println!("   INCR visits -> {}", visits);
    }

    // Separate tasks need separate connections
    let tasks: Vec<_> = (0..3)
        .map(|i| {
            let config = config.clone();
            tokio::spawn(async move {
                let mut client = AsyncClient::connect_with_config(&config).await?;
                let key = format!("task:{}", i);
                client.set(&key, "done").await?;
                let value = client.get(&key).await?;
                client.close().await?;
                Ok::<_, linekv::Error>((key, value))
            })
        })
        .collect();

    for task in tasks {
        match task.await {
            Ok(Ok((key, value))) => println!("   {} -> {}", key, value),
            Ok(Err(e)) => println!("   task failed: {}", e),
            Err(e) => println!("   task panicked: {}", e),
        }
    }

    client.close().await
}
