use linekv::{Client, Result, SetOptions};
use std::env;

/// Synchronous linekv client example
///
/// Walks through every verb against a running server:
/// - Setting and reading values
/// - Conditional inserts with ADD
/// - Counters with INCR/DECR
/// - Deleting keys
/// - Closing the connection explicitly

fn main() -> Result<()> {
    env_logger::init();

    // Get server address from environment or use default
    let server_addr = env::var("LINEKV_SERVER").unwrap_or_else(|_| "127.0.0.1:1234".to_string());

    println!("linekv Synchronous Client Example");
    println!("=================================");
    println!("Connecting to server: {}", server_addr);

    let mut client = Client::connect(&server_addr)?;
    println!("✓ Connected successfully");

    println!("\n1. Setting values:");
    println!("   SET hello world -> {}", client.set("hello", "world")?);
    println!(
        "   SET session abc (ttl 300) -> {}",
        client.set_with("session", "abc", &SetOptions::new().ttl(300))?
    );

    println!("\n2. Getting values:");
    println!("   GET hello -> {:?}", client.get("hello")?);
    println!("   GET nonexistent -> {:?}", client.get("nonexistent")?);

    println!("\n3. Conditional insert:");
    println!("   ADD hello again -> {}", client.add("hello", "again")?);
    println!("   ADD fresh value -> {}", client.add("fresh", "value")?);

    println!("\n4. Counters:");
    client.set("a", "1")?;
    println!("   INCR a 2 -> {}", client.incr_by("a", 2)?);
    println!("   INCR a 3 -> {}", client.incr_by("a", 3)?);
    println!("   DECR a -> {}", client.decr("a")?);

    println!("\n5. Deleting keys:");
    println!("   DEL hello -> {}", client.delete("hello")?);
    println!("   DEL hello -> {}", client.delete("hello")?);

    client.close()?;
    println!("\n✓ Connection closed");
    Ok(())
}
