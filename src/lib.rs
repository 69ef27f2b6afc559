//! # linekv - Line Protocol Key-Value Client
//!
//! Client library for a line-oriented, request/response key-value protocol
//! carried over TCP. Every command is one text line and every answer is one
//! text line.
//!
//! ## Components
//!
//! - **Client**: blocking client owning one connection
//! - **SharedClient**: mutex-guarded handle for using one connection from many threads
//! - **AsyncClient**: the same operations on tokio
//! - **protocol**: command framing and reply decoding shared by all clients
//! - **ClientConfig**: endpoint and deadline settings loaded from TOML/env
//!
//! ## Results
//!
//! The server signals a rejected command in-band with `emptycommand`,
//! `wrongcommand` or `protoerr`. These are not errors: they turn into an empty
//! string (`get`, `incr`, `decr`) or `false` (`set`, `add`, `delete`). An
//! [`Error`] means the connection itself failed or the client was misused.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use linekv::{Client, Result, SetOptions};
//!
//! fn main() -> Result<()> {
//!     let mut client = Client::connect("127.0.0.1:1234")?;
//!
//!     client.set("a", "1")?;
//!     client.set_with("session", "abc", &SetOptions::new().ttl(300))?;
//!     let a = client.incr_by("a", 2)?;
//!     println!("a = {}", a); // a = 3
//!
//!     client.close()
//! }
//! ```

pub mod config;
pub mod error;
pub mod protocol;

mod async_client;
mod client;
mod shared;

// Re-export main types
pub use async_client::AsyncClient;
pub use client::{Client, ClientState, SetOptions};
pub use config::ClientConfig;
pub use error::{Error, Result};
pub use shared::SharedClient;
