//! Asynchronous linekv client implementation

use crate::client::{ClientState, SetOptions};
use crate::config::ClientConfig;
use crate::error::{Error, Result};
use crate::protocol::{Command, Reply};
use log::{debug, info, warn};
use std::io;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, BufWriter};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpStream;
use tokio::time::timeout;

struct Connection {
    reader: BufReader<OwnedReadHalf>,
    writer: BufWriter<OwnedWriteHalf>,
}

impl Connection {
    async fn round_trip(&mut self, line: &str) -> io::Result<String> {
        self.writer.write_all(line.as_bytes()).await?;
        self.writer.write_all(b"\n").await?;
        self.writer.flush().await?;

        let mut response = String::new();
        self.reader.read_line(&mut response).await?;

        if !response.ends_with('\n') {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "server closed connection before responding",
            ));
        }
        Ok(response)
    }
}

/// Asynchronous linekv client owning a single TCP connection.
///
/// Same protocol and result mapping as [`crate::Client`], driven by tokio.
/// An optional request timeout bounds each write-then-read round trip.
///
/// # Example
///
/// ```rust,no_run
/// use linekv::{AsyncClient, Result};
///
/// #[tokio::main]
/// async fn main() -> Result<()> {
///     let mut client = AsyncClient::connect("127.0.0.1:1234").await?;
///
///     client.set("a", "1").await?;
///     let value = client.get("a").await?;
///     println!("a = {}", value);
///
///     client.close().await
/// }
/// ```
pub struct AsyncClient {
    conn: Option<Connection>,
    addr: String,
    request_timeout: Option<Duration>,
}

impl AsyncClient {
    /// Connect to a server at `addr` ("host:port") with no deadlines.
    pub async fn connect<S: Into<String>>(addr: S) -> Result<Self> {
        Self::open(addr.into(), None, None).await
    }

    /// Connect using the endpoint and deadlines from `config`.
    ///
    /// `read_timeout_ms` bounds the whole round trip of each request.
    pub async fn connect_with_config(config: &ClientConfig) -> Result<Self> {
        Self::open(config.addr(), config.connect_timeout(), config.read_timeout()).await
    }

    async fn open(addr: String, connect_timeout: Option<Duration>, request_timeout: Option<Duration>) -> Result<Self> {
        info!("Connecting to linekv server at {}", addr);

        let connected = match connect_timeout {
            Some(limit) => match timeout(limit, TcpStream::connect(addr.as_str())).await {
                Ok(result) => result,
                Err(_) => Err(io::Error::new(io::ErrorKind::TimedOut, "connect timed out")),
            },
            None => TcpStream::connect(addr.as_str()).await,
        };
        let stream = connected.map_err(|e| Error::connection(addr.as_str(), e))?;

        // One small line per request; don't let Nagle hold it back
        stream
            .set_nodelay(true)
            .map_err(|e| Error::connection(addr.as_str(), e))?;

        let (read_half, write_half) = stream.into_split();

        info!("Connected to linekv server at {}", addr);

        Ok(AsyncClient {
            conn: Some(Connection {
                reader: BufReader::new(read_half),
                writer: BufWriter::new(write_half),
            }),
            addr,
            request_timeout,
        })
    }

    /// Read the value stored under `key`; empty when absent or rejected.
    pub async fn get<S: AsRef<str>>(&mut self, key: S) -> Result<String> {
        let reply = self
            .send_request(&Command::Get {
                key: key.as_ref().to_string(),
            })
            .await?;
        Ok(reply.into_value())
    }

    pub async fn set<S: AsRef<str>, V: AsRef<str>>(&mut self, key: S, value: V) -> Result<bool> {
        self.set_with(key, value, &SetOptions::default()).await
    }

    pub async fn set_with<S: AsRef<str>, V: AsRef<str>>(
        &mut self,
        key: S,
        value: V,
        opts: &SetOptions,
    ) -> Result<bool> {
        let value = value.as_ref();
        let reply = self
            .send_request(&Command::Set {
                key: key.as_ref().to_string(),
                value: value.to_string(),
                ttl: opts.ttl,
            })
            .await?;
        Ok(reply.confirms(value))
    }

    pub async fn add<S: AsRef<str>, V: AsRef<str>>(&mut self, key: S, value: V) -> Result<bool> {
        self.add_with(key, value, &SetOptions::default()).await
    }

    pub async fn add_with<S: AsRef<str>, V: AsRef<str>>(
        &mut self,
        key: S,
        value: V,
        opts: &SetOptions,
    ) -> Result<bool> {
        let value = value.as_ref();
        let reply = self
            .send_request(&Command::Add {
                key: key.as_ref().to_string(),
                value: value.to_string(),
                ttl: opts.ttl,
            })
            .await?;
        Ok(reply.confirms(value))
    }

    pub async fn incr<S: AsRef<str>>(&mut self, key: S) -> Result<String> {
        self.counter(Command::Incr {
            key: key.as_ref().to_string(),
            delta: None,
        })
        .await
    }

    pub async fn incr_by<S: AsRef<str>>(&mut self, key: S, delta: i64) -> Result<String> {
        self.counter(Command::Incr {
            key: key.as_ref().to_string(),
            delta: Some(delta),
        })
        .await
    }

    pub async fn decr<S: AsRef<str>>(&mut self, key: S) -> Result<String> {
        self.counter(Command::Decr {
            key: key.as_ref().to_string(),
            delta: None,
        })
        .await
    }

    pub async fn decr_by<S: AsRef<str>>(&mut self, key: S, delta: i64) -> Result<String> {
        self.counter(Command::Decr {
            key: key.as_ref().to_string(),
            delta: Some(delta),
        })
        .await
    }

    async fn counter(&mut self, command: Command) -> Result<String> {
        Ok(self.send_request(&command).await?.into_value())
    }

    pub async fn delete<S: AsRef<str>>(&mut self, key: S) -> Result<bool> {
        let reply = self
            .send_request(&Command::Delete {
                key: key.as_ref().to_string(),
            })
            .await?;
        Ok(reply.is_true())
    }

    /// Shut down the write side and drop the connection.
    pub async fn close(&mut self) -> Result<()> {
        let mut conn = self.conn.take().ok_or(Error::Closed)?;
        info!("Closing connection to {}", self.addr);
        match conn.writer.shutdown().await {
            Err(e) if e.kind() != io::ErrorKind::NotConnected => Err(Error::transport(e)),
            _ => Ok(()),
        }
    }

    pub fn state(&self) -> ClientState {
        if self.conn.is_some() {
            ClientState::Open
        } else {
            ClientState::Closed
        }
    }

    pub fn is_closed(&self) -> bool {
        self.state() == ClientState::Closed
    }

    pub fn server_addr(&self) -> &str {
        &self.addr
    }

    /// Same contract as the blocking client: a failed or timed-out round
    /// trip drops the connection so a late reply is never read as the
    /// answer to a later command.
    async fn send_request(&mut self, command: &Command) -> Result<Reply> {
        let limit = self.request_timeout;
        let conn = self.conn.as_mut().ok_or(Error::Closed)?;
        command.validate()?;

        let line = command.encode();
        debug!("Sending async command: {} {}", command.verb(), command.key());

        let outcome = match limit {
            Some(limit) => match timeout(limit, conn.round_trip(&line)).await {
                Ok(result) => result.map_err(Error::transport),
                Err(_) => Err(Error::timeout(format!("{} operation timed out", command.verb()))),
            },
            None => conn.round_trip(&line).await.map_err(Error::transport),
        };

        let response = match outcome {
            Ok(response) => response,
            Err(e) => {
                warn!("Dropping connection to {} after failed {}: {}", self.addr, command.verb(), e);
                self.conn = None;
                return Err(e);
            }
        };

        let reply = Reply::from_line(&response);
        debug!("Received async response: {:?}", reply);
        if let Reply::Sentinel(sentinel) = &reply {
            warn!("Server rejected {} {}: {}", command.verb(), command.key(), sentinel);
        }
        Ok(reply)
    }
}
