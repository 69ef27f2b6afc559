//! Blocking linekv client implementation

use crate::config::ClientConfig;
use crate::error::{Error, Result};
use crate::protocol::{Command, Reply};
use log::{debug, info, warn};
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::net::{Shutdown, TcpStream, ToSocketAddrs};
use std::time::Duration;

/// Lifecycle of a [`Client`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientState {
    /// Connected; verb operations are allowed
    Open,
    /// `close()` was called or a round trip failed; every operation fails
    /// with [`Error::Closed`]
    Closed,
}

/// Optional arguments of `SET` and `ADD`.
///
/// ```rust
/// use linekv::SetOptions;
///
/// let opts = SetOptions::new().ttl(60);
/// assert_eq!(opts.ttl, Some(60));
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SetOptions {
    /// Expire the key after this many seconds; `None` leaves the choice to the server.
    /// Negative values are passed through for the server to interpret.
    pub ttl: Option<i64>,
}

impl SetOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn ttl(mut self, secs: i64) -> Self {
        self.ttl = Some(secs);
        self
    }
}

struct Connection {
    reader: BufReader<TcpStream>,
    writer: BufWriter<TcpStream>,
}

impl Connection {
    fn round_trip(&mut self, line: &str) -> io::Result<String> {
        self.writer.write_all(line.as_bytes())?;
        self.writer.write_all(b"\n")?;
        self.writer.flush()?;

        let mut response = String::new();
        self.reader.read_line(&mut response)?;

        // EOF before the terminator means the server went away mid-reply
        if !response.ends_with('\n') {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "server closed connection before responding",
            ));
        }
        Ok(response)
    }

    fn shutdown(self) -> io::Result<()> {
        match self.writer.get_ref().shutdown(Shutdown::Both) {
            Err(e) if e.kind() != io::ErrorKind::NotConnected => Err(e),
            _ => Ok(()),
        }
    }
}

/// Blocking linekv client owning a single TCP connection.
///
/// Every operation writes one command line and blocks until the matching
/// response line arrives. Operations take `&mut self`, so a `Client` can only
/// ever have one command in flight; use [`crate::SharedClient`] to share a
/// connection between threads.
///
/// # Example
///
/// ```rust,no_run
/// use linekv::{Client, Result};
///
/// fn main() -> Result<()> {
///     let mut client = Client::connect("127.0.0.1:1234")?;
///
///     client.set("a", "1")?;
///     let a = client.incr_by("a", 2)?;
///     println!("a = {}", a);
///
///     client.close()
/// }
/// ```
pub struct Client {
    conn: Option<Connection>,
    addr: String,
}

impl Client {
    /// Connect to a server at `addr` ("host:port") with no deadlines.
    pub fn connect<S: Into<String>>(addr: S) -> Result<Self> {
        let addr = addr.into();
        Self::open(addr, None, None, None)
    }

    /// Connect using the endpoint and deadlines from `config`.
    pub fn connect_with_config(config: &ClientConfig) -> Result<Self> {
        Self::open(
            config.addr(),
            config.connect_timeout(),
            config.read_timeout(),
            config.write_timeout(),
        )
    }

    fn open(
        addr: String,
        connect_timeout: Option<Duration>,
        read_timeout: Option<Duration>,
        write_timeout: Option<Duration>,
    ) -> Result<Self> {
        info!("Connecting to linekv server at {}", addr);

        let stream = dial(&addr, connect_timeout).map_err(|e| Error::connection(addr.as_str(), e))?;

        let configure = |stream: &TcpStream| -> io::Result<TcpStream> {
            stream.set_read_timeout(read_timeout)?;
            stream.set_write_timeout(write_timeout)?;
            stream.try_clone()
        };
        let reader_stream = configure(&stream).map_err(|e| Error::connection(addr.as_str(), e))?;

        info!("Connected to linekv server at {}", addr);

        Ok(Client {
            conn: Some(Connection {
                reader: BufReader::new(reader_stream),
                writer: BufWriter::new(stream),
            }),
            addr,
        })
    }

    /// Read the value stored under `key`.
    ///
    /// Returns an empty string when the key is absent or the server rejected
    /// the command.
    pub fn get<S: AsRef<str>>(&mut self, key: S) -> Result<String> {
        let reply = self.send_request(&Command::Get {
            key: key.as_ref().to_string(),
        })?;
        Ok(reply.into_value())
    }

    /// Store `value` under `key`. Returns `true` when the server echoed the value back.
    pub fn set<S: AsRef<str>, V: AsRef<str>>(&mut self, key: S, value: V) -> Result<bool> {
        self.set_with(key, value, &SetOptions::default())
    }

    /// `set` with optional arguments such as a time-to-live.
    pub fn set_with<S: AsRef<str>, V: AsRef<str>>(&mut self, key: S, value: V, opts: &SetOptions) -> Result<bool> {
        let value = value.as_ref();
        let reply = self.send_request(&Command::Set {
            key: key.as_ref().to_string(),
            value: value.to_string(),
            ttl: opts.ttl,
        })?;
        Ok(reply.confirms(value))
    }

    /// Store `value` under `key` only if the key is absent.
    ///
    /// Returns `true` when the server echoed the value back; what an existing
    /// key answers is up to the server.
    pub fn add<S: AsRef<str>, V: AsRef<str>>(&mut self, key: S, value: V) -> Result<bool> {
        self.add_with(key, value, &SetOptions::default())
    }

    /// `add` with optional arguments such as a time-to-live.
    pub fn add_with<S: AsRef<str>, V: AsRef<str>>(&mut self, key: S, value: V, opts: &SetOptions) -> Result<bool> {
        let value = value.as_ref();
        let reply = self.send_request(&Command::Add {
            key: key.as_ref().to_string(),
            value: value.to_string(),
            ttl: opts.ttl,
        })?;
        Ok(reply.confirms(value))
    }

    /// Increment the counter under `key` by the server's default delta.
    pub fn incr<S: AsRef<str>>(&mut self, key: S) -> Result<String> {
        self.counter(Command::Incr {
            key: key.as_ref().to_string(),
            delta: None,
        })
    }

    /// Increment the counter under `key` by `delta`. Returns the new value as text.
    pub fn incr_by<S: AsRef<str>>(&mut self, key: S, delta: i64) -> Result<String> {
        self.counter(Command::Incr {
            key: key.as_ref().to_string(),
            delta: Some(delta),
        })
    }

    /// Decrement the counter under `key` by the server's default delta.
    pub fn decr<S: AsRef<str>>(&mut self, key: S) -> Result<String> {
        self.counter(Command::Decr {
            key: key.as_ref().to_string(),
            delta: None,
        })
    }

    /// Decrement the counter under `key` by `delta`. Returns the new value as text.
    pub fn decr_by<S: AsRef<str>>(&mut self, key: S, delta: i64) -> Result<String> {
        self.counter(Command::Decr {
            key: key.as_ref().to_string(),
            delta: Some(delta),
        })
    }

    fn counter(&mut self, command: Command) -> Result<String> {
        Ok(self.send_request(&command)?.into_value())
    }

    /// Delete `key`. Returns `true` only when the server answered `true`.
    pub fn delete<S: AsRef<str>>(&mut self, key: S) -> Result<bool> {
        let reply = self.send_request(&Command::Delete {
            key: key.as_ref().to_string(),
        })?;
        Ok(reply.is_true())
    }

    /// Close the connection.
    ///
    /// The client is `Closed` afterwards even if the socket shutdown reports
    /// an error. Closing twice fails with [`Error::Closed`].
    pub fn close(&mut self) -> Result<()> {
        let conn = self.conn.take().ok_or(Error::Closed)?;
        info!("Closing connection to {}", self.addr);
        conn.shutdown().map_err(Error::transport)
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

    /// Get the server address this client was created with
    pub fn server_addr(&self) -> &str {
        &self.addr
    }

    /// Write one command line and read back exactly one response line.
    ///
    /// A failed round trip leaves an unknown amount of the exchange on the
    /// socket, and a late reply would be read as the answer to the next
    /// command. The connection is dropped and the client becomes `Closed`.
    fn send_request(&mut self, command: &Command) -> Result<Reply> {
        let conn = self.conn.as_mut().ok_or(Error::Closed)?;
        command.validate()?;

        debug!("Sending command: {} {}", command.verb(), command.key());
        let response = match conn.round_trip(&command.encode()) {
            Ok(response) => response,
            Err(e) => {
                warn!("Dropping connection to {} after failed {}: {}", self.addr, command.verb(), e);
                if let Some(conn) = self.conn.take() {
                    let _ = conn.shutdown();
                }
                return Err(Error::transport(e));
            }
        };

        let reply = Reply::from_line(&response);
        debug!("Received response: {:?}", reply);
        if let Reply::Sentinel(sentinel) = &reply {
            warn!("Server rejected {} {}: {}", command.verb(), command.key(), sentinel);
        }
        Ok(reply)
    }
}

impl Drop for Client {
    fn drop(&mut self) {
        if let Some(conn) = self.conn.take() {
            debug!("Closing connection to {}", self.addr);
            let _ = conn.shutdown();
        }
    }
}

/// Resolve `addr` and connect, trying each resolved endpoint in turn when a
/// connect timeout is set.
fn dial(addr: &str, timeout: Option<Duration>) -> io::Result<TcpStream> {
    let timeout = match timeout {
        Some(timeout) => timeout,
        None => return TcpStream::connect(addr),
    };

    let mut last_err = None;
    for sock_addr in addr.to_socket_addrs()? {
        match TcpStream::connect_timeout(&sock_addr, timeout) {
            Ok(stream) => return Ok(stream),
            Err(e) => last_err = Some(e),
        }
    }

    Err(last_err.unwrap_or_else(|| {
        io::Error::new(io::ErrorKind::InvalidInput, "address resolved to no endpoints")
    }))
}
