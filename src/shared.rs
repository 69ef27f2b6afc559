//! Thread-safe handle over one blocking connection.
//!
//! The protocol has no request ids, so a response can only be matched to its
//! command by order. `SharedClient` holds a mutex across the whole
//! write-then-read round trip, which keeps concurrent callers from
//! interleaving on the socket.

use crate::client::{Client, ClientState, SetOptions};
use crate::config::ClientConfig;
use crate::error::{Error, Result};
use std::sync::{Arc, Mutex, MutexGuard};

/// Cloneable, `Send + Sync` wrapper around a [`Client`].
///
/// ```rust,no_run
/// use linekv::SharedClient;
/// use std::thread;
///
/// let client = SharedClient::connect("127.0.0.1:1234")?;
/// let handles: Vec<_> = (0..4)
///     .map(|_| {
///         let client = client.clone();
///         thread::spawn(move || client.incr_by("hits", 1))
///     })
///     .collect();
/// for handle in handles {
///     handle.join().unwrap()?;
/// }
/// # Ok::<(), linekv::Error>(())
/// ```
#[derive(Clone)]
pub struct SharedClient {
    inner: Arc<Mutex<Client>>,
}

impl SharedClient {
    pub fn connect<S: Into<String>>(addr: S) -> Result<Self> {
        Ok(Self::new(Client::connect(addr)?))
    }

    pub fn connect_with_config(config: &ClientConfig) -> Result<Self> {
        Ok(Self::new(Client::connect_with_config(config)?))
    }

    pub fn new(client: Client) -> Self {
        Self {
            inner: Arc::new(Mutex::new(client)),
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, Client>> {
        self.inner.lock().map_err(|_| Error::Poisoned)
    }

    pub fn get<S: AsRef<str>>(&self, key: S) -> Result<String> {
        self.lock()?.get(key)
    }

    pub fn set<S: AsRef<str>, V: AsRef<str>>(&self, key: S, value: V) -> Result<bool> {
        self.lock()?.set(key, value)
    }

    pub fn set_with<S: AsRef<str>, V: AsRef<str>>(&self, key: S, value: V, opts: &SetOptions) -> Result<bool> {
        self.lock()?.set_with(key, value, opts)
    }

    pub fn add<S: AsRef<str>, V: AsRef<str>>(&self, key: S, value: V) -> Result<bool> {
        self.lock()?.add(key, value)
    }

    pub fn add_with<S: AsRef<str>, V: AsRef<str>>(&self, key: S, value: V, opts: &SetOptions) -> Result<bool> {
        self.lock()?.add_with(key, value, opts)
    }

    pub fn incr<S: AsRef<str>>(&self, key: S) -> Result<String> {
        self.lock()?.incr(key)
    }

    pub fn incr_by<S: AsRef<str>>(&self, key: S, delta: i64) -> Result<String> {
        self.lock()?.incr_by(key, delta)
    }

    pub fn decr<S: AsRef<str>>(&self, key: S) -> Result<String> {
        self.lock()?.decr(key)
    }

    pub fn decr_by<S: AsRef<str>>(&self, key: S, delta: i64) -> Result<String> {
        self.lock()?.decr_by(key, delta)
    }

    pub fn delete<S: AsRef<str>>(&self, key: S) -> Result<bool> {
        self.lock()?.delete(key)
    }

    /// Close the shared connection for every handle.
    pub fn close(&self) -> Result<()> {
        self.lock()?.close()
    }

    pub fn state(&self) -> Result<ClientState> {
        Ok(self.lock()?.state())
    }
}
