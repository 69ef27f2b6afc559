//! In-process servers for exercising the clients over real sockets.
#![allow(dead_code)]

use linekv::protocol::Command;
use std::collections::HashMap;
use std::io::{BufRead, BufReader, Write};
use std::net::{TcpListener, TcpStream};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::Duration;

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Address that refuses connections: bound once, then released.
pub fn refused_addr() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    listener.local_addr().unwrap().to_string()
}

/// Stateful server implementing the protocol over an in-memory map.
///
/// - `SET`/`ADD` answer the stored value (`ADD` on an existing key answers
///   the old value)
/// - `GET` of an absent key answers an empty line
/// - `INCR`/`DECR` default to a delta of 1 and answer `protoerr` for
///   non-numeric values
/// - `DEL` answers `true`/`false`
/// - TTLs are accepted and ignored
pub struct FixtureServer {
    addr: String,
    received: Arc<Mutex<Vec<String>>>,
}

impl FixtureServer {
    pub fn start() -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap().to_string();
        let store = Arc::new(Mutex::new(HashMap::new()));
        let received = Arc::new(Mutex::new(Vec::new()));

        let log = Arc::clone(&received);
        thread::spawn(move || {
            for socket in listener.incoming() {
                let Ok(socket) = socket else { continue };
                let store = Arc::clone(&store);
                let log = Arc::clone(&log);
                thread::spawn(move || serve(socket, store, log));
            }
        });

        FixtureServer { addr, received }
    }

    pub fn addr(&self) -> &str {
        &self.addr
    }

    /// Every command line received so far, across connections.
    pub fn received(&self) -> Vec<String> {
        self.received.lock().unwrap().clone()
    }
}

fn serve(socket: TcpStream, store: Arc<Mutex<HashMap<String, String>>>, log: Arc<Mutex<Vec<String>>>) {
    let mut writer = socket.try_clone().unwrap();
    let mut reader = BufReader::new(socket);
    let mut line = String::new();

    loop {
        line.clear();
        match reader.read_line(&mut line) {
            Ok(0) | Err(_) => return,
            Ok(_) => {}
        }
        log.lock().unwrap().push(line.trim_end_matches('\n').to_string());

        let response = respond(&mut store.lock().unwrap(), &line);
        if writer.write_all(format!("{}\n", response).as_bytes()).is_err() {
            return;
        }
    }
}

pub fn respond(store: &mut HashMap<String, String>, line: &str) -> String {
    match Command::parse(line) {
        Err(e) => e.sentinel().as_str().to_string(),
        Ok(Command::Get { key }) => store.get(&key).cloned().unwrap_or_default(),
        Ok(Command::Set { key, value, .. }) => {
            store.insert(key, value.clone());
            value
        }
        Ok(Command::Add { key, value, .. }) => match store.get(&key) {
            Some(existing) => existing.clone(),
            None => {
                store.insert(key, value.clone());
                value
            }
        },
        Ok(Command::Incr { key, delta }) => counter(store, key, delta.unwrap_or(1)),
        Ok(Command::Decr { key, delta }) => counter(store, key, -delta.unwrap_or(1)),
        Ok(Command::Delete { key }) => store.remove(&key).is_some().to_string(),
    }
}

fn counter(store: &mut HashMap<String, String>, key: String, delta: i64) -> String {
    let current = match store.get(&key).map(|v| v.parse::<i64>()) {
        None => 0,
        Some(Ok(n)) => n,
        Some(Err(_)) => return "protoerr".to_string(),
    };
    let next = (current + delta).to_string();
    store.insert(key, next.clone());
    next
}

/// What a scripted server does with the next command line it reads.
#[derive(Debug, Clone)]
pub enum Step {
    /// Answer with this line
    Reply(&'static str),
    /// Write these bytes with no terminator, then hang up
    Partial(&'static str),
    /// Answer with this line after a pause; the client may be gone by then
    Delayed(Duration, &'static str),
    /// Hang up without answering
    Close,
    /// Never answer; wait for the client to go away
    Silent,
}

/// Single-connection server that plays `steps` in order.
///
/// The returned handle yields the command lines the server read. Once the
/// script is done the server keeps draining until the client disconnects.
pub fn scripted(steps: Vec<Step>) -> (String, JoinHandle<Vec<String>>) {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap().to_string();

    let handle = thread::spawn(move || {
        let (socket, _) = listener.accept().unwrap();
        let mut writer = socket.try_clone().unwrap();
        let mut reader = BufReader::new(socket);
        let mut received = Vec::new();

        for step in steps {
            let mut line = String::new();
            match reader.read_line(&mut line) {
                Ok(0) | Err(_) => return received,
                Ok(_) => received.push(line.trim_end_matches('\n').to_string()),
            }

            match step {
                Step::Reply(body) => {
                    writer.write_all(format!("{}\n", body).as_bytes()).unwrap();
                }
                Step::Delayed(pause, body) => {
                    thread::sleep(pause);
                    let _ = writer.write_all(format!("{}\n", body).as_bytes());
                }
                Step::Partial(bytes) => {
                    writer.write_all(bytes.as_bytes()).unwrap();
                    return received;
                }
                Step::Close => return received,
                Step::Silent => break,
            }
        }

        let mut line = String::new();
        while matches!(reader.read_line(&mut line), Ok(n) if n > 0) {
            received.push(line.trim_end_matches('\n').to_string());
            line.clear();
        }
        received
    });

    (addr, handle)
}
