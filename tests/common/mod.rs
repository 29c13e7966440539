#![allow(dead_code)]

use std::fs;
use std::io;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use async_std::io::prelude::*;
use async_std::net::TcpStream;
use async_std::task::{self, JoinHandle};
use temp_dir::TempDir;
use vhostd::config::Sites;
use vhostd::net::{Registry, Server, ShutdownHandle};

/// A throwaway directory holding a `www` root, removed on drop.
pub struct TestDir {
    dir: TempDir,
}

impl TestDir {
    pub fn new() -> Self {
        let dir = TempDir::new().unwrap();
        fs::create_dir(dir.child("www")).unwrap();
        Self { dir }
    }

    pub fn base(&self) -> &Path {
        self.dir.path()
    }

    pub fn root(&self) -> PathBuf {
        self.dir.child("www")
    }

    pub fn file(&self, rel: &str, contents: &[u8]) -> PathBuf {
        let path = self.root().join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, contents).unwrap();
        path
    }

    pub fn dir(&self, rel: &str) -> PathBuf {
        let path = self.root().join(rel);
        fs::create_dir_all(&path).unwrap();
        path
    }

    /// A config with one default host, `example.com`, rooted here.
    /// `server` lines go before the host table, `host` lines inside it.
    pub fn config(&self, server: &str, host: &str) -> String {
        format!(
            "address = \"127.0.0.1\"\nport = 0\n{server}\n\n\
             [[host]]\nhostname = \"example.com\"\ndefault = true\nroot = {:?}\n{host}\n",
            self.root().to_string_lossy()
        )
    }
}

pub struct TestServer {
    pub addr: SocketAddr,
    pub shutdown: ShutdownHandle,
    pub registry: Registry,
    pub task: JoinHandle<io::Result<()>>,
}

pub async fn start(toml: &str) -> TestServer {
    let sites = Sites::from_toml(toml, "test.toml").unwrap();
    let server = Server::bind(Arc::new(sites)).await.unwrap();
    TestServer {
        addr: server.local_addr().unwrap(),
        shutdown: server.shutdown_handle(),
        registry: server.registry(),
        task: task::spawn(server.run()),
    }
}

#[derive(Debug)]
pub struct Reply {
    pub status_line: String,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl Reply {
    pub fn code(&self) -> u16 {
        self.status_line
            .split(' ')
            .nth(1)
            .and_then(|code| code.parse().ok())
            .unwrap()
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

pub fn parse_reply(bytes: &[u8]) -> Reply {
    let split = bytes
        .windows(4)
        .position(|w| w == b"\r\n\r\n")
        .expect("response has no header terminator");
    let head = String::from_utf8_lossy(&bytes[..split]).into_owned();
    let mut lines = head.split("\r\n");
    let status_line = lines.next().unwrap().to_string();
    let headers = lines
        .filter_map(|line| line.split_once(": "))
        .map(|(name, value)| (name.to_string(), value.to_string()))
        .collect();

    Reply {
        status_line,
        headers,
        body: bytes[split + 4..].to_vec(),
    }
}

/// Sends `raw` and reads until the server closes the connection.
pub async fn send(addr: SocketAddr, raw: &str) -> Reply {
    let mut stream = TcpStream::connect(addr).await.unwrap();
    stream.write_all(raw.as_bytes()).await.unwrap();
    let mut bytes = Vec::new();
    stream.read_to_end(&mut bytes).await.unwrap();
    parse_reply(&bytes)
}

pub async fn get(addr: SocketAddr, path: &str, extra_headers: &str) -> Reply {
    send(
        addr,
        &format!("GET {path} HTTP/1.1\r\nHost: example.com\r\n{extra_headers}\r\n"),
    )
    .await
}

/// Polls `cond` for up to two seconds.
pub async fn wait_until(mut cond: impl FnMut() -> bool) -> bool {
    for _ in 0..200 {
        if cond() {
            return true;
        }
        task::sleep(Duration::from_millis(10)).await;
    }
    cond()
}
