//! Core HTTP server implementation.
//!
//! This module implements the low-level HTTP server runtime.
//! It is responsible only for networking concerns such as:
//! - binding the configured address and accepting TCP connections,
//! - spawning one worker task per connection,
//! - force-closing live connections on shutdown.
//!
//! Request parsing and resolution are delegated to the `http` and
//! `handler` modules. The server is fully asynchronous and leverages the
//! `async-std` crate; the handler chain, which touches the filesystem and
//! may run an interpreter, is moved onto the blocking pool.
//!
//! ## Connection lifecycle
//!
//! 1. Accept a TCP connection and register it
//! 2. Read the request lines and body, bounded by the idle timeout and
//!    the configured size limits
//! 3. Resolve the response
//!    (delegated to [`handler::handle_request`](crate::handler::handle_request))
//! 4. Write the response back to the client
//! 5. Close the socket and unregister it

use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use async_std::channel::{self, Receiver, Sender};
use async_std::net::{TcpListener, TcpStream};
use async_std::prelude::*;
use async_std::task;
use log::{debug, info, warn};

use super::Registry;
use super::connection::Connection;
use crate::config::Sites;

/// Stops a running [`Server`]. Cloneable; any clone may trigger it.
#[derive(Debug, Clone)]
pub struct ShutdownHandle {
    signal: Sender<()>,
}

impl ShutdownHandle {
    pub fn shutdown(&self) {
        // a full channel means a stop is already pending
        let _ = self.signal.try_send(());
    }
}

/// Pause after an accept failure that is likely to repeat, such as running
/// out of file descriptors. Failures tied to one connection retry at once.
fn accept_backoff(err: &io::Error) -> Option<Duration> {
    match err.kind() {
        io::ErrorKind::ConnectionAborted
        | io::ErrorKind::ConnectionReset
        | io::ErrorKind::Interrupted
        | io::ErrorKind::WouldBlock => None,
        _ => Some(ACCEPT_BACKOFF),
    }
}

const ACCEPT_BACKOFF: Duration = Duration::from_millis(100);

enum Event {
    Accepted(io::Result<(TcpStream, SocketAddr)>),
    Stop,
}

pub struct Server {
    listener: TcpListener,
    sites: Arc<Sites>,
    registry: Registry,
    signal: Sender<()>,
    stop: Receiver<()>,
}

impl Server {
    /// Binds the listening socket on the configured `address` and `port`.
    pub async fn bind(sites: Arc<Sites>) -> io::Result<Self> {
        let settings = sites.settings();
        let port = settings.get("port").trim().parse::<u16>().map_err(|err| {
            io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("Invalid port {:?}: {}", settings.get("port"), err),
            )
        })?;
        let listener = TcpListener::bind((settings.get("address"), port)).await?;
        let (signal, stop) = channel::bounded(1);

        Ok(Self {
            listener,
            sites,
            registry: Registry::new(),
            signal,
            stop,
        })
    }

    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    pub fn shutdown_handle(&self) -> ShutdownHandle {
        ShutdownHandle {
            signal: self.signal.clone(),
        }
    }

    pub fn registry(&self) -> Registry {
        self.registry.clone()
    }

    /// Accepts connections until a [`ShutdownHandle`] fires, then closes
    /// every live connection before releasing the listening socket.
    pub async fn run(self) -> io::Result<()> {
        info!("Listening on {}", self.local_addr()?);
        let mut next_id: u64 = 0;

        loop {
            let accepted = async { Event::Accepted(self.listener.accept().await) };
            let stopped = async {
                let _ = self.stop.recv().await;
                Event::Stop
            };

            match accepted.race(stopped).await {
                Event::Stop => break,
                Event::Accepted(Err(err)) => {
                    warn!("Could not accept connection: {}", err);
                    if let Some(delay) = accept_backoff(&err) {
                        task::sleep(delay).await;
                    }
                }
                Event::Accepted(Ok((stream, peer))) => {
                    let id = next_id;
                    next_id += 1;
                    debug!("Connection {} from {}", id, peer);

                    self.registry.insert(id, stream.clone());
                    let connection = Connection { id, stream, peer };
                    task::spawn(connection.serve(Arc::clone(&self.sites), self.registry.clone()));
                }
            }
        }

        info!("Shutting down, closing {} connection(s)", self.registry.len());
        self.registry.close_all();
        drop(self.listener);
        Ok(())
    }
}
