use std::collections::HashMap;
use std::net::Shutdown;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_std::net::TcpStream;
use log::debug;

/// Live connections by id. Inserted by the accept loop, removed by each
/// worker when it closes, force-closed all at once on shutdown.
#[derive(Debug, Clone, Default)]
pub struct Registry {
    connections: Arc<Mutex<HashMap<u64, TcpStream>>>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<u64, TcpStream>> {
        self.connections.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn insert(&self, id: u64, stream: TcpStream) {
        self.lock().insert(id, stream);
    }

    pub fn remove(&self, id: u64) {
        self.lock().remove(&id);
    }

    /// Shuts down every registered stream and empties the registry.
    pub fn close_all(&self) {
        let mut connections = self.lock();
        for (id, stream) in connections.drain() {
            if let Err(err) = stream.shutdown(Shutdown::Both) {
                debug!("Connection {} already closed: {}", id, err);
            }
        }
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
