//! Networking: the accept loop, per-connection workers and the registry of
//! live connections used to close them all on shutdown.

mod connection;
mod registry;
pub mod server;

pub use registry::Registry;
pub use server::{Server, ShutdownHandle};
