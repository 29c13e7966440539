//! One accepted socket, end to end: read, resolve, write, close.

use std::net::{Shutdown, SocketAddr};
use std::sync::Arc;

use async_std::io::BufReader;
use async_std::net::TcpStream;
use async_std::task;
use log::{debug, info, warn};

use super::Registry;
use crate::config::Sites;
use crate::error::{HandlerError, ReadError};
use crate::handler;
use crate::http::parser::read_request;
use crate::http::request::Request;
use crate::http::response::Response;

pub(crate) struct Connection {
    pub id: u64,
    pub stream: TcpStream,
    pub peer: SocketAddr,
}

impl Connection {
    /// Answers exactly once, even when no request could be read, then closes
    /// the socket and leaves the registry whatever happened.
    pub async fn serve(self, sites: Arc<Sites>, registry: Registry) {
        let response = self.respond(&sites).await;
        if let Err(err) = response.write_to(&mut &self.stream).await {
            warn!("Could not write response to {}: {}", self.peer, err);
        }

        if let Err(err) = self.stream.shutdown(Shutdown::Both) {
            debug!("Connection {} already closed: {}", self.id, err);
        }
        registry.remove(self.id);
        debug!("Connection {} from {} closed", self.id, self.peer);
    }

    async fn respond(&self, sites: &Arc<Sites>) -> Response {
        let peer = self.peer.ip().to_string();
        let mut reader = BufReader::new(&self.stream);

        let failure = match read_request(&mut reader, sites.read_limits()).await {
            Ok(raw) => {
                let request = Request::from_raw(raw, sites, &peer);
                let sites = Arc::clone(sites);
                let response = task::spawn_blocking(move || {
                    let response = handler::handle_request(&request, sites.settings());
                    info!(
                        "{} \"{} {} {}\" {}",
                        request.peer(),
                        request.verb(),
                        request.path(),
                        request.protocol(),
                        response.status.code()
                    );
                    response
                })
                .await;
                return response;
            }
            Err(ReadError::Closed) => {
                debug!("{} closed the connection without a request", self.peer);
                HandlerError::BadRequest("No request received".to_string())
            }
            Err(ReadError::Timeout) => {
                info!("{} timed out before sending a request", self.peer);
                HandlerError::Timeout("Timed out waiting for the request".to_string())
            }
            Err(err @ ReadError::HeadersTooLarge(_)) => {
                info!("Refusing request from {}: {}", self.peer, err);
                HandlerError::HeadersTooLarge(format!("Request {err}"))
            }
            Err(err @ ReadError::PayloadTooLarge { .. }) => {
                info!("Refusing request from {}: {}", self.peer, err);
                HandlerError::PayloadTooLarge(format!("Request {err}"))
            }
            Err(ReadError::Io(err)) => {
                warn!("I/O error while reading request from {}: {}", self.peer, err);
                HandlerError::Internal("Could not receive request".to_string())
            }
        };

        let request = Request::empty(sites, &peer);
        handler::handle_failure(failure, &request, sites.settings())
    }
}
