use std::env;
use std::process;
use std::sync::Arc;

use log::error;
use vhostd::config::Sites;
use vhostd::net::Server;

const DEFAULT_CONFIG: &str = "vhostd.toml";

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let path = env::args().nth(1).unwrap_or_else(|| DEFAULT_CONFIG.to_string());
    let sites = match Sites::from_file(&path).and_then(|sites| sites.check_roots().map(|_| sites)) {
        Ok(sites) => Arc::new(sites),
        Err(err) => {
            error!("{}", err);
            process::exit(1);
        }
    };

    let result = async_std::task::block_on(async {
        let server = Server::bind(sites).await?;
        server.run().await
    });
    if let Err(err) = result {
        error!("Server stopped: {}", err);
        process::exit(1);
    }
}
