use std::sync::Arc;

use common::cli::ServerConfig;
use common::endpoints::{self, Services};
use common::errors::Result;
use common::http::{default_workers, HttpServer};
use common::orders::file::JsonFileOrderStore;
use common::session::{memory::MemorySessionStore, sqlite::SQLiteSessionStore, SessionStore};

fn main() -> Result<()> {
    pretty_env_logger::init();

    let config = ServerConfig::from_args(
        std::env::args(),
        |key| std::env::var(key).ok(),
        default_workers(),
    )?;
    log::debug!("{:?}", config);

    let sessions: Box<dyn SessionStore> = match &config.session_db {
        Some(path) => {
            log::info!("Keeping sessions in {}", path.display());
            Box::new(SQLiteSessionStore::open(path)?)
        }
        None => {
            log::warn!("Keeping sessions in memory, they are never evicted");
            Box::new(MemorySessionStore::new())
        }
    };
    let orders = JsonFileOrderStore::new(&config.orders_dir)?;
    log::info!("Order records in {}", config.orders_dir.display());

    let services = Arc::new(Services::new(sessions, Box::new(orders)));
    let router = Arc::new(endpoints::create_http_router()?);

    let server = HttpServer::new(&config.address)?;
    server.serve(config.workers, move |request| {
        endpoints::handle(&router, &services, request)
    })
}
