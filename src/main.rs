mod cli;

use std::{env, io, sync::Arc};

use tokio::{net::TcpListener, signal, task, time};

use calshare::{store, KvStore, MemoryStore, StateService};

const LOG_ENV: &str = "CALSHARE_LOG";
const SWEEP_INTERVAL: time::Duration = time::Duration::from_secs(60 * 60);

fn setup_logging() {
    env_logger::Builder::from_env(env_logger::Env::new().filter_or(LOG_ENV, "calshare=info"))
        .init();
}

#[tokio::main]
async fn main() -> io::Result<()> {
    let args = cli::parse(env::args().skip(1).collect());

    setup_logging();

    let memory = MemoryStore::new(store::Config {
        capacity: args.capacity,
    });
    task::spawn(sweep(Arc::clone(&memory)));

    let store: Arc<dyn KvStore> = memory;
    let router = calshare::router(StateService::new(store, args.ttl));

    let listener = TcpListener::bind(args.address).await?;
    log::info!(
        "Listening at http://{}, keeping calendars for {} days",
        args.address,
        args.ttl.as_secs() / (60 * 60 * 24)
    );

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown())
        .await
}

async fn sweep(store: Arc<MemoryStore>) {
    let mut interval = time::interval(SWEEP_INTERVAL);
    loop {
        interval.tick().await;
        let removed = store.sweep().await;
        if removed > 0 {
            log::debug!("Swept {removed} expired entries");
        }
    }
}

async fn shutdown() {
    if let Err(err) = signal::ctrl_c().await {
        log::error!("Failed to listen for shutdown signal: {err}");
        std::future::pending::<()>().await;
    }
    log::info!("Shutting down");
}
