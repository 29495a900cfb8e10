use clap::Parser;
use grade_book::config::Cli;
use grade_book::grades;
use grade_book::http::server::Server;
use grade_book::store::RecordStore;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "grade_book=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    let store = Arc::new(RecordStore::open(&cli.data_file));
    info!(
        data_file = %store.path().display(),
        subjects = store.len(),
        "loaded subjects"
    );

    let server = Server::bind(
        cli.bind_addr(),
        grades::router(store),
        cli.server_config(),
        usize::from(cli.workers),
    )?;

    info!(
        address = %server.local_addr()?,
        server_name = %cli.server_name,
        workers = cli.workers,
        "serving"
    );

    server.run()
}
