use duokv::config::Config;
use duokv::error::DuoError;
use duokv::server;
use duokv::store::new_shared_store;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    let args: Vec<String> = std::env::args().skip(1).collect();

    if args
        .first()
        .is_some_and(|mode| mode.eq_ignore_ascii_case("client"))
    {
        eprintln!("The client is a separate binary, run `duokv-cli` instead.");
        std::process::exit(2);
    }

    let config = match Config::load(&args) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{e}");
            if matches!(e, DuoError::UnknownMode(_)) {
                eprintln!("Usage: duokv [server] [--bind ADDR] [--tcp-port N] [--udp-port N]");
            }
            std::process::exit(2);
        }
    };

    // Initialize tracing
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.loglevel));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    info!("duokv v{}", env!("CARGO_PKG_VERSION"));

    if let Err(e) = server::run_server(new_shared_store(), config).await {
        tracing::error!("Server error: {e}");
        std::process::exit(1);
    }

    info!("Server stopped");
}
