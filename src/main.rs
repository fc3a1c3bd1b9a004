use short_links::config::{self, Config};
use short_links::server;
use tracing_subscriber::EnvFilter;

fn init_tracing(config: &Config) {
    let filter = EnvFilter::try_new(&config.log_level).unwrap_or_else(|_| EnvFilter::new("info"));

    let subscriber_builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_level(true);

    if config.log_format == "json" {
        subscriber_builder.json().init();
    } else {
        subscriber_builder.init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let config = config::load_from_env()?;
    init_tracing(&config);
    config.print_summary();

    server::run(config).await
}
