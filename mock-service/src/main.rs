use std::net::SocketAddr;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("mock_service=info,tower_http=info"));
    FmtSubscriber::builder().with_env_filter(filter).init();

    let addr: SocketAddr = "0.0.0.0:9999".parse()?;
    mock_service::run(addr).await?;
    Ok(())
}
