use rinha_runtime::{runtime::init_tracing, RinhaRuntime};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let stats = RinhaRuntime::new().with_args().run().await?;
    if !stats.checks.all_passed() {
        anyhow::bail!("{} checks failed", stats.checks.failed);
    }

    Ok(())
}
