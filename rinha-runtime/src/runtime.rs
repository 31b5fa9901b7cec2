//! Command line runtime for the stress harness.
//!
//! Runs every configured scenario against a single target, then prints the
//! JSON summary to stdout and writes the HTML report next to it.
use clap::Parser;
use crate::error::RuntimeError;
use crate::report::{render_html, render_json};
use rinha::core::{HarnessConfig, RunStatistics, DEFAULT_BASE_URL};
use rinha::{Error, Executor, ScenarioRegistry, Scheduler, Shutdown};
use std::path::PathBuf;
use std::time::Duration;
#[allow(unused)]
use tracing::{debug, error, info, instrument, warn, Instrument};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

const DEFAULT_REPORT: &str = "stress-test-report.html";
const DEFAULT_FILTER: &str = "rinha=info,rinha_runtime=info";

#[derive(Parser, Debug, Clone)]
#[command(version, about = "Stress test a rinha ledger API")]
pub struct RuntimeArgs {
    /// Target API, e.g. http://localhost:9999
    #[arg(short, long, env = "BASE_URL", default_value = DEFAULT_BASE_URL)]
    pub base_url: String,

    /// Where the HTML report is written.
    #[arg(short, long, default_value = DEFAULT_REPORT)]
    pub report: PathBuf,

    /// Stop starting new iterations after this long (e.g. `90s`, `5m`).
    #[arg(short, long, value_parser = humantime::parse_duration)]
    pub max_duration: Option<Duration>,

    /// Skip the reachability probe before the run.
    #[arg(long)]
    pub skip_preflight: bool,
}

/// Install the global `tracing` subscriber. `RUST_LOG` overrides the default filter.
pub fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .finish();

    if tracing::subscriber::set_global_default(subscriber).is_err() {
        debug!("Global subscriber already set");
    }
}

/// Harness runtime.
///
/// # Example
///
/// ```no_run
/// use rinha_runtime::RinhaRuntime;
///
/// #[tokio::main]
/// async fn main() -> anyhow::Result<()> {
///     RinhaRuntime::new().with_args().run().await?;
///     Ok(())
/// }
/// ```
pub struct RinhaRuntime {
    base_url: String,
    report: Option<PathBuf>,
    max_duration: Option<Duration>,
    preflight: bool,
    config: HarnessConfig,
    registry: ScenarioRegistry,
}

impl Default for RinhaRuntime {
    fn default() -> Self {
        Self::new()
    }
}

impl RinhaRuntime {
    pub fn new() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            report: Some(PathBuf::from(DEFAULT_REPORT)),
            max_duration: None,
            preflight: true,
            config: HarnessConfig::default(),
            registry: ScenarioRegistry::default(),
        }
    }

    /// Apply the command line arguments.
    ///
    /// ```ignore
    /// $ rinha --base-url http://localhost:9999 --max-duration 90s
    /// $ BASE_URL=http://api:8080 rinha --report out.html
    /// ```
    pub fn with_args(self) -> Self {
        self.args(RuntimeArgs::parse())
    }

    pub fn args(mut self, args: RuntimeArgs) -> Self {
        self.base_url = args.base_url;
        self.report = Some(args.report);
        self.max_duration = args.max_duration;
        self.preflight = !args.skip_preflight;
        self
    }

    pub fn base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.to_string();
        self
    }

    /// `None` disables the HTML report.
    pub fn report(mut self, path: Option<PathBuf>) -> Self {
        self.report = path;
        self
    }

    pub fn max_duration(mut self, max_duration: Duration) -> Self {
        self.max_duration = Some(max_duration);
        self
    }

    pub fn preflight(mut self, enabled: bool) -> Self {
        self.preflight = enabled;
        self
    }

    pub fn config(mut self, config: HarnessConfig) -> Self {
        self.config = config;
        self
    }

    pub fn registry(mut self, registry: ScenarioRegistry) -> Self {
        self.registry = registry;
        self
    }

    #[instrument(name = "rinha", skip_all, fields(base_url = %self.base_url))]
    pub async fn run(self) -> Result<RunStatistics, RuntimeError> {
        let executor = Executor::new(&self.base_url)?;

        if self.preflight {
            preflight(&executor, &self.config).await?;
        }

        let scheduler = Scheduler::new(&self.config, &self.registry, executor)?;
        for scenario in &self.config.scenarios {
            info!("Scheduled {scenario}");
        }

        let shutdown = scheduler.shutdown_handle();
        let watcher = tokio::spawn(watch_shutdown(shutdown, self.max_duration).in_current_span());

        let stats = scheduler.run().await;
        watcher.abort();

        for scenario in &stats.scenarios {
            info!("{scenario}");
        }
        if stats.checks.all_passed() {
            info!("All {} checks passed", stats.checks.passed);
        } else {
            warn!(
                "{} of {} checks failed",
                stats.checks.failed,
                stats.checks.passed + stats.checks.failed
            );
            for (name, count) in stats.checks.by_name.iter().filter(|(_, c)| c.failed > 0) {
                warn!("Check \"{name}\" failed {} times", count.failed);
            }
        }

        println!("{}", render_json(&stats.summary, &stats.checks)?);

        if let Some(path) = &self.report {
            tokio::fs::write(path, render_html(&stats.summary)).await?;
            info!("Report written to {}", path.display());
        }

        Ok(stats)
    }
}

async fn preflight(executor: &Executor, config: &HarnessConfig) -> Result<(), Error> {
    let Some(client) = config.clients.first() else {
        return Ok(());
    };

    let status = executor.preflight(client.id).await?;
    debug!("Preflight returned {status}");
    Ok(())
}

async fn watch_shutdown(shutdown: Shutdown, max_duration: Option<Duration>) {
    let interrupted = async {
        match tokio::signal::ctrl_c().await {
            Ok(()) => info!("Interrupted"),
            Err(err) => {
                error!("Unable to listen for Ctrl-C: {err}");
                std::future::pending::<()>().await;
            }
        }
    };

    let deadline = async {
        match max_duration {
            Some(max) => {
                tokio::time::sleep(max).await;
                info!("Maximum duration of {} reached", humantime::format_duration(max));
            }
            None => std::future::pending::<()>().await,
        }
    };

    tokio::select! {
        _ = interrupted => {}
        _ = deadline => {}
    }

    shutdown.trigger();
}

#[cfg(test)]
mod tests {
    use super::*;
    use rinha::core::{ClientSeed, ScenarioConfig};
    use rinha::scenarios::CLIENT_NOT_FOUND;

    fn closed_url() -> String {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        format!("http://{}", listener.local_addr().unwrap())
    }

    fn small_config() -> HarnessConfig {
        HarnessConfig {
            clients: vec![ClientSeed::new(1, 100_000)],
            scenarios: vec![ScenarioConfig::fixed(CLIENT_NOT_FOUND, 1, 2)],
        }
    }

    #[test]
    fn args_parse() {
        let args = RuntimeArgs::try_parse_from([
            "rinha",
            "--base-url",
            "http://api:8080",
            "--max-duration",
            "90s",
            "--skip-preflight",
        ])
        .unwrap();

        assert_eq!(args.base_url, "http://api:8080");
        assert_eq!(args.report, PathBuf::from(DEFAULT_REPORT));
        assert_eq!(args.max_duration, Some(Duration::from_secs(90)));
        assert!(args.skip_preflight);
    }

    #[test]
    fn args_reject_bad_duration() {
        assert!(RuntimeArgs::try_parse_from(["rinha", "--max-duration", "soon"]).is_err());
    }

    #[tracing_test::traced_test]
    #[tokio::test]
    async fn preflight_fails_fast() {
        let res = RinhaRuntime::new()
            .base_url(&closed_url())
            .report(None)
            .run()
            .await;

        assert!(matches!(
            res,
            Err(RuntimeError::Harness(Error::Unreachable { .. }))
        ));
    }

    #[tracing_test::traced_test]
    #[tokio::test]
    async fn invalid_base_url() {
        let res = RinhaRuntime::new()
            .base_url("not a url")
            .report(None)
            .run()
            .await;

        assert!(matches!(
            res,
            Err(RuntimeError::Harness(Error::InvalidBaseUrl { .. }))
        ));
    }

    #[tracing_test::traced_test]
    #[tokio::test]
    async fn unreachable_target_still_reports() {
        let report = std::env::temp_dir().join(format!(
            "rinha-report-{}-{}.html",
            std::process::id(),
            line!()
        ));

        let stats = RinhaRuntime::new()
            .base_url(&closed_url())
            .preflight(false)
            .config(small_config())
            .report(Some(report.clone()))
            .run()
            .await
            .unwrap();

        let scenario = stats.scenario(CLIENT_NOT_FOUND).unwrap();
        assert_eq!(scenario.iterations, 2);
        assert_eq!(scenario.transport_failures, 2);
        assert_eq!(stats.checks.by_name["request completed"].failed, 2);

        let html = std::fs::read_to_string(&report).unwrap();
        assert!(html.contains("Offline Dashboard Report"));
        let _ = std::fs::remove_file(report);
    }
}
