use mock_service::MockOptions;
use rinha::Executor;
use std::sync::OnceLock;
use tracing::error;

/// Start a fresh mock ledger and point an executor at it.
#[allow(unused)]
pub async fn init(options: MockOptions) -> Executor {
    static ONCE_LOCK: OnceLock<()> = OnceLock::new();

    ONCE_LOCK.get_or_init(|| {
        let default_panic = std::panic::take_hook();
        std::panic::set_hook(Box::new(move |info| {
            default_panic(info);
            error!("Panic occurred: {info:?}");
        }));
    });

    let addr = mock_service::spawn(options).await.unwrap();
    Executor::new(&format!("http://{addr}")).unwrap()
}
