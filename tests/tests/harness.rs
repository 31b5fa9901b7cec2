mod utils;

#[cfg(test)]
mod tests {
    use crate::utils::init;
    use mock_service::MockOptions;
    use rinha::core::{
        Endpoint, HarnessConfig, ScenarioConfig, Stage, TransactionRequest, TransactionResponse,
    };
    use rinha::prelude::*;
    use rinha::scenarios::{CLIENT_NOT_FOUND, CREDITS, DEBITS, STATEMENTS, VALIDATION};
    use rinha::validator::transaction_within_limit;
    use rinha_runtime::RinhaRuntime;
    use std::time::Duration;

    fn config(scenarios: Vec<ScenarioConfig>) -> HarnessConfig {
        HarnessConfig {
            scenarios,
            ..HarnessConfig::default()
        }
    }

    #[tracing_test::traced_test]
    #[tokio::test]
    #[ntest::timeout(20_000)]
    async fn validation_passes_against_a_correct_ledger() {
        let executor = init(MockOptions::default()).await;
        let config = config(vec![
            ScenarioConfig::fixed(VALIDATION, 5, 1),
            ScenarioConfig::fixed(CLIENT_NOT_FOUND, 1, 1),
        ]);

        let stats = Scheduler::new(&config, &ScenarioRegistry::default(), executor)
            .unwrap()
            .run()
            .await;

        assert!(stats.checks.all_passed(), "{:?}", stats.checks);
        // 5 workers x 13 checks each, plus the 404 probe.
        assert_eq!(stats.checks.passed, 66);
        assert_eq!(stats.checks.by_name["status is 404"].passed, 1);
        assert_eq!(stats.checks.by_name["recent transactions in order"].passed, 5);
        assert_eq!(stats.checks.by_name["rejects null description"].passed, 5);

        // 2 statements + 7 transactions per validation iteration.
        assert_eq!(stats.summary.get(Endpoint::Statement).count, 11);
        assert_eq!(stats.summary.get(Endpoint::Transactions).count, 35);
    }

    #[tracing_test::traced_test]
    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    #[ntest::timeout(20_000)]
    async fn ramping_load_stays_consistent() {
        let executor = init(MockOptions::default()).await;
        let stages = [
            Stage::new(Duration::from_millis(300), 4),
            Stage::new(Duration::from_millis(200), 4),
        ];
        let config = config(vec![
            ScenarioConfig::ramping(DEBITS, 1, &stages).start_offset(Duration::from_millis(50)),
            ScenarioConfig::ramping(CREDITS, 1, &stages).start_offset(Duration::from_millis(50)),
            ScenarioConfig::fixed(STATEMENTS, 2, 10),
        ]);

        let stats = Scheduler::new(&config, &ScenarioRegistry::default(), executor)
            .unwrap()
            .run()
            .await;

        assert!(stats.checks.all_passed(), "{:?}", stats.checks);
        for name in [DEBITS, CREDITS] {
            let scenario = stats.scenario(name).unwrap();
            assert!(scenario.peak_workers <= 4, "{scenario}");
            assert!(scenario.iterations > 0, "{scenario}");
            assert_eq!(scenario.transport_failures, 0);
        }
        assert_eq!(stats.scenario(STATEMENTS).unwrap().iterations, 20);

        let transactions = stats.summary.get(Endpoint::Transactions);
        assert!(transactions.count > 0);
        assert!(transactions.min <= transactions.p95 && transactions.p95 <= transactions.max);
    }

    #[tracing_test::traced_test]
    #[tokio::test]
    #[ntest::timeout(10_000)]
    async fn limit_violations_are_counted() {
        let executor = init(MockOptions { ignore_limit: true }).await;
        let mut registry = ScenarioRegistry::empty();
        registry.register("estouro", |worker: Worker| async move {
            let request = TransactionRequest::debit(60_000, "estoura");
            let res = worker.transaction(1, &request).await?;
            worker.check(
                "balance within limit",
                transaction_within_limit(res.json::<TransactionResponse>().as_ref()),
            );
            Ok::<_, Error>(())
        });

        let config = config(vec![ScenarioConfig::fixed("estouro", 1, 3)]);
        let stats = Scheduler::new(&config, &registry, executor)
            .unwrap()
            .run()
            .await;

        // -60k is fine, -120k and -180k break the 100k limit.
        let tally = &stats.checks.by_name["balance within limit"];
        assert_eq!(tally.passed, 1);
        assert_eq!(tally.failed, 2);
        assert!(!stats.checks.all_passed());
    }

    #[tracing_test::traced_test]
    #[tokio::test]
    #[ntest::timeout(10_000)]
    async fn shutdown_cuts_a_long_ramp_short() {
        let executor = init(MockOptions::default()).await;
        let config = config(vec![ScenarioConfig::ramping(
            STATEMENTS,
            2,
            &[Stage::new(Duration::from_secs(600), 2)],
        )]);

        let run = Scheduler::new(&config, &ScenarioRegistry::default(), executor)
            .unwrap()
            .start();
        let shutdown = run.shutdown_handle();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(200)).await;
            shutdown.trigger();
        });

        let stats = run.wait().await;
        let scenario = stats.scenario(STATEMENTS).unwrap();
        assert!(scenario.elapsed < Duration::from_secs(5), "{scenario}");
        assert!(stats.checks.all_passed());
    }

    #[tracing_test::traced_test]
    #[tokio::test]
    #[ntest::timeout(10_000)]
    async fn runtime_end_to_end() {
        let executor = init(MockOptions::default()).await;
        let stats = RinhaRuntime::new()
            .base_url(executor.base_url().as_str())
            .report(None)
            .config(config(vec![ScenarioConfig::fixed(STATEMENTS, 2, 3)]))
            .run()
            .await
            .unwrap();

        assert!(stats.checks.all_passed());
        // Preflight is not part of the summary.
        assert_eq!(stats.summary.get(Endpoint::Statement).count, 6);
    }
}
