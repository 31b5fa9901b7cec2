mod utils;

#[cfg(test)]
mod tests {
    use crate::utils::init;
    use mock_service::MockOptions;
    use rinha::core::{
        ExpectedEntry, HarnessConfig, Statement, TransactionRequest, TransactionResponse,
        REJECTION_STATUSES,
    };
    use rinha::scenarios::invalid_payloads;
    use rinha::validator::{
        statement_matches_seed, status_matches, transaction_order_correct,
        transaction_within_limit,
    };

    #[tracing_test::traced_test]
    #[tokio::test]
    #[ntest::timeout(10_000)]
    async fn seeded_clients_start_at_zero() {
        let executor = init(MockOptions::default()).await;

        for client in HarnessConfig::default().clients {
            let res = executor.statement(client.id).await.unwrap();
            assert_eq!(res.status, 200);
            let statement = res.json::<Statement>();
            assert!(statement_matches_seed(statement.as_ref(), &client));
        }

        let res = executor.statement(6).await.unwrap();
        assert_eq!(res.status, 404);
    }

    #[tracing_test::traced_test]
    #[tokio::test]
    #[ntest::timeout(10_000)]
    async fn statement_lists_newest_first() {
        let executor = init(MockOptions::default()).await;
        let issued = [
            TransactionRequest::credit(10, "primeira"),
            TransactionRequest::debit(3, "segunda"),
            TransactionRequest::credit(1, "terceira"),
        ];

        for request in &issued {
            let res = executor.transaction(1, request).await.unwrap();
            assert_eq!(res.status, 200);
            assert!(transaction_within_limit(res.json::<TransactionResponse>().as_ref()));
        }

        let res = executor.statement(1).await.unwrap();
        let statement = res.json::<Statement>().unwrap();
        assert_eq!(statement.balance.as_ref().unwrap().total, Some(8));

        let expected: Vec<_> = issued.iter().map(ExpectedEntry::from).collect();
        assert!(transaction_order_correct(Some(&statement), &expected[1..]));
        assert!(!transaction_order_correct(Some(&statement), &expected[..2]));
    }

    #[tracing_test::traced_test]
    #[tokio::test]
    #[ntest::timeout(10_000)]
    async fn malformed_writes_are_rejected() {
        let executor = init(MockOptions::default()).await;

        for (label, payload) in invalid_payloads() {
            let res = executor.transaction(1, &payload).await.unwrap();
            assert!(status_matches(res.status, &REJECTION_STATUSES), "{label}");
        }

        let over_limit = TransactionRequest::debit(100_001, "estoura");
        let res = executor.transaction(1, &over_limit).await.unwrap();
        assert_eq!(res.status, 422);

        let statement = executor.statement(1).await.unwrap().json::<Statement>().unwrap();
        assert_eq!(statement.balance.unwrap().total, Some(0));
        assert_eq!(statement.recent_transactions.map(|t| t.len()), Some(0));
    }

    #[tracing_test::traced_test]
    #[tokio::test]
    #[ntest::timeout(10_000)]
    async fn faulty_ledger_breaks_the_limit() {
        let executor = init(MockOptions { ignore_limit: true }).await;

        let over_limit = TransactionRequest::debit(100_001, "estoura");
        let res = executor.transaction(1, &over_limit).await.unwrap();
        assert_eq!(res.status, 200);
        assert!(!transaction_within_limit(res.json::<TransactionResponse>().as_ref()));
    }
}
