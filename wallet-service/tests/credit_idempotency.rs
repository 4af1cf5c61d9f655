use std::sync::Arc;

use futures::future::join_all;
use uuid::Uuid;
use wallet_service::store::{CreditOutcome, MemoryWalletStore, NewFundingTransaction, WalletStore};

fn new_tx(reference: &str, user_id: Uuid, amount_minor: i64) -> NewFundingTransaction {
    NewFundingTransaction {
        reference: reference.to_string(),
        user_id,
        email: "a@b.com".to_string(),
        amount_minor,
        currency: "NGN".to_string(),
        metadata: None,
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_verifies_credit_exactly_once() {
    let store = Arc::new(MemoryWalletStore::new());
    let user = Uuid::new_v4();
    let tx = new_tx("TXN-1754388000000-111111", user, 500_000);

    let tasks = (0..8).map(|_| {
        let store = store.clone();
        let tx = tx.clone();
        tokio::spawn(async move { store.credit_once(&tx).await.unwrap() })
    });
    let outcomes = join_all(tasks).await;

    let credited = outcomes
        .into_iter()
        .map(|res| res.unwrap())
        .filter(|outcome| *outcome == CreditOutcome::Credited)
        .count();
    assert_eq!(credited, 1, "exactly one concurrent verify may credit");
    assert_eq!(store.balance_minor(user).await.unwrap(), 500_000);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_credits_for_distinct_references_all_land() {
    let store = Arc::new(MemoryWalletStore::new());
    let user = Uuid::new_v4();

    let tasks = (0..10).map(|i| {
        let store = store.clone();
        let tx = new_tx(&format!("TXN-1754388000000-{i}"), user, 100);
        tokio::spawn(async move { store.credit_once(&tx).await.unwrap() })
    });
    let outcomes = join_all(tasks).await;

    assert!(outcomes
        .into_iter()
        .all(|res| res.unwrap() == CreditOutcome::Credited));
    assert_eq!(store.balance_minor(user).await.unwrap(), 1_000);
}
