//! 销售分配测试
//!
//! 测试覆盖：
//! - 加权选择的分布（固定种子）
//! - 空候选、平局稳定性
//! - 回填命令在内存 Unit of Work 上的完整流程

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{Duration, Utc};
use club_accounts::application::commands::assignment::BackfillSellerAssignmentsCommand;
use club_accounts::application::handlers::assignment::BackfillSellerAssignmentsHandler;
use club_accounts::domain::assignment::{BackfillReport, Candidate, SelectionPolicy};
use club_accounts::domain::services::assignment::SellerSelector;
use club_accounts::infrastructure::persistence::memory::InMemoryStore;
use club_common::SellerId;
use club_cqrs_core::CommandHandler;

const SEED: u64 = 20_260_301;

fn ids(n: usize) -> Vec<SellerId> {
    (0..n).map(|_| SellerId::new()).collect()
}

// ============================================================================
// 选择器
// ============================================================================

#[test]
fn test_weighted_selection_prefers_idle_sellers() {
    const TRIALS: usize = 10_000;

    let sellers = ids(3);
    let candidates = [
        Candidate::new(sellers[0], 0),
        Candidate::new(sellers[1], 0),
        Candidate::new(sellers[2], 5),
    ];
    let selector = SellerSelector::with_seed(SelectionPolicy::WeightedRandom, SEED);

    let mut counts: HashMap<SellerId, usize> = HashMap::new();
    for _ in 0..TRIALS {
        let picked = selector.select_assignee(&candidates).unwrap();
        *counts.entry(picked).or_default() += 1;
    }

    let a = counts.get(&sellers[0]).copied().unwrap_or(0);
    let b = counts.get(&sellers[1]).copied().unwrap_or(0);
    let c = counts.get(&sellers[2]).copied().unwrap_or(0);
    assert_eq!(a + b + c, TRIALS);

    // 权重 1 : 1 : 1/6，期望约 4615 / 4615 / 769
    let diff = a.abs_diff(b);
    assert!(diff < TRIALS / 20, "idle sellers diverged: {a} vs {b}");
    assert!(a > 3 * c && b > 3 * c, "loaded seller picked too often: {c}");
    assert!(c > 0, "loaded seller must still be reachable");
}

#[test]
fn test_empty_candidates_yield_none() {
    for policy in [SelectionPolicy::WeightedRandom, SelectionPolicy::LeastLoaded] {
        let selector = SellerSelector::with_seed(policy, SEED);
        for _ in 0..10 {
            assert_eq!(selector.select_assignee(&[]), None);
        }
    }
}

#[test]
fn test_tie_is_stable_for_same_seed_and_order() {
    let sellers = ids(2);
    let candidates = [Candidate::new(sellers[0], 3), Candidate::new(sellers[1], 3)];

    let run = || {
        let selector = SellerSelector::with_seed(SelectionPolicy::WeightedRandom, SEED);
        (0..20)
            .map(|_| selector.select_assignee(&candidates).unwrap())
            .collect::<Vec<_>>()
    };

    assert_eq!(run(), run());
}

#[test]
fn test_least_loaded_tie_takes_first_in_order() {
    let sellers = ids(2);
    let selector = SellerSelector::new(SelectionPolicy::LeastLoaded);

    let forward = [Candidate::new(sellers[0], 3), Candidate::new(sellers[1], 3)];
    let backward = [Candidate::new(sellers[1], 3), Candidate::new(sellers[0], 3)];

    for _ in 0..10 {
        assert_eq!(selector.select_assignee(&forward), Some(sellers[0]));
        assert_eq!(selector.select_assignee(&backward), Some(sellers[1]));
    }
}

// ============================================================================
// 回填
// ============================================================================

fn backfill_handler(store: &InMemoryStore, policy: SelectionPolicy) -> BackfillSellerAssignmentsHandler {
    BackfillSellerAssignmentsHandler::new(
        Arc::new(store.clone()),
        Arc::new(store.clone()),
        Arc::new(SellerSelector::with_seed(policy, SEED)),
        100,
    )
}

#[tokio::test]
async fn test_backfill_assigns_every_unassigned_client() {
    let store = InMemoryStore::new();
    let ana = store.insert_seller("Ana", true).await;
    let bruno = store.insert_seller("Bruno", true).await;
    store.insert_seller("Carla (on leave)", false).await;

    let start = Utc::now();
    let mut clients = Vec::new();
    for i in 0..6 {
        let id = store
            .insert_client(&format!("Client {i}"), None, start + Duration::seconds(i))
            .await;
        clients.push(id);
    }

    let report = backfill_handler(&store, SelectionPolicy::LeastLoaded)
        .handle(BackfillSellerAssignmentsCommand::default())
        .await
        .unwrap();

    assert_eq!(
        report,
        BackfillReport {
            assigned: 6,
            skipped_no_candidate: 0,
            lost_race: 0,
        }
    );

    // 最小负载策略下两人平分
    assert_eq!(store.seller_load(&ana).await, 3);
    assert_eq!(store.seller_load(&bruno).await, 3);
    for id in &clients {
        let seller = store.client(id).await.unwrap().seller_id;
        assert!(seller == Some(ana) || seller == Some(bruno));
    }
}

#[tokio::test]
async fn test_backfill_respects_limit_and_existing_assignments() {
    let store = InMemoryStore::new();
    let ana = store.insert_seller("Ana", true).await;
    let start = Utc::now();

    let already = store.insert_client("Existing", Some(ana), start).await;
    for i in 1..=4 {
        store
            .insert_client(&format!("Client {i}"), None, start + Duration::seconds(i))
            .await;
    }

    let handler = backfill_handler(&store, SelectionPolicy::WeightedRandom);
    let report = handler
        .handle(BackfillSellerAssignmentsCommand { limit: Some(2) })
        .await
        .unwrap();

    assert_eq!(report.assigned, 2);
    assert_eq!(store.seller_load(&ana).await, 3);
    assert_eq!(store.client(&already).await.unwrap().seller_id, Some(ana));

    let report = handler
        .handle(BackfillSellerAssignmentsCommand::default())
        .await
        .unwrap();
    assert_eq!(report.assigned, 2);
    assert_eq!(store.seller_load(&ana).await, 5);
}

#[tokio::test]
async fn test_backfill_without_sellers_skips_clients() {
    let store = InMemoryStore::new();
    store.insert_seller("Inactive", false).await;
    let client = store.insert_client("Lonely", None, Utc::now()).await;

    let report = backfill_handler(&store, SelectionPolicy::WeightedRandom)
        .handle(BackfillSellerAssignmentsCommand::default())
        .await
        .unwrap();

    assert_eq!(report.skipped_no_candidate, 1);
    assert_eq!(report.processed(), 1);
    assert_eq!(store.client(&client).await.unwrap().seller_id, None);
}

#[tokio::test]
async fn test_backfill_balances_load_with_weighted_policy() {
    let store = InMemoryStore::new();
    let busy = store.insert_seller("Busy", true).await;
    let idle = store.insert_seller("Idle", true).await;
    let start = Utc::now();

    for i in 0..10 {
        store
            .insert_client(&format!("Legacy {i}"), Some(busy), start)
            .await;
    }
    for i in 0..20 {
        store
            .insert_client(&format!("New {i}"), None, start + Duration::seconds(i + 1))
            .await;
    }

    let report = backfill_handler(&store, SelectionPolicy::WeightedRandom)
        .handle(BackfillSellerAssignmentsCommand::default())
        .await
        .unwrap();

    assert_eq!(report.assigned, 20);
    // 负载在每个事务内重新读取，空闲销售应拿到多数新客户
    assert!(store.seller_load(&idle).await > 10);
}
