use frame_heartbeat::chain::mock::SignerFailure;
use frame_heartbeat::chain::{ChainError, MockChainReader, MockSigner, PoolStateRecord};
use frame_heartbeat::db::init_db;
use frame_heartbeat::domain::{
    Address, Amount, ChangeEvent, ClaimMode, ClaimOutcome, DiffAnomaly, PoolKey, VestingReading,
};
use frame_heartbeat::engine::{derive_pool_id, Correlation};
use frame_heartbeat::orchestration::{ClaimExecutor, Collector, Heartbeat};
use frame_heartbeat::registry::load_registry_dir;
use frame_heartbeat::Repository;
use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;

const CHAIN_ID: u64 = 8453;
const BUILDER: &str = "0x00000000000000000000000000000000000000b1";
const PRODUCT: &str = "0x00000000000000000000000000000000000000f1";
const LATE: &str = "0x00000000000000000000000000000000000000c1";
const WALLET: &str = "0x0000000000000000000000000000000000000099";
const INITIALIZER: &str = "0x0000000000000000000000000000000000000050";

fn addr(s: &str) -> Address {
    Address::parse(s).unwrap()
}

fn pool_key(asset: &str) -> PoolKey {
    PoolKey {
        currency0: addr(asset),
        currency1: addr("0x4200000000000000000000000000000000000006"),
        fee: 20_000,
        tick_spacing: 200,
        hooks: addr("0x00000000000000000000000000000000000000aa"),
    }
}

fn pool(asset: &str, status_code: u8) -> PoolStateRecord {
    PoolStateRecord {
        numeraire: addr("0x4200000000000000000000000000000000000006"),
        status_code,
        key: pool_key(asset),
        far_tick: -887_200,
    }
}

fn write_token(dir: &Path, file: &str, body: serde_json::Value) {
    std::fs::write(dir.join(file), serde_json::to_string_pretty(&body).unwrap()).unwrap();
}

struct TestEnv {
    repo: Arc<Repository>,
    registry: TempDir,
    _db: TempDir,
}

async fn setup_env() -> TestEnv {
    let db = TempDir::new().unwrap();
    let db_path = db.path().join("frame.db").to_string_lossy().to_string();
    let pool = init_db(&db_path).await.expect("init_db failed");
    let repo = Arc::new(Repository::new(pool));

    let registry = TempDir::new().unwrap();
    write_token(
        registry.path(),
        "BLD.json",
        serde_json::json!({
            "name": "Builder",
            "symbol": "BLD",
            "category": "builder",
            "address": BUILDER,
            "chainId": CHAIN_ID,
            "launchedAt": "2025-01-02T03:04:05.000Z"
        }),
    );
    write_token(
        registry.path(),
        "PRD.json",
        serde_json::json!({
            "name": "Product",
            "symbol": "PRD",
            "category": "product",
            "address": PRODUCT,
            "builderCoin": BUILDER
        }),
    );
    import_registry(&repo, registry.path()).await;

    TestEnv {
        repo,
        registry,
        _db: db,
    }
}

async fn import_registry(repo: &Repository, dir: &Path) {
    let entities = load_registry_dir(dir, CHAIN_ID).unwrap();
    repo.upsert_entities(&entities).await.unwrap();
}

fn heartbeat(repo: &Arc<Repository>, reader: MockChainReader, signer: Arc<MockSigner>) -> Heartbeat {
    Heartbeat::new(
        repo.clone(),
        Collector::new(Arc::new(reader), addr(WALLET), 4),
        ClaimExecutor::new(signer, addr(INITIALIZER), 4),
        50,
    )
}

fn baseline_reader() -> MockChainReader {
    MockChainReader::new()
        .with_vesting(addr(BUILDER), 100, 40)
        .with_vesting(addr(PRODUCT), 0, 0)
        .with_pool(addr(BUILDER), pool(BUILDER, 2))
        .with_pool(addr(PRODUCT), pool(PRODUCT, 1))
}

#[tokio::test]
async fn test_builder_and_product_scenario() {
    let env = setup_env().await;
    let signer = Arc::new(MockSigner::new(addr(WALLET)));
    let hb = heartbeat(&env.repo, baseline_reader(), signer.clone());

    let result = hb.run(false).await.unwrap();

    let summary = &result.snapshot.summary;
    assert_eq!(summary.builders, 1);
    assert_eq!(summary.products, 1);
    assert_eq!(summary.active_pools, 1);
    assert_eq!(summary.total_vesting_claimable, Amount::from_raw(60).unwrap());

    let builder = result.impact.builder("BLD").unwrap();
    assert!(builder.healthy);
    assert_eq!(builder.products, vec!["PRD".to_string()]);
    assert_eq!(builder.product_correlations.len(), 1);
    assert_eq!(builder.product_correlations[0].product, "PRD");
    assert_eq!(
        builder.product_correlations[0].correlation,
        Correlation::Check
    );

    assert!(result.changes.is_first);
    assert!(result.changes.changes.is_empty());

    // Dry-run preview: the active builder only, no signer traffic.
    assert_eq!(result.claims.mode, ClaimMode::DryRun);
    assert_eq!(result.claims.records.len(), 1);
    assert_eq!(result.claims.records[0].symbol, "BLD");
    assert_eq!(result.claims.records[0].outcome, ClaimOutcome::DryRun);
    assert_eq!(
        result.claims.records[0].pool_id,
        derive_pool_id(&pool_key(BUILDER))
    );
    assert!(signer.submissions().is_empty());
}

#[tokio::test]
async fn test_second_cycle_reports_transitions() {
    let env = setup_env().await;
    let signer = Arc::new(MockSigner::new(addr(WALLET)));
    heartbeat(&env.repo, baseline_reader(), signer.clone())
        .run(false)
        .await
        .unwrap();

    write_token(
        env.registry.path(),
        "LATE.json",
        serde_json::json!({
            "name": "Latecomer",
            "symbol": "LATE",
            "address": LATE
        }),
    );
    import_registry(&env.repo, env.registry.path()).await;

    let reader = MockChainReader::new()
        .with_vesting(addr(BUILDER), 100, 70)
        .with_vesting(addr(PRODUCT), 0, 0)
        .with_vesting(addr(LATE), 5, 0)
        .with_pool(addr(BUILDER), pool(BUILDER, 2))
        .with_pool(addr(PRODUCT), pool(PRODUCT, 2))
        .with_pool(addr(LATE), pool(LATE, 0));
    let result = heartbeat(&env.repo, reader, signer)
        .run(false)
        .await
        .unwrap();

    assert!(!result.changes.is_first);
    assert_eq!(
        result.changes.changes,
        vec![
            ChangeEvent::VestingClaimed {
                symbol: "BLD".to_string(),
                amount: Amount::from_raw(30).unwrap(),
            },
            ChangeEvent::NewEntity {
                symbol: "LATE".to_string(),
            },
            ChangeEvent::PoolStatusChange {
                symbol: "PRD".to_string(),
                from: "Initializing".to_string(),
                to: "Active".to_string(),
            },
        ]
    );
    assert!(result.changes.anomalies.is_empty());

    let builder = result.impact.builder("BLD").unwrap();
    assert_eq!(
        builder.product_correlations[0].correlation,
        Correlation::Healthy
    );

    let history = env.repo.history(10).await.unwrap();
    assert_eq!(history.summaries.len(), 2);
    assert_eq!(history.summaries[1].change_count, 3);
}

#[tokio::test]
async fn test_failures_stay_attached_to_their_entity() {
    let env = setup_env().await;
    let signer = Arc::new(MockSigner::new(addr(WALLET)));
    heartbeat(&env.repo, baseline_reader(), signer.clone())
        .run(false)
        .await
        .unwrap();

    // Builder vesting now unreadable, product released went backwards.
    let reader = MockChainReader::new()
        .with_vesting_error(addr(BUILDER), ChainError::Timeout("10000ms".to_string()))
        .with_vesting(addr(PRODUCT), 10, 0)
        .with_pool(addr(BUILDER), pool(BUILDER, 2))
        .with_pool_error(
            addr(PRODUCT),
            ChainError::Rpc {
                code: 3,
                message: "execution reverted".to_string(),
            },
        );
    let result = heartbeat(&env.repo, reader, signer).run(false).await.unwrap();

    let builder = result.snapshot.entity("BLD").unwrap();
    assert!(matches!(builder.vesting, VestingReading::Unavailable { .. }));
    assert!(builder.pool.is_active());
    assert_eq!(result.snapshot.summary.unavailable, 2);

    assert_eq!(
        result.changes.changes,
        vec![ChangeEvent::PoolStatusChange {
            symbol: "PRD".to_string(),
            from: "Initializing".to_string(),
            to: "unavailable".to_string(),
        }]
    );
    // Unavailable vesting is not a decrease; only a readable lower value is.
    assert!(result.changes.anomalies.is_empty());
}

#[tokio::test]
async fn test_released_decrease_is_anomaly() {
    let env = setup_env().await;
    let signer = Arc::new(MockSigner::new(addr(WALLET)));
    heartbeat(&env.repo, baseline_reader(), signer.clone())
        .run(false)
        .await
        .unwrap();

    let reader = MockChainReader::new()
        .with_vesting(addr(BUILDER), 100, 25)
        .with_vesting(addr(PRODUCT), 0, 0)
        .with_pool(addr(BUILDER), pool(BUILDER, 2))
        .with_pool(addr(PRODUCT), pool(PRODUCT, 1));
    let result = heartbeat(&env.repo, reader, signer).run(false).await.unwrap();

    assert!(result.changes.changes.is_empty());
    assert_eq!(result.changes.anomalies.len(), 1);
    match &result.changes.anomalies[0] {
        DiffAnomaly::ReleasedDecreased {
            symbol,
            previous,
            current,
        } => {
            assert_eq!(symbol, "BLD");
            assert_eq!(*previous, Amount::from_raw(40).unwrap());
            assert_eq!(*current, Amount::from_raw(25).unwrap());
        }
    }

    // The anomaly is also carried by the entity in the persisted snapshot.
    let builder = result.snapshot.entity("BLD").unwrap();
    assert_eq!(builder.anomalies, result.changes.anomalies);
    assert!(result.snapshot.entity("PRD").unwrap().anomalies.is_empty());
    let stored = env.repo.latest_snapshot().await.unwrap().unwrap();
    assert_eq!(stored.entity("BLD").unwrap().anomalies.len(), 1);
}

#[tokio::test]
async fn test_live_claims_are_independent() {
    let env = setup_env().await;
    let reader = MockChainReader::new()
        .with_vesting(addr(BUILDER), 100, 40)
        .with_vesting(addr(PRODUCT), 0, 0)
        .with_pool(addr(BUILDER), pool(BUILDER, 2))
        .with_pool(addr(PRODUCT), pool(PRODUCT, 2));
    let signer = Arc::new(MockSigner::new(addr(WALLET)).failing_for(
        derive_pool_id(&pool_key(BUILDER)),
        SignerFailure::Receipt(ChainError::Timeout("no receipt".to_string())),
    ));

    let result = heartbeat(&env.repo, reader, signer.clone())
        .run(true)
        .await
        .unwrap();

    assert_eq!(result.claims.mode, ClaimMode::Live);
    assert_eq!(result.claims.records.len(), 2);
    assert_eq!(result.claims.records[0].symbol, "BLD");
    assert!(matches!(
        &result.claims.records[0].outcome,
        ClaimOutcome::Error { tx_hash: Some(_), .. }
    ));
    assert_eq!(result.claims.records[1].symbol, "PRD");
    assert_eq!(result.claims.records[1].outcome.label(), "claimed");
    assert_eq!(signer.submissions().len(), 2);

    let history = env.repo.history(10).await.unwrap();
    assert_eq!(history.claim_batches.len(), 1);
    assert_eq!(history.claim_batches[0], result.claims);
}

#[tokio::test]
async fn test_ineligible_entities_never_claimed() {
    let env = setup_env().await;
    let reader = MockChainReader::new()
        .with_vesting(addr(BUILDER), 100, 40)
        .with_vesting(addr(PRODUCT), 0, 0)
        .with_pool(addr(BUILDER), pool(BUILDER, 4))
        .with_pool(addr(PRODUCT), pool(PRODUCT, 1));
    let signer = Arc::new(MockSigner::new(addr(WALLET)));

    let batch = heartbeat(&env.repo, reader, signer.clone())
        .claim_all()
        .await
        .unwrap();

    assert!(batch.records.is_empty());
    assert!(signer.submissions().is_empty());
    // Nothing attempted, nothing recorded.
    assert!(env.repo.history(10).await.unwrap().claim_batches.is_empty());
}
