//! Chain recovery against the in-memory ledger store.

#[cfg(test)]
mod tests {
    use crate::integration::fixtures::{create, transfer, Ledger};
    use fl_02_ledger_model::BlockStatus;
    use fl_03_validation::TransactionStore;
    use fl_04_consensus_rules::{select_rules, ConsensusRules, ConsensusStrategy, Keyring};
    use fl_05_chain_recovery::{
        ChainRecovery, ChainStore, GenesisOutcome, RecoveryConfig, RecoveryError,
    };
    use node_runtime::{InMemoryLedgerStore, StaticHeightOracle};
    use shared_crypto::Keypair;
    use std::sync::Arc;

    fn recovery_over(
        store: Arc<InMemoryLedgerStore>,
        node: &Keypair,
        oracle: Arc<StaticHeightOracle>,
        max_rollback: u64,
    ) -> ChainRecovery {
        let pipeline = Arc::new(fl_03_validation::ValidationPipeline::new(
            store.clone(),
            Default::default(),
        ));
        let rules: Arc<dyn ConsensusRules> = select_rules(
            ConsensusStrategy::Federation,
            Keyring::new([node.public_key()]),
            pipeline,
        );
        ChainRecovery::new(store, oracle, rules, node.clone(), RecoveryConfig { max_rollback })
    }

    #[tokio::test]
    async fn test_rollback_deletes_exactly_the_excess() {
        let ledger = Ledger::new().await;
        let alice = Keypair::generate();

        let minted = create(&alice);
        ledger.commit(vec![minted.clone()], BlockStatus::Valid).await.unwrap();
        for height in 2..=5 {
            let txs = if height == 4 {
                vec![transfer(
                    &minted,
                    &[0],
                    std::slice::from_ref(&alice),
                    vec![(vec![Keypair::generate().public_key()], 1)],
                )]
            } else {
                vec![create(&alice)]
            };
            ledger.commit(txs, BlockStatus::Valid).await.unwrap();
        }
        assert!(ledger.store.is_spent(&minted.output_ref(0)).await.unwrap());

        let oracle = Arc::new(StaticHeightOracle::new(2));
        let recovery = recovery_over(ledger.store.clone(), &ledger.node, oracle.clone(), 1000);

        let report = recovery.recover().await.unwrap();
        assert_eq!(report.blocks_rolled_back, 3);
        assert_eq!(report.final_height, Some(2));
        assert_eq!(report.genesis, GenesisOutcome::AlreadyExists);
        assert_eq!(ledger.store.block_count(), 3);
        assert!(!ledger.store.is_spent(&minted.output_ref(0)).await.unwrap());

        let again = recovery.recover().await.unwrap();
        assert_eq!(again.blocks_rolled_back, 0);
        assert_eq!(ledger.store.block_count(), 3);

        // Oracle ahead of the local chain is not a rollback.
        oracle.set_height(10);
        assert_eq!(recovery.reconcile_height().await, Ok(0));
    }

    #[tokio::test]
    async fn test_rollback_limit_enforced() {
        let ledger = Ledger::new().await;
        for _ in 0..4 {
            ledger.commit(vec![create(&ledger.node)], BlockStatus::Valid).await.unwrap();
        }
        let oracle = Arc::new(StaticHeightOracle::new(0));
        let recovery = recovery_over(ledger.store.clone(), &ledger.node, oracle, 2);

        assert!(matches!(
            recovery.recover().await,
            Err(RecoveryError::RollbackLimitExceeded { gap: 4, limit: 2, .. })
        ));
        assert_eq!(ledger.store.block_count(), 5);
    }

    #[tokio::test]
    async fn test_genesis_created_once() {
        let store = Arc::new(InMemoryLedgerStore::new());
        let node = Keypair::generate();
        let recovery = recovery_over(store.clone(), &node, Arc::new(StaticHeightOracle::new(0)), 10);

        let first = recovery.create_genesis_block().await.unwrap();
        assert!(matches!(first, GenesisOutcome::Created(_)));
        assert_eq!(
            recovery.create_genesis_block().await,
            Ok(GenesisOutcome::AlreadyExists)
        );
        assert_eq!(store.block_count(), 1);

        let latest = store.get_latest_block().await.unwrap().unwrap();
        assert_eq!(latest.height(), 0);
        assert!(latest.is_genesis());
    }

    #[tokio::test]
    async fn test_zombies_cleared_on_recovery() {
        let ledger = Ledger::new().await;
        let alice = Keypair::generate();
        let minted = create(&alice);
        ledger.commit(vec![minted.clone()], BlockStatus::Valid).await.unwrap();
        let spend = transfer(
            &minted,
            &[0],
            std::slice::from_ref(&alice),
            vec![(vec![alice.public_key()], 1)],
        );
        ledger.commit(vec![spend.clone()], BlockStatus::Invalid).await.unwrap();

        let recovery = recovery_over(
            ledger.store.clone(),
            &ledger.node,
            Arc::new(StaticHeightOracle::new(2)),
            10,
        );
        let report = recovery.recover().await.unwrap();
        assert_eq!(report.zombies_deleted, 1);
        assert_eq!(ledger.store.get_transaction(spend.id()).await, Ok(None));
        assert!(!ledger.store.is_spent(&minted.output_ref(0)).await.unwrap());
    }
}
