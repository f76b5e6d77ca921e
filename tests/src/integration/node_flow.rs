//! `NodeRuntime` end to end: a small federation sharing blocks and votes.

#[cfg(test)]
mod tests {
    use crate::integration::fixtures::{create, create_divisible, transfer};
    use async_trait::async_trait;
    use fl_02_ledger_model::{Block, BlockStatus, Output, Transaction};
    use fl_03_validation::{
        CommittedTransaction, SpendOutcome, StoreError, TransactionStore, ValidationError,
    };
    use fl_04_consensus_rules::Keyring;
    use fl_05_chain_recovery::{ChainStore, DropOutcome, GenesisOutcome, InitOutcome};
    use node_runtime::{
        InMemoryLedgerStore, LedgerStore, NodeConfig, NodeError, NodeRuntime, StaticHeightOracle,
    };
    use shared_crypto::Keypair;
    use shared_types::{BlockId, OutputRef, TxId};
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    // =========================================================================
    // FIXTURES
    // =========================================================================

    /// Store whose transaction lookups fail while `failures` is positive.
    #[derive(Default)]
    struct FlakyStore {
        inner: InMemoryLedgerStore,
        failures: AtomicU32,
    }

    impl FlakyStore {
        fn fail_next(&self, calls: u32) {
            self.failures.store(calls, Ordering::SeqCst);
        }
    }

    #[async_trait]
    impl TransactionStore for FlakyStore {
        async fn get_transaction(
            &self,
            id: &TxId,
        ) -> Result<Option<CommittedTransaction>, StoreError> {
            let armed = self
                .failures
                .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
                .is_ok();
            if armed {
                return Err(StoreError::Unavailable("replica lagging".into()));
            }
            self.inner.get_transaction(id).await
        }

        async fn get_output(&self, link: &OutputRef) -> Result<Option<Output>, StoreError> {
            self.inner.get_output(link).await
        }

        async fn spent_by(&self, link: &OutputRef) -> Result<Option<TxId>, StoreError> {
            self.inner.spent_by(link).await
        }

        async fn mark_spent(
            &self,
            link: &OutputRef,
            spender: &TxId,
        ) -> Result<SpendOutcome, StoreError> {
            self.inner.mark_spent(link, spender).await
        }

        async fn release_spent(&self, link: &OutputRef, spender: &TxId) -> Result<(), StoreError> {
            self.inner.release_spent(link, spender).await
        }
    }

    #[async_trait]
    impl ChainStore for FlakyStore {
        async fn init_database(&self) -> Result<InitOutcome, StoreError> {
            self.inner.init_database().await
        }

        async fn drop_database(&self) -> Result<DropOutcome, StoreError> {
            self.inner.drop_database().await
        }

        async fn get_latest_block(&self) -> Result<Option<Block>, StoreError> {
            self.inner.get_latest_block().await
        }

        async fn get_block(&self, id: &BlockId) -> Result<Option<Block>, StoreError> {
            self.inner.get_block(id).await
        }

        async fn delete_latest_block(&self) -> Result<Option<Block>, StoreError> {
            self.inner.delete_latest_block().await
        }

        async fn delete_zombie_transactions(&self) -> Result<usize, StoreError> {
            self.inner.delete_zombie_transactions().await
        }

        async fn insert_genesis_block(&self, block: &Block) -> Result<GenesisOutcome, StoreError> {
            self.inner.insert_genesis_block(block).await
        }
    }

    #[async_trait]
    impl LedgerStore for FlakyStore {
        async fn write_transaction(&self, tx: &Transaction) -> Result<(), StoreError> {
            self.inner.write_transaction(tx).await
        }

        async fn backlog(&self) -> Result<Vec<Transaction>, StoreError> {
            self.inner.backlog().await
        }

        async fn write_block(&self, block: &Block) -> Result<(), StoreError> {
            self.inner.write_block(block).await
        }

        async fn set_block_status(
            &self,
            id: &BlockId,
            status: BlockStatus,
        ) -> Result<(), StoreError> {
            self.inner.set_block_status(id, status).await
        }

        async fn block_status(&self, id: &BlockId) -> Result<Option<BlockStatus>, StoreError> {
            self.inner.block_status(id).await
        }
    }

    struct Member {
        keypair: Keypair,
        node: NodeRuntime<InMemoryLedgerStore>,
        oracle: Arc<StaticHeightOracle>,
    }

    /// Nodes sharing one keyring and the first member's genesis block.
    async fn federation(size: u8) -> Vec<Member> {
        let keypairs: Vec<Keypair> = (0..size).map(|i| Keypair::from_seed([i + 1; 32])).collect();
        let keyring: Keyring = keypairs.iter().map(Keypair::public_key).collect();

        let mut members: Vec<Member> = Vec::new();
        for keypair in keypairs {
            let store = Arc::new(InMemoryLedgerStore::new());
            if let Some(first) = members.first() {
                let genesis = first.node.store().get_latest_block().await.unwrap().unwrap();
                store.insert_genesis_block(&genesis).await.unwrap();
            }
            let oracle = Arc::new(StaticHeightOracle::new(0));
            let config = NodeConfig::federation_member(&keypair, keyring.clone());
            let node = NodeRuntime::new(config, store, oracle.clone()).unwrap();
            node.start().await.unwrap();
            members.push(Member {
                keypair,
                node,
                oracle,
            });
        }
        members
    }

    /// Every member stores `block`, votes on it and hears every vote.
    async fn settle(members: &[Member], proposer: usize, block: &Block) -> Vec<BlockStatus> {
        let mut votes = Vec::new();
        for (index, member) in members.iter().enumerate() {
            if index != proposer {
                member.node.receive_block(block).await.unwrap();
            }
            let (vote, _) = member.node.cast_vote(block).await.unwrap();
            votes.push((index, vote));
        }
        for member_index in 0..members.len() {
            for (voter, vote) in &votes {
                if *voter != member_index {
                    members[member_index].node.receive_vote(vote).await.unwrap();
                }
            }
        }
        let mut statuses = Vec::new();
        for member in members {
            statuses.push(member.node.block_status(block.id()).await.unwrap().unwrap());
        }
        statuses
    }

    // =========================================================================
    // FLOWS
    // =========================================================================

    #[tokio::test]
    async fn test_federation_settles_blocks() {
        let members = federation(3).await;
        let alice = Keypair::generate();
        let bob = Keypair::generate();

        let minted = create_divisible(&alice, &[100]);
        members[0].node.submit_transaction(&minted).await.unwrap();
        let b1 = members[0].node.propose_block().await.unwrap();

        let statuses = settle(&members, 0, &b1).await;
        assert_eq!(statuses, vec![BlockStatus::Valid; 3]);

        let pay = transfer(
            &minted,
            &[0],
            std::slice::from_ref(&alice),
            vec![(vec![bob.public_key()], 60), (vec![alice.public_key()], 40)],
        );
        members[1].node.submit_transaction(&pay).await.unwrap();
        let overpay = transfer(
            &minted,
            &[0],
            std::slice::from_ref(&alice),
            vec![(vec![bob.public_key()], 100)],
        );
        let err = members[1].node.submit_transaction(&overpay).await.unwrap_err();
        assert!(matches!(err, NodeError::Validation(ref e) if e.is_double_spend()));
        assert_eq!(members[0].keypair.public_key(), members[0].node.public_key());
    }

    #[tokio::test]
    async fn test_invalid_block_is_rejected_by_federation() {
        let members = federation(3).await;
        let alice = Keypair::generate();

        // Output never committed anywhere.
        let phantom = create(&alice);
        let spend = transfer(
            &phantom,
            &[0],
            std::slice::from_ref(&alice),
            vec![(vec![alice.public_key()], 1)],
        );
        let tip = members[2].node.store().get_latest_block().await.unwrap().unwrap();
        let forged = Block::new(
            1,
            Some(tip.id().clone()),
            vec![spend.clone()],
            members[2].keypair.public_key(),
            fl_02_ledger_model::now_millis(),
        )
        .and_then(|block| block.sign(&members[2].keypair))
        .unwrap();
        members[2].node.receive_block(&forged).await.unwrap();

        let statuses = settle(&members, 2, &forged).await;
        assert_eq!(statuses, vec![BlockStatus::Invalid; 3]);

        for member in &members {
            member.oracle.set_height(1);
            let report = member.node.recover().await.unwrap();
            assert_eq!(report.zombies_deleted, 1);
            assert_eq!(
                member.node.store().get_transaction(spend.id()).await,
                Ok(None)
            );
        }
    }

    #[tokio::test]
    async fn test_decided_spend_overrides_local_claim() {
        let members = federation(3).await;
        let alice = Keypair::generate();
        let bob = Keypair::generate();
        let carol = Keypair::generate();

        let minted = create(&alice);
        members[0].node.submit_transaction(&minted).await.unwrap();
        let b1 = members[0].node.propose_block().await.unwrap();
        assert_eq!(settle(&members, 0, &b1).await, vec![BlockStatus::Valid; 3]);

        let to_bob = transfer(
            &minted,
            &[0],
            std::slice::from_ref(&alice),
            vec![(vec![bob.public_key()], 1)],
        );
        let to_carol = transfer(
            &minted,
            &[0],
            std::slice::from_ref(&alice),
            vec![(vec![carol.public_key()], 1)],
        );
        members[0].node.submit_transaction(&to_bob).await.unwrap();
        members[1].node.submit_transaction(&to_carol).await.unwrap();

        // member 0 dissents because of its own claim but is outvoted
        let b2 = members[1].node.propose_block().await.unwrap();
        assert_eq!(settle(&members, 1, &b2).await, vec![BlockStatus::Valid; 3]);

        let link = minted.output_ref(0);
        assert_eq!(
            members[0].node.store().spent_by(&link).await,
            Ok(Some(to_carol.id().clone()))
        );
        assert!(matches!(
            members[0].node.propose_block().await,
            Err(NodeError::EmptyBacklog)
        ));

        let b3 = Block::new(
            3,
            Some(b2.id().clone()),
            vec![to_bob.clone()],
            members[0].keypair.public_key(),
            fl_02_ledger_model::now_millis(),
        )
        .and_then(|block| block.sign(&members[0].keypair))
        .unwrap();
        for member in &members {
            let verdict = member.node.evaluate_block(&b3).await.unwrap();
            assert!(!verdict.is_valid());
        }
        let err = members[0].node.submit_transaction(&to_bob).await.unwrap_err();
        assert!(matches!(err, NodeError::Validation(ref e) if e.is_double_spend()));
    }

    #[tokio::test]
    async fn test_transient_store_failures_retried() {
        let keypair = Keypair::generate();
        let mut config = NodeConfig::single_node(&keypair);
        config.validation.retry_backoff = Duration::from_millis(5);
        config.validation.max_transient_retries = 2;

        let store = Arc::new(FlakyStore::default());
        let node = NodeRuntime::new(config, store.clone(), Arc::new(StaticHeightOracle::new(0)))
            .unwrap();
        node.start().await.unwrap();

        store.fail_next(2);
        let tx = create(&keypair);
        node.submit_transaction(&tx).await.unwrap();
        assert_eq!(store.backlog().await.unwrap(), vec![tx]);

        store.fail_next(3);
        let err = node.submit_transaction(&create(&keypair)).await.unwrap_err();
        assert!(matches!(
            err,
            NodeError::Validation(ValidationError::Store(StoreError::Unavailable(_)))
        ));
        assert_eq!(store.backlog().await.unwrap().len(), 1);
    }
}
