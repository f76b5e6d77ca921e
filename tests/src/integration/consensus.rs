//! Consensus rules over a real pipeline: block checks and vote handling.

#[cfg(test)]
mod tests {
    use crate::integration::fixtures::{create, transfer, Ledger};
    use fl_02_ledger_model::{now_millis, Block, BlockStatus};
    use fl_04_consensus_rules::{
        select_rules, BlockVerdict, ConsensusError, ConsensusRules, ConsensusStrategy, Keyring,
        VoteFault,
    };
    use shared_crypto::Keypair;
    use std::sync::Arc;

    fn rules_for(
        ledger: &Ledger,
        strategy: ConsensusStrategy,
        members: &[&Keypair],
    ) -> Arc<dyn ConsensusRules> {
        let keyring: Keyring = members.iter().map(|k| k.public_key()).collect();
        select_rules(strategy, keyring, ledger.pipeline.clone())
    }

    fn propose(node: &Keypair, tip: &Block, txs: Vec<fl_02_ledger_model::Transaction>) -> Block {
        Block::new(tip.height() + 1, Some(tip.id().clone()), txs, node.public_key(), now_millis())
            .and_then(|block| block.sign(node))
            .unwrap()
    }

    // =========================================================================
    // BLOCK VALIDATION
    // =========================================================================

    #[tokio::test]
    async fn test_block_with_conflicting_spends_rejected() {
        let ledger = Ledger::new().await;
        let peer = Keypair::generate();
        let rules = rules_for(&ledger, ConsensusStrategy::Federation, &[&ledger.node, &peer]);
        let alice = Keypair::generate();

        let minted = create(&alice);
        let tip = ledger.commit(vec![minted.clone()], BlockStatus::Valid).await.unwrap();

        let spend_a = transfer(&minted, &[0], std::slice::from_ref(&alice), vec![(vec![peer.public_key()], 1)]);
        let spend_b = transfer(&minted, &[0], std::slice::from_ref(&alice), vec![(vec![alice.public_key()], 1)]);

        let honest = propose(&ledger.node, &tip, vec![spend_a.clone()]);
        let validated = rules.validate_block(&honest).await.unwrap();
        assert_eq!(validated.transactions.len(), 1);

        let greedy = propose(&ledger.node, &tip, vec![spend_a, spend_b]);
        assert!(matches!(
            rules.validate_block(&greedy).await,
            Err(ConsensusError::DuplicateSpendInBlock(_))
        ));

        let outsider = Keypair::generate();
        let foreign = propose(&outsider, &tip, vec![]);
        assert!(matches!(
            rules.validate_block(&foreign).await,
            Err(ConsensusError::UnidentifiableSigner(_))
        ));
    }

    #[tokio::test]
    async fn test_genesis_block_round_trip() {
        let ledger = Ledger::new().await;
        let rules = rules_for(&ledger, ConsensusStrategy::Unanimous, &[&ledger.node]);
        let genesis = rules.create_genesis_block(&ledger.node).unwrap();
        assert!(genesis.is_genesis());
        assert!(rules.validate_block(&genesis).await.is_ok());
    }

    // =========================================================================
    // VOTE INTEGRITY
    // =========================================================================

    #[tokio::test]
    async fn test_duplicate_and_tampered_votes_rejected() {
        let ledger = Ledger::new().await;
        let peer = Keypair::generate();
        let rules = rules_for(&ledger, ConsensusStrategy::Federation, &[&ledger.node, &peer]);
        let block = ledger.commit(vec![create(&peer)], BlockStatus::Undecided).await.unwrap();

        let vote = rules
            .sign_vote(block.id(), block.previous_block(), &BlockVerdict::Valid, &peer)
            .unwrap();
        let mut tampered = vote.clone();
        tampered.vote.is_block_valid = false;

        assert_eq!(
            rules.check_vote(&tampered),
            Err(VoteFault::ImproperVote {
                voter: peer.public_key()
            })
        );
        assert!(rules.verify_vote(&vote));
        assert!(matches!(
            rules.check_vote(&vote),
            Err(VoteFault::MultipleVotes { .. })
        ));
    }

    #[tokio::test]
    async fn test_elections_follow_strategy() {
        let ledger = Ledger::new().await;
        let b = Keypair::generate();
        let c = Keypair::generate();
        let members = [&ledger.node, &b, &c];

        let federation = rules_for(&ledger, ConsensusStrategy::Federation, &members);
        let mut election = federation.new_election();
        assert_eq!(election.record(b.public_key(), false), BlockStatus::Undecided);
        assert_eq!(election.record(c.public_key(), false), BlockStatus::Invalid);
        assert_eq!(election.record(ledger.node.public_key(), true), BlockStatus::Invalid);

        let unanimous = rules_for(&ledger, ConsensusStrategy::Unanimous, &members);
        let mut election = unanimous.new_election();
        assert_eq!(election.record(b.public_key(), true), BlockStatus::Undecided);
        assert_eq!(election.record(c.public_key(), true), BlockStatus::Undecided);
        assert_eq!(election.record(ledger.node.public_key(), true), BlockStatus::Valid);
    }
}
