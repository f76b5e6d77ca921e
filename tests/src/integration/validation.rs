//! Validation pipeline over the in-memory ledger store.

#[cfg(test)]
mod tests {
    use crate::integration::fixtures::{create, create_divisible, transfer, Ledger};
    use fl_02_ledger_model::BlockStatus;
    use fl_03_validation::{FaultClass, TransactionStore, TransactionValidator, ValidationError};
    use shared_crypto::Keypair;

    // =========================================================================
    // AMOUNT CONSERVATION
    // =========================================================================

    #[tokio::test]
    async fn test_transfer_must_conserve_amount() {
        let ledger = Ledger::new().await;
        let alice = Keypair::generate();
        let bob = Keypair::generate();

        let minted = create_divisible(&alice, &[70, 30]);
        ledger.pipeline.validate(&minted).await.unwrap();
        ledger.commit(vec![minted.clone()], BlockStatus::Valid).await.unwrap();

        for total in [99, 101] {
            let unbalanced = transfer(
                &minted,
                &[0, 1],
                std::slice::from_ref(&alice),
                vec![(vec![bob.public_key()], total - 50), (vec![alice.public_key()], 50)],
            );
            let err = ledger.pipeline.validate(&unbalanced).await.unwrap_err();
            assert!(
                matches!(err, ValidationError::AmountMismatch { inputs: 100, outputs } if outputs == total)
            );
            assert_eq!(err.class(), FaultClass::Consistency);
            assert!(!ledger.store.is_spent(&minted.output_ref(0)).await.unwrap());
        }

        let balanced = transfer(
            &minted,
            &[0, 1],
            std::slice::from_ref(&alice),
            vec![(vec![bob.public_key()], 50), (vec![alice.public_key()], 50)],
        );
        let verdict = ledger.pipeline.validate(&balanced).await.unwrap();
        assert_eq!(verdict.spent.len(), 2);
        assert_eq!(
            ledger.store.spent_by(&minted.output_ref(1)).await.unwrap(),
            Some(balanced.id().clone())
        );
    }

    #[tokio::test]
    async fn test_outputs_of_undecided_blocks_not_spendable() {
        let ledger = Ledger::new().await;
        let alice = Keypair::generate();
        let minted = create(&alice);
        ledger.commit(vec![minted.clone()], BlockStatus::Undecided).await.unwrap();

        let spend = transfer(
            &minted,
            &[0],
            std::slice::from_ref(&alice),
            vec![(vec![Keypair::generate().public_key()], 1)],
        );
        assert!(matches!(
            ledger.pipeline.validate(&spend).await,
            Err(ValidationError::InputNotInValidBlock(_))
        ));
    }

    // =========================================================================
    // DOUBLE-SPEND
    // =========================================================================

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_double_spend_exactly_one_wins() {
        let ledger = Ledger::new().await;
        let alice = Keypair::generate();

        for _ in 0..25 {
            let minted = create(&alice);
            ledger.commit(vec![minted.clone()], BlockStatus::Valid).await.unwrap();

            let handles: Vec<_> = (0..2)
                .map(|_| {
                    let spend = transfer(
                        &minted,
                        &[0],
                        std::slice::from_ref(&alice),
                        vec![(vec![Keypair::generate().public_key()], 1)],
                    );
                    let pipeline = ledger.pipeline.clone();
                    tokio::spawn(async move {
                        let outcome = pipeline.validate(&spend).await;
                        (spend.id().clone(), outcome)
                    })
                })
                .collect();

            let mut winners = Vec::new();
            for handle in handles {
                match handle.await.unwrap() {
                    (id, Ok(_)) => winners.push(id),
                    (_, Err(err)) => assert!(err.is_double_spend(), "unexpected {err}"),
                }
            }
            assert_eq!(winners.len(), 1);
            assert_eq!(
                ledger.store.spent_by(&minted.output_ref(0)).await.unwrap(),
                winners.pop()
            );
        }
    }

    #[tokio::test]
    async fn test_committed_spend_blocks_later_spend() {
        let ledger = Ledger::new().await;
        let alice = Keypair::generate();
        let minted = create(&alice);
        ledger.commit(vec![minted.clone()], BlockStatus::Valid).await.unwrap();

        let first = transfer(
            &minted,
            &[0],
            std::slice::from_ref(&alice),
            vec![(vec![Keypair::generate().public_key()], 1)],
        );
        ledger.pipeline.validate(&first).await.unwrap();
        // Re-checking its own claim is not a double-spend.
        assert!(ledger.pipeline.dry_run(&first).await.is_ok());
        ledger.commit(vec![first.clone()], BlockStatus::Valid).await.unwrap();

        let second = transfer(
            &minted,
            &[0],
            std::slice::from_ref(&alice),
            vec![(vec![alice.public_key()], 1)],
        );
        match ledger.pipeline.validate(&second).await {
            Err(ValidationError::DoubleSpend { spent_by, .. }) => assert_eq!(&spent_by, first.id()),
            other => panic!("expected double-spend, got {other:?}"),
        }
        assert!(matches!(
            ledger.pipeline.dry_run(&first).await,
            Err(ValidationError::DuplicateTransaction(_))
        ));
    }
}
