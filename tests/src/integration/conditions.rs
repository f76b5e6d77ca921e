//! Crypto-condition soundness as seen by the ledger: conditions built from
//! transaction owners and verified over transaction signing messages.

#[cfg(test)]
mod tests {
    use fl_01_crypto_conditions::{
        fulfill, make_condition, verify, ConditionApi, ConditionService, Fulfillment,
        ThresholdPolicy, VerificationItem,
    };
    use shared_crypto::Keypair;

    // =========================================================================
    // SIGNATURE SOUNDNESS
    // =========================================================================

    #[test]
    fn test_fulfillment_verifies_only_its_message() {
        let alice = Keypair::generate();
        let bob = Keypair::generate();
        let message = b"transfer 10 to carol";

        for keys in [vec![alice.clone()], vec![alice.clone(), bob.clone()]] {
            let owners: Vec<_> = keys.iter().map(Keypair::public_key).collect();
            let condition = make_condition(&owners, None).unwrap();
            let fulfillment = fulfill(&condition, message, &keys).unwrap();

            assert!(verify(&fulfillment, &condition, message));
            assert!(!verify(&fulfillment, &condition, b"transfer 11 to carol"));
        }
    }

    #[test]
    fn test_fulfillment_bound_to_condition() {
        let alice = Keypair::generate();
        let mallory = Keypair::generate();
        let message = b"payload";

        let condition = make_condition(&[alice.public_key()], None).unwrap();
        let forged = fulfill(
            &make_condition(&[mallory.public_key()], None).unwrap(),
            message,
            &[mallory],
        )
        .unwrap();
        assert!(!verify(&forged, &condition, message));
    }

    // =========================================================================
    // THRESHOLDS
    // =========================================================================

    #[test]
    fn test_two_of_two_needs_both() {
        let alice = Keypair::generate();
        let bob = Keypair::generate();
        let message = b"joint spend";
        let condition = make_condition(&[alice.public_key(), bob.public_key()], None).unwrap();
        assert_eq!(condition.subcondition_count(), 2);

        let partial = fulfill(&condition, message, std::slice::from_ref(&alice)).unwrap();
        assert!(!partial.is_fully_signed());
        assert!(!verify(&partial, &condition, message));

        let complete = partial.co_sign(message, std::slice::from_ref(&bob)).unwrap();
        assert!(complete.is_fully_signed());
        assert!(verify(&complete, &condition, message));
    }

    #[test]
    fn test_weighted_one_of_two() {
        let alice = Keypair::generate();
        let bob = Keypair::generate();
        let message = b"either owner";
        let policy = ThresholdPolicy {
            threshold: 1,
            weights: vec![1, 1],
        };
        let condition =
            make_condition(&[alice.public_key(), bob.public_key()], Some(&policy)).unwrap();

        let by_bob = fulfill(&condition, message, &[bob]).unwrap();
        assert!(verify(&by_bob, &condition, message));
        assert!(!verify(&Fulfillment::from_condition(&condition), &condition, message));
    }

    #[test]
    fn test_batch_reports_failing_items() {
        let service = ConditionService::new();
        let alice = Keypair::generate();
        let condition = service.make_condition(&[alice.public_key()], None).unwrap();
        let good = service.fulfill(&condition, b"one", &[alice]).unwrap();

        let items = vec![
            VerificationItem {
                fulfillment: good.clone(),
                condition: condition.clone(),
                message: b"one".to_vec(),
            },
            VerificationItem {
                fulfillment: good,
                condition,
                message: b"two".to_vec(),
            },
        ];
        let result = service.verify_batch(&items);
        assert!(!result.all_valid);
        assert_eq!(result.failed_indices(), vec![1]);
    }
}
