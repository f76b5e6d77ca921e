//! Transaction model properties that span conditions, encoding and
//! validation.

#[cfg(test)]
mod tests {
    use crate::integration::fixtures::{create, transfer, Ledger};
    use fl_02_ledger_model::{Asset, BlockStatus, Operation, Transaction};
    use fl_03_validation::{TransactionValidator, ValidationError};
    use shared_crypto::Keypair;

    // =========================================================================
    // ROUND-TRIP
    // =========================================================================

    #[test]
    fn test_serialization_round_trip() {
        let alice = Keypair::generate();
        let bob = Keypair::generate();
        let minted = Transaction::create(
            &[alice.public_key()],
            vec![(vec![alice.public_key()], 60), (vec![alice.public_key()], 40)],
            Some(Asset::new(Some(serde_json::json!({ "unit": "token" })), true).unwrap()),
        )
        .and_then(|tx| tx.with_metadata(Some(serde_json::json!({ "note": "opening" }))))
        .and_then(|tx| tx.sign(std::slice::from_ref(&alice)))
        .unwrap();
        let spent = transfer(
            &minted,
            &[0, 1],
            std::slice::from_ref(&alice),
            vec![(vec![bob.public_key()], 100)],
        );

        for tx in [&minted, &spent] {
            let decoded = Transaction::from_json(&tx.to_json().unwrap()).unwrap();
            assert_eq!(&decoded, tx);
            assert_eq!(decoded.recompute_id().unwrap(), *tx.id());

            let from_dict = Transaction::from_dict(tx.to_dict().unwrap()).unwrap();
            assert_eq!(&from_dict, tx);
        }
    }

    #[test]
    fn test_wire_form_shape() {
        let alice = Keypair::generate();
        let dict = create(&alice).to_dict().unwrap();
        assert_eq!(dict["operation"], "CREATE");
        assert_eq!(dict["version"], "1.0");
        assert_eq!(dict["inputs"][0]["fulfills"], serde_json::Value::Null);
        assert_eq!(dict["outputs"][0]["amount"], 1);
    }

    // =========================================================================
    // MULTI-OWNER CREATE
    // =========================================================================

    #[tokio::test]
    async fn test_multi_owner_create_needs_every_owner() {
        let ledger = Ledger::new().await;
        let issuer = Keypair::generate();
        let user_a = Keypair::generate();
        let user_b = Keypair::generate();
        let carol = Keypair::generate();

        let minted = Transaction::create(
            &[issuer.public_key()],
            vec![(vec![user_a.public_key(), user_b.public_key()], 100)],
            Some(Asset::new(None, true).unwrap()),
        )
        .unwrap()
        .sign(std::slice::from_ref(&issuer))
        .unwrap();
        assert_eq!(minted.operation(), Operation::Create);
        assert_eq!(minted.outputs().len(), 1);
        assert_eq!(minted.outputs()[0].amount, 100);
        assert_eq!(minted.outputs()[0].condition.subcondition_count(), 2);

        ledger.pipeline.validate(&minted).await.unwrap();
        ledger.commit(vec![minted.clone()], BlockStatus::Valid).await.unwrap();

        let half_signed = transfer(
            &minted,
            &[0],
            std::slice::from_ref(&user_a),
            vec![(vec![carol.public_key()], 100)],
        );
        assert!(matches!(
            ledger.pipeline.validate(&half_signed).await,
            Err(ValidationError::InvalidSignature { index: 0 })
        ));

        let co_signed = half_signed.sign(std::slice::from_ref(&user_b)).unwrap();
        assert_ne!(co_signed.id(), half_signed.id());
        let verdict = ledger.pipeline.validate(&co_signed).await.unwrap();
        assert_eq!(verdict.spent, vec![minted.output_ref(0)]);
    }
}
