use super::*;
use ed25519_dalek::{Signer, SigningKey};

fn signer(seed: u8) -> (SigningKey, String) {
    let key = SigningKey::from_bytes(&[seed; 32]);
    let address = strkey::encode_account_id(&key.verifying_key().to_bytes());
    (key, address)
}

fn sample_transaction(source: &str, destination: &str) -> Transaction {
    TransactionBuilder::new(source, 41, BASE_FEE)
        .add_operation(Operation::native_payment(
            destination,
            Amount::parse("5").expect("amount"),
        ))
        .set_timeout(30)
        .build_at(1_700_000_000)
        .expect("build")
}

fn sign(envelope: &mut TransactionEnvelope, key: &SigningKey, passphrase: &str) {
    let hash = envelope.tx.hash(passphrase).expect("hash");
    let signature = key.sign(&hash);
    envelope.add_signature(&key.verifying_key().to_bytes(), &signature.to_bytes());
}

#[test]
fn parses_decimal_amounts_into_stroops() {
    assert_eq!(Amount::parse("5").expect("whole").stroops(), 50_000_000);
    assert_eq!(Amount::parse("0.0000001").expect("min").stroops(), 1);
    assert_eq!(Amount::parse("100.25").expect("frac").stroops(), 1_002_500_000);
    assert_eq!(Amount::parse(" .5 ").expect("leading dot").stroops(), 5_000_000);
    assert_eq!(Amount::parse("5").expect("whole").to_string(), "5.0000000");
}

#[test]
fn rejects_malformed_amounts() {
    for input in ["", ".", "0", "0.0000000", "-1", "+1", "1e3", "1.00000001", "abc", "1.2.3"] {
        assert!(
            Amount::parse(input).is_err(),
            "expected '{input}' to be rejected"
        );
    }
    assert!(Amount::parse("99999999999999999999").is_err());
}

#[test]
fn builder_bumps_sequence_and_sets_validity_window() {
    let (_, source) = signer(1);
    let (_, destination) = signer(2);
    let tx = sample_transaction(&source, &destination);

    assert_eq!(tx.seq_num, 42);
    assert_eq!(tx.fee, BASE_FEE);
    assert_eq!(
        tx.time_bounds,
        Some(TimeBounds {
            min_time: 0,
            max_time: 1_700_000_030,
        })
    );
    assert_eq!(
        tx.operations,
        vec![Operation::Payment {
            destination,
            asset: Asset::Native,
            amount: 50_000_000,
        }]
    );
}

#[test]
fn builder_rejects_invalid_destination_and_missing_pieces() {
    let (_, source) = signer(1);

    let err = TransactionBuilder::new(&source, 1, BASE_FEE)
        .add_operation(Operation::native_payment(
            "GXYZ",
            Amount::parse("1").expect("amount"),
        ))
        .set_timeout(30)
        .build_at(0)
        .expect_err("invalid destination");
    assert!(matches!(err, TransactionError::InvalidAddress { .. }));

    let err = TransactionBuilder::new(&source, 1, BASE_FEE)
        .set_timeout(30)
        .build_at(0)
        .expect_err("no operations");
    assert!(matches!(err, TransactionError::NoOperations));

    let (_, destination) = signer(2);
    let err = TransactionBuilder::new(&source, 1, BASE_FEE)
        .add_operation(Operation::native_payment(
            destination,
            Amount::parse("1").expect("amount"),
        ))
        .build_at(0)
        .expect_err("no timeout");
    assert!(matches!(err, TransactionError::TimeoutNotSet));
}

#[test]
fn hash_depends_on_network() {
    let (_, source) = signer(1);
    let (_, destination) = signer(2);
    let tx = sample_transaction(&source, &destination);

    assert_ne!(
        tx.hash(TESTNET_PASSPHRASE).expect("testnet"),
        tx.hash(PUBLIC_PASSPHRASE).expect("public")
    );
    assert_eq!(tx.hash_hex(TESTNET_PASSPHRASE).expect("hex").len(), 64);
}

#[test]
fn signed_envelope_reconstructs_for_matching_network() {
    let (key, source) = signer(1);
    let (_, destination) = signer(2);
    let mut envelope = TransactionEnvelope::unsigned(sample_transaction(&source, &destination));
    sign(&mut envelope, &key, TESTNET_PASSPHRASE);

    let encoded = envelope.encode().expect("encode");
    let rebuilt = TransactionEnvelope::from_signed(&encoded, TESTNET_PASSPHRASE).expect("verify");
    assert_eq!(rebuilt, envelope);
}

#[test]
fn signed_envelope_fails_closed_on_network_mismatch() {
    let (key, source) = signer(1);
    let (_, destination) = signer(2);
    let mut envelope = TransactionEnvelope::unsigned(sample_transaction(&source, &destination));
    sign(&mut envelope, &key, PUBLIC_PASSPHRASE);

    let encoded = envelope.encode().expect("encode");
    let err = TransactionEnvelope::from_signed(&encoded, TESTNET_PASSPHRASE)
        .expect_err("network mismatch");
    assert!(matches!(err, TransactionError::SignatureMismatch));
}

#[test]
fn unsigned_or_foreign_signed_envelope_is_rejected() {
    let (_, source) = signer(1);
    let (other_key, destination) = signer(2);
    let mut envelope = TransactionEnvelope::unsigned(sample_transaction(&source, &destination));

    let unsigned = envelope.encode().expect("encode");
    assert!(matches!(
        TransactionEnvelope::from_signed(&unsigned, TESTNET_PASSPHRASE),
        Err(TransactionError::MissingSignature)
    ));

    sign(&mut envelope, &other_key, TESTNET_PASSPHRASE);
    let foreign = envelope.encode().expect("encode");
    assert!(matches!(
        TransactionEnvelope::from_signed(&foreign, TESTNET_PASSPHRASE),
        Err(TransactionError::MissingSignature)
    ));
}

#[test]
fn garbage_envelope_is_rejected() {
    assert!(matches!(
        TransactionEnvelope::from_signed("not base64!!", TESTNET_PASSPHRASE),
        Err(TransactionError::Envelope(_))
    ));
    let json_garbage = STANDARD.encode(b"{\"tx\": 1}");
    assert!(matches!(
        TransactionEnvelope::from_signed(&json_garbage, TESTNET_PASSPHRASE),
        Err(TransactionError::Envelope(_))
    ));
}

#[test]
fn envelope_encodes_as_stellar_xdr() {
    let (key, source) = signer(1);
    let (_, destination) = signer(2);
    let mut envelope = TransactionEnvelope::unsigned(sample_transaction(&source, &destination));
    sign(&mut envelope, &key, TESTNET_PASSPHRASE);

    let raw = STANDARD
        .decode(envelope.encode().expect("encode"))
        .expect("base64");
    // ENVELOPE_TYPE_TX discriminant
    assert_eq!(&raw[..4], &[0, 0, 0, 2]);

    let xdr::TransactionEnvelope::Tx(v1) =
        xdr::TransactionEnvelope::from_xdr(&raw, Limits::none()).expect("xdr")
    else {
        panic!("expected a v1 transaction envelope");
    };
    assert_eq!(v1.tx.fee, BASE_FEE);
    assert_eq!(v1.tx.seq_num.0, 42);
    assert_eq!(v1.signatures.len(), 1);
    assert_eq!(
        &v1.signatures[0].hint.0[..],
        &key.verifying_key().to_bytes()[28..]
    );
    match &v1.tx.operations[0].body {
        xdr::OperationBody::Payment(payment) => {
            assert_eq!(payment.amount, 50_000_000);
            assert!(matches!(payment.asset, xdr::Asset::Native));
        }
        other => panic!("unexpected operation {other:?}"),
    }
}

#[test]
fn testnet_network_id_matches_known_value() {
    assert_eq!(
        to_hex(&network_id(TESTNET_PASSPHRASE)),
        "cee0302d59844d32bdca915c8203dd44b33fbb7edc19051ea37abedf28ecd472"
    );
}

#[test]
fn hash_covers_xdr_signature_payload() {
    let (_, source) = signer(1);
    let (_, destination) = signer(2);
    let tx = sample_transaction(&source, &destination);

    let mut payload = network_id(TESTNET_PASSPHRASE).to_vec();
    payload.extend_from_slice(&[0, 0, 0, 2]);
    payload.extend(
        tx.to_xdr()
            .expect("xdr")
            .to_xdr(Limits::none())
            .expect("bytes"),
    );
    let expected: [u8; 32] = Sha256::digest(&payload).into();

    assert_eq!(tx.hash(TESTNET_PASSPHRASE).expect("hash"), expected);
}

#[test]
fn non_payment_envelopes_are_unsupported() {
    let (_, source) = signer(1);
    let (_, destination) = signer(2);
    let mut tx = sample_transaction(&source, &destination)
        .to_xdr()
        .expect("xdr");
    tx.operations = vec![xdr::Operation {
        source_account: None,
        body: xdr::OperationBody::Inflation,
    }]
    .try_into()
    .expect("operations");
    let envelope = xdr::TransactionEnvelope::Tx(xdr::TransactionV1Envelope {
        tx,
        signatures: Vec::new().try_into().expect("signatures"),
    });
    let encoded = STANDARD.encode(envelope.to_xdr(Limits::none()).expect("bytes"));

    assert!(matches!(
        TransactionEnvelope::decode(&encoded),
        Err(TransactionError::Unsupported(_))
    ));
}

#[test]
fn oversized_memo_is_rejected() {
    let (_, source) = signer(1);
    let (_, destination) = signer(2);
    let tx = TransactionBuilder::new(&source, 1, BASE_FEE)
        .add_operation(Operation::native_payment(
            destination,
            Amount::parse("1").expect("amount"),
        ))
        .add_memo(Memo::Text("x".repeat(29)))
        .set_timeout(30)
        .build_at(0)
        .expect("build");

    assert!(matches!(
        tx.hash(TESTNET_PASSPHRASE),
        Err(TransactionError::MemoTooLong)
    ));
}
