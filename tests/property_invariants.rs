//! Property-based tests for the six universal invariants from the
//! executor/log/certificate design: log chain integrity, signature
//! round-trip, canonicalization determinism, state monotonicity,
//! selector determinism, and at-most-one fallback.

use proptest::collection::vec as prop_vec;
use proptest::prelude::*;
use tempfile::tempdir;
use veriwipe::certificate::canonical::canonical_bytes;
use veriwipe::certificate::CertificateBuilder;
use veriwipe::crypto::Signer;
use veriwipe::drives::types::{DeviceFacts, EncryptionStatus, MediaClass, Transport, WipeStrategy};
use veriwipe::error::WipeErrorKind;
use veriwipe::executor::{Executor, FakeBlockDevice, FakeSanitizeCommands, WipeOperation, WipeState};
use veriwipe::log_chain::{HashChainLog, LogLevel};
use veriwipe::selector;

fn arb_media_class() -> impl Strategy<Value = MediaClass> {
    prop_oneof![
        Just(MediaClass::Hdd),
        Just(MediaClass::SsdSata),
        Just(MediaClass::SsdNvme),
        Just(MediaClass::Emmc),
        Just(MediaClass::Usb),
        Just(MediaClass::Unknown),
    ]
}

fn arb_encryption() -> impl Strategy<Value = EncryptionStatus> {
    prop_oneof![
        Just(EncryptionStatus::None),
        Just(EncryptionStatus::Luks),
        Just(EncryptionStatus::BitLocker),
        Just(EncryptionStatus::Unknown),
    ]
}

fn arb_facts() -> impl Strategy<Value = DeviceFacts> {
    (
        arb_media_class(),
        arb_encryption(),
        any::<bool>(),
        any::<bool>(),
        1_000_000u64..2_000_000_000_000u64,
    )
        .prop_map(
            |(media_class, encryption, secure_erase, hidden_area, capacity_bytes)| DeviceFacts {
                device_id: "/dev/prop0".to_string(),
                media_class,
                model: "prop".to_string(),
                serial: "prop-serial".to_string(),
                capacity_bytes,
                transport: Transport::Unknown,
                encryption,
                hidden_area_present: hidden_area,
                supports_secure_erase: secure_erase,
                raw_probe_blobs: Default::default(),
            },
        )
}

proptest! {
    /// Selector determinism: `select(facts) == select(facts)` for any facts,
    /// and is a pure function of its argument alone.
    #[test]
    fn selector_is_deterministic_for_any_facts(facts in arb_facts()) {
        let a = selector::select(&facts);
        let b = selector::select(&facts);
        prop_assert_eq!(a, b);
    }

    /// Log chain integrity: any sequence of appends forms a valid chain,
    /// and mutating any single field of any entry breaks it.
    #[test]
    fn log_chain_integrity_holds_and_breaks_under_tampering(
        messages in prop_vec("[a-z]{1,12}", 1..12),
        tamper_index in 0usize..12,
    ) {
        let dir = tempdir().unwrap();
        let mut log = HashChainLog::open(dir.path().join("log.json")).unwrap();
        for m in &messages {
            log.append(m.clone(), LogLevel::Info).unwrap();
        }
        prop_assert!(log.verify_chain());

        let index = tamper_index % messages.len();
        // Access the persisted form to tamper a field without relying on
        // the struct's own field visibility beyond what the crate exports.
        let mut entries = log.entries();
        entries[index].message = format!("{}-tampered", entries[index].message);
        let tampered_path = dir.path().join("tampered.json");
        std::fs::write(&tampered_path, serde_json::to_string(&entries).unwrap()).unwrap();
        let reloaded = HashChainLog::open(&tampered_path).unwrap();
        prop_assert!(!reloaded.verify_chain());
    }

    /// Canonicalization determinism: two canonicalizations of the same
    /// certificate JSON value produce byte-identical output.
    #[test]
    fn canonicalization_is_deterministic(
        model in "[a-zA-Z0-9 ]{1,20}",
        capacity in 1_000_000u64..2_000_000_000_000u64,
    ) {
        let dir = tempdir().unwrap();
        let signer = Signer::open_or_generate(dir.path().join("k"), dir.path().join("k.pub")).unwrap();
        let log = HashChainLog::open(dir.path().join("log.json")).unwrap();

        let facts = DeviceFacts {
            device_id: "/dev/prop0".to_string(),
            media_class: MediaClass::Hdd,
            model,
            serial: "prop-serial".to_string(),
            capacity_bytes: capacity,
            transport: Transport::Sata,
            encryption: EncryptionStatus::None,
            hidden_area_present: false,
            supports_secure_erase: true,
            raw_probe_blobs: Default::default(),
        };
        let mut op = WipeOperation::new(facts);
        op.started_at = Some(chrono::Utc::now());
        op.ended_at = op.started_at;
        op.state = WipeState::Completed;
        op.progress = 1.0;

        let cert = CertificateBuilder::new(&signer).build(&op, &log).unwrap();
        let value = serde_json::to_value(&cert).unwrap();

        let a = canonical_bytes(&value);
        let b = canonical_bytes(&value);
        prop_assert_eq!(a, b);
    }

    /// Signature round-trip: a certificate signed by K verifies against
    /// K's public key; altering a signed field invalidates the signature.
    #[test]
    fn signature_round_trip_and_tamper_detection(model in "[a-zA-Z0-9 ]{1,20}") {
        use veriwipe::certificate::verifier::{CertificateVerifier, TrustStore};
        use veriwipe::crypto::PublicVerifier;

        let dir = tempdir().unwrap();
        let signer = Signer::open_or_generate(dir.path().join("k"), dir.path().join("k.pub")).unwrap();
        let log = HashChainLog::open(dir.path().join("log.json")).unwrap();

        let facts = DeviceFacts {
            device_id: "/dev/prop0".to_string(),
            media_class: MediaClass::Hdd,
            model,
            serial: "prop-serial".to_string(),
            capacity_bytes: 10_000_000_000,
            transport: Transport::Sata,
            encryption: EncryptionStatus::None,
            hidden_area_present: false,
            supports_secure_erase: true,
            raw_probe_blobs: Default::default(),
        };
        let mut op = WipeOperation::new(facts);
        op.started_at = Some(chrono::Utc::now());
        op.ended_at = op.started_at;
        op.state = WipeState::Completed;
        op.progress = 1.0;

        let cert = CertificateBuilder::new(&signer).build(&op, &log).unwrap();

        let mut trust_store = TrustStore::new();
        trust_store.insert(PublicVerifier::from_public_key_der(signer.public_key_der().to_vec()));

        let bytes = serde_json::to_vec(&cert).unwrap();
        let result = CertificateVerifier::new(&trust_store).verify(&bytes);
        prop_assert!(result.signature_valid);

        let mut value: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        value["device_summary"]["model"] = serde_json::json!("tampered");
        let tampered_bytes = serde_json::to_vec(&value).unwrap();
        let tampered_result = CertificateVerifier::new(&trust_store).verify(&tampered_bytes);
        prop_assert!(!tampered_result.signature_valid);
    }

    /// State monotonicity and at-most-one fallback, driven end to end
    /// against a fake device with an injected first-attempt failure.
    #[test]
    fn progress_is_monotonic_and_fallback_happens_at_most_once(
        facts in arb_facts(),
        inject_failure in any::<bool>(),
    ) {
        tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap()
            .block_on(async {
                let strategy = selector::select(&facts);
                let operation = WipeOperation::new(facts);

                let commands = if inject_failure {
                    match strategy {
                        WipeStrategy::AtaSecureErase => FakeSanitizeCommands {
                            ata_result: Some(WipeErrorKind::Unsupported),
                            ..Default::default()
                        },
                        WipeStrategy::NvmeSecureErase => FakeSanitizeCommands {
                            nvme_secure_result: Some(WipeErrorKind::Unsupported),
                            ..Default::default()
                        },
                        _ => FakeSanitizeCommands::default(),
                    }
                } else {
                    FakeSanitizeCommands::default()
                };

                let dir = tempdir().unwrap();
                let mut log = HashChainLog::open(dir.path().join("log.json")).unwrap();
                let device = Box::new(FakeBlockDevice::new(operation.device_facts.capacity_bytes));
                let mut executor = Executor::new(device, std::sync::Arc::new(commands));

                let result = executor.execute(operation, &mut log).await;

                prop_assert!(result.progress >= 0.0 && result.progress <= 1.0);
                prop_assert!(result.state.is_terminal());
                // At most one strategy substitution per operation.
                let substitutions = log
                    .entries()
                    .iter()
                    .filter(|e| e.message.contains("substituting"))
                    .count();
                prop_assert!(substitutions <= 1);
                Ok(())
            })?;
    }
}
