use super::Certificate;
use crate::crypto::PublicVerifier;
use std::collections::HashMap;

/// Fingerprint-keyed trust store; the verifier looks up the certificate's
/// claimed signer fingerprint and validates against that key only.
#[derive(Default)]
pub struct TrustStore {
    keys: HashMap<String, PublicVerifier>,
}

impl TrustStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, verifier: PublicVerifier) {
        self.keys.insert(verifier.fingerprint().to_string(), verifier);
    }

    pub fn get(&self, fingerprint: &str) -> Option<&PublicVerifier> {
        self.keys.get(fingerprint)
    }
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct VerifyResult {
    pub structure_valid: bool,
    pub signature_valid: bool,
    pub errors: Vec<String>,
    /// Redacted projection safe to display: present only when parsing
    /// succeeded, regardless of structure/signature outcome.
    pub certificate: Option<Certificate>,
}

impl VerifyResult {
    pub fn is_valid(&self) -> bool {
        self.structure_valid && self.signature_valid
    }
}

pub struct CertificateVerifier<'a> {
    trust_store: &'a TrustStore,
}

impl<'a> CertificateVerifier<'a> {
    pub fn new(trust_store: &'a TrustStore) -> Self {
        Self { trust_store }
    }

    /// Parse, structurally validate, and cryptographically verify
    /// certificate bytes. Never performs network calls.
    pub fn verify(&self, bytes: &[u8]) -> VerifyResult {
        let text = match std::str::from_utf8(bytes) {
            Ok(t) => t,
            Err(_) => {
                return VerifyResult {
                    structure_valid: false,
                    signature_valid: false,
                    errors: vec!["certificate is not valid UTF-8".to_string()],
                    certificate: None,
                }
            }
        };

        let raw_value: serde_json::Value = match serde_json::from_str(text) {
            Ok(v) => v,
            Err(e) => {
                return VerifyResult {
                    structure_valid: false,
                    signature_valid: false,
                    errors: vec![format!("malformed JSON: {e}")],
                    certificate: None,
                }
            }
        };

        let mut errors = Vec::new();
        let structure_valid = self.check_structure(&raw_value, &mut errors);

        let certificate: Option<Certificate> = serde_json::from_value(raw_value.clone()).ok();

        let signature_valid = match (&certificate, self.signer_fingerprint(&raw_value)) {
            (Some(cert), Some(fingerprint)) => self
                .trust_store
                .get(&fingerprint)
                .map(|key| {
                    let signable = super::canonical::canonical_bytes(&raw_value);
                    key.verify(&signable, &cert.signature)
                })
                .unwrap_or_else(|| {
                    errors.push(format!("no trusted key for fingerprint {fingerprint}"));
                    false
                }),
            _ => {
                errors.push("certificate missing signer fingerprint or signature".to_string());
                false
            }
        };

        VerifyResult {
            structure_valid,
            signature_valid,
            errors,
            certificate,
        }
    }

    fn signer_fingerprint(&self, value: &serde_json::Value) -> Option<String> {
        value
            .get("tool_info")?
            .get("signer_fingerprint")?
            .as_str()
            .map(|s| s.to_string())
    }

    fn check_structure(&self, value: &serde_json::Value, errors: &mut Vec<String>) -> bool {
        let Some(obj) = value.as_object() else {
            errors.push("certificate root is not a JSON object".to_string());
            return false;
        };

        let required = [
            "certificate_id",
            "issued_at",
            "device_summary",
            "operation_summary",
            "verification_summary",
            "log_projection",
            "tool_info",
            "compliance",
            "signature",
        ];
        let mut ok = true;
        for field in required {
            if !obj.contains_key(field) {
                errors.push(format!("missing required field: {field}"));
                ok = false;
            }
        }
        if !ok {
            return false;
        }

        if let Some(issued_at) = obj.get("issued_at").and_then(|v| v.as_str()) {
            if chrono::DateTime::parse_from_rfc3339(issued_at).is_err() {
                errors.push("issued_at is not a valid ISO-8601/RFC3339 timestamp".to_string());
                ok = false;
            }
        }

        if let Some(state) = obj
            .get("operation_summary")
            .and_then(|v| v.get("state"))
            .and_then(|v| v.as_str())
        {
            if state != "completed" && state != "failed" {
                errors.push(format!(
                    "operation_summary.state must be completed or failed, got {state}"
                ));
                ok = false;
            }
        } else {
            errors.push("operation_summary.state missing".to_string());
            ok = false;
        }

        if obj
            .get("device_summary")
            .and_then(|v| v.get("media_class"))
            .is_none()
        {
            errors.push("device_summary.media_class missing".to_string());
            ok = false;
        }

        ok
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::certificate::builder::CertificateBuilder;
    use crate::crypto::Signer;
    use crate::drives::types::{DeviceFacts, EncryptionStatus, MediaClass, Transport};
    use crate::executor::{WipeOperation, WipeState};
    use crate::log_chain::HashChainLog;
    use tempfile::tempdir;

    fn sample_operation() -> WipeOperation {
        let facts = DeviceFacts {
            device_id: "/dev/sda".to_string(),
            media_class: MediaClass::Hdd,
            model: "Sample Model".to_string(),
            serial: "SN123".to_string(),
            capacity_bytes: 1_000_000_000_000,
            transport: Transport::Sata,
            encryption: EncryptionStatus::None,
            hidden_area_present: false,
            supports_secure_erase: true,
            raw_probe_blobs: Default::default(),
        };
        let mut op = WipeOperation::new(facts);
        op.started_at = Some(chrono::Utc::now());
        op.ended_at = Some(chrono::Utc::now());
        op.state = WipeState::Completed;
        op.progress = 1.0;
        op
    }

    #[test]
    fn valid_certificate_round_trips() {
        let dir = tempdir().unwrap();
        let signer =
            Signer::open_or_generate(dir.path().join("k"), dir.path().join("k.pub")).unwrap();
        let log = HashChainLog::open(dir.path().join("log.json")).unwrap();
        let cert = CertificateBuilder::new(&signer)
            .build(&sample_operation(), &log)
            .unwrap();

        let mut trust_store = TrustStore::new();
        trust_store.insert(PublicVerifier::from_public_key_der(
            signer.public_key_der().to_vec(),
        ));

        let bytes = serde_json::to_vec(&cert).unwrap();
        let result = CertificateVerifier::new(&trust_store).verify(&bytes);
        assert!(result.structure_valid);
        assert!(result.signature_valid);
        assert!(result.is_valid());
    }

    #[test]
    fn tampering_invalidates_signature_but_not_structure() {
        let dir = tempdir().unwrap();
        let signer =
            Signer::open_or_generate(dir.path().join("k"), dir.path().join("k.pub")).unwrap();
        let log = HashChainLog::open(dir.path().join("log.json")).unwrap();
        let cert = CertificateBuilder::new(&signer)
            .build(&sample_operation(), &log)
            .unwrap();

        let mut trust_store = TrustStore::new();
        trust_store.insert(PublicVerifier::from_public_key_der(
            signer.public_key_der().to_vec(),
        ));

        let mut value = serde_json::to_value(&cert).unwrap();
        value["device_summary"]["model"] = serde_json::json!("tampered model");
        let bytes = serde_json::to_vec(&value).unwrap();

        let result = CertificateVerifier::new(&trust_store).verify(&bytes);
        assert!(result.structure_valid);
        assert!(!result.signature_valid);
    }

    #[test]
    fn malformed_json_is_rejected() {
        let trust_store = TrustStore::new();
        let result = CertificateVerifier::new(&trust_store).verify(b"not json");
        assert!(!result.structure_valid);
        assert!(!result.signature_valid);
    }
}
