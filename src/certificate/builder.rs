use super::{
    Certificate, ComplianceInfo, DeviceSummary, OperationSummary, ToolInfo, VerificationSummary,
};
use crate::crypto::Signer;
use crate::executor::WipeOperation;
use crate::log_chain::{to_hex, HashChainLog};
use sha2::{Digest, Sha256};
use uuid::Uuid;

pub struct CertificateBuilder<'a> {
    signer: &'a Signer,
}

fn hash16(value: &str) -> String {
    to_hex(&Sha256::digest(value.as_bytes()))[..16].to_string()
}

impl<'a> CertificateBuilder<'a> {
    pub fn new(signer: &'a Signer) -> Self {
        Self { signer }
    }

    /// Assemble, canonicalize, and sign a certificate for `operation`.
    /// The log projection is copied verbatim from `log`.
    pub fn build(&self, operation: &WipeOperation, log: &HashChainLog) -> anyhow::Result<Certificate> {
        let facts = &operation.device_facts;

        let device_summary = DeviceSummary {
            model: facts.model.clone(),
            media_class: facts.media_class,
            capacity_bytes: facts.capacity_bytes,
            transport: facts.transport,
            encryption: facts.encryption,
            hidden_area_present: facts.hidden_area_present,
            supports_secure_erase: facts.supports_secure_erase,
            device_path_hash: hash16(&facts.device_id),
            serial_hash: hash16(&facts.serial),
        };

        let duration_seconds = match (operation.started_at, operation.ended_at) {
            (Some(start), Some(end)) => Some((end - start).num_milliseconds() as f64 / 1000.0),
            _ => None,
        };

        let operation_summary = OperationSummary {
            strategy: operation.strategy,
            state: operation.state,
            started_at: operation.started_at,
            ended_at: operation.ended_at,
            duration_seconds,
            fallback_used: operation.fallback_used,
            error: operation.error.clone(),
        };

        let verification_summary = VerificationSummary {
            pre_sample_hash: operation
                .verification_samples
                .as_ref()
                .map(|s| s.pre_sample_hash.clone()),
            post_sample_hash: operation
                .verification_samples
                .as_ref()
                .filter(|s| !s.post_sample_hash.is_empty())
                .map(|s| s.post_sample_hash.clone()),
            sampled_sector_checks: operation
                .verification_samples
                .as_ref()
                .map(|s| s.sampled_sector_checks)
                .unwrap_or(0),
            classification: operation.classification(),
        };

        let tool_info = ToolInfo {
            product: "veriwipe".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            build_id: option_env!("VERIWIPE_BUILD_ID")
                .unwrap_or("dev")
                .to_string(),
            signer_fingerprint: self.signer.fingerprint().to_string(),
        };

        let compliance = ComplianceInfo {
            standards: vec!["NIST SP 800-88".to_string()],
            classification: operation.classification(),
            verification_level: if operation.state == crate::executor::WipeState::Completed {
                "sampled".to_string()
            } else {
                "not_completed".to_string()
            },
        };

        let mut certificate = Certificate {
            certificate_id: Uuid::new_v4().to_string(),
            issued_at: chrono::Utc::now(),
            device_summary,
            operation_summary,
            verification_summary,
            log_projection: log.entries(),
            tool_info,
            compliance,
            signature: String::new(),
            anchor: None,
        };

        let value = serde_json::to_value(&certificate)?;
        let signable = super::canonical::canonical_bytes(&value);
        certificate.signature = self.signer.sign(&signable)?;

        Ok(certificate)
    }
}
