//! Certificate Builder & Verifier: the signed, offline-verifiable
//! attestation artifact.

pub mod builder;
pub mod canonical;
pub mod verifier;

pub use builder::CertificateBuilder;
pub use verifier::{CertificateVerifier, VerifyResult};

use crate::drives::types::{EncryptionStatus, MediaClass, NistClassification, Transport, WipeStrategy};
use crate::executor::WipeState;
use crate::log_chain::LogEntry;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeviceSummary {
    pub model: String,
    pub media_class: MediaClass,
    pub capacity_bytes: u64,
    pub transport: Transport,
    pub encryption: EncryptionStatus,
    pub hidden_area_present: bool,
    pub supports_secure_erase: bool,
    pub device_path_hash: String,
    pub serial_hash: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OperationSummary {
    pub strategy: WipeStrategy,
    pub state: WipeState,
    pub started_at: Option<chrono::DateTime<chrono::Utc>>,
    pub ended_at: Option<chrono::DateTime<chrono::Utc>>,
    pub duration_seconds: Option<f64>,
    pub fallback_used: bool,
    pub error: Option<crate::error::WipeError>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerificationSummary {
    pub pre_sample_hash: Option<String>,
    pub post_sample_hash: Option<String>,
    pub sampled_sector_checks: usize,
    pub classification: NistClassification,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolInfo {
    pub product: String,
    pub version: String,
    pub build_id: String,
    pub signer_fingerprint: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComplianceInfo {
    pub standards: Vec<String>,
    pub classification: NistClassification,
    pub verification_level: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Certificate {
    pub certificate_id: String,
    pub issued_at: chrono::DateTime<chrono::Utc>,
    pub device_summary: DeviceSummary,
    pub operation_summary: OperationSummary,
    pub verification_summary: VerificationSummary,
    pub log_projection: Vec<LogEntry>,
    pub tool_info: ToolInfo,
    pub compliance: ComplianceInfo,
    pub signature: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub anchor: Option<String>,
}
