//! Device facts and the closed wipe-strategy set.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Media class of a probed block device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MediaClass {
    Hdd,
    SsdSata,
    SsdNvme,
    Emmc,
    Usb,
    Unknown,
}

/// Transport/interface a device was reached through.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Transport {
    Sata,
    Nvme,
    Usb,
    Mmc,
    #[default]
    Unknown,
}

/// Recognized on-device encryption container, if any.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EncryptionStatus {
    None,
    Luks,
    BitLocker,
    Unknown,
}

/// NIST SP 800-88 sanitization intensity a strategy achieves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub enum NistClassification {
    Clear,
    Purge,
}

/// The closed set of sanitization strategies the executor knows how to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WipeStrategy {
    AtaSecureErase,
    NvmeSecureErase,
    NvmeCryptoErase,
    CryptoEraseLuks,
    MultipassOverwrite,
    SinglePassRandom,
    FactoryReset,
}

impl WipeStrategy {
    /// The NIST SP 800-88 classification this strategy achieves when it
    /// completes successfully.
    pub fn nist_classification(&self) -> NistClassification {
        match self {
            WipeStrategy::AtaSecureErase
            | WipeStrategy::NvmeSecureErase
            | WipeStrategy::NvmeCryptoErase
            | WipeStrategy::CryptoEraseLuks
            | WipeStrategy::MultipassOverwrite => NistClassification::Purge,
            WipeStrategy::SinglePassRandom | WipeStrategy::FactoryReset => {
                NistClassification::Clear
            }
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            WipeStrategy::AtaSecureErase => "ata_secure_erase",
            WipeStrategy::NvmeSecureErase => "nvme_secure_erase",
            WipeStrategy::NvmeCryptoErase => "nvme_crypto_erase",
            WipeStrategy::CryptoEraseLuks => "crypto_erase_luks",
            WipeStrategy::MultipassOverwrite => "multipass_overwrite",
            WipeStrategy::SinglePassRandom => "single_pass_random",
            WipeStrategy::FactoryReset => "factory_reset",
        }
    }
}

impl std::fmt::Display for WipeStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of probing one block device.
///
/// `raw_probe_blobs` is retained only for selection-time debugging and the
/// `--info` dump; it is never published in a certificate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeviceFacts {
    pub device_id: String,
    pub media_class: MediaClass,
    pub model: String,
    pub serial: String,
    pub capacity_bytes: u64,
    pub transport: Transport,
    pub encryption: EncryptionStatus,
    pub hidden_area_present: bool,
    pub supports_secure_erase: bool,
    #[serde(default)]
    pub raw_probe_blobs: HashMap<String, String>,
}

impl DeviceFacts {
    pub fn capacity_gb(&self) -> u64 {
        self.capacity_bytes / 1_000_000_000
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strategy_classification_table() {
        assert_eq!(
            WipeStrategy::NvmeSecureErase.nist_classification(),
            NistClassification::Purge
        );
        assert_eq!(
            WipeStrategy::SinglePassRandom.nist_classification(),
            NistClassification::Clear
        );
        assert_eq!(
            WipeStrategy::FactoryReset.nist_classification(),
            NistClassification::Clear
        );
        assert_eq!(
            WipeStrategy::CryptoEraseLuks.nist_classification(),
            NistClassification::Purge
        );
    }
}
