//! Encryption-container detection: LUKS, with BitLocker recognized but
//! scoped out of crypto-erase support.

use crate::drives::types::EncryptionStatus;
use anyhow::Result;
use std::process::Command;

pub struct EncryptionProbe;

impl EncryptionProbe {
    pub fn detect(device_path: &str) -> Result<EncryptionStatus> {
        if Self::is_luks(device_path) {
            return Ok(EncryptionStatus::Luks);
        }
        if Self::is_bitlocker(device_path)? {
            return Ok(EncryptionStatus::BitLocker);
        }
        Ok(EncryptionStatus::None)
    }

    fn is_luks(device_path: &str) -> bool {
        Command::new("cryptsetup")
            .arg("isLuks")
            .arg(device_path)
            .status()
            .map(|s| s.success())
            .unwrap_or(false)
    }

    fn is_bitlocker(device_path: &str) -> Result<bool> {
        let out = Command::new("blkid").arg(device_path).output();
        if let Ok(out) = out {
            let text = String::from_utf8_lossy(&out.stdout).to_lowercase();
            return Ok(text.contains("bitlocker"));
        }
        Ok(false)
    }

    /// Destroy the LUKS header in place, rendering ciphertext unrecoverable.
    pub fn luks_erase(device_path: &str) -> Result<()> {
        let status = Command::new("cryptsetup")
            .arg("luksErase")
            .arg("--batch-mode")
            .arg(device_path)
            .status()?;
        if !status.success() {
            anyhow::bail!("cryptsetup luksErase exited with {status}");
        }
        Ok(())
    }
}
