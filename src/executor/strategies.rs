//! Vendor sanitize-command abstraction. A strategy that issues a
//! media-specific command (ATA secure erase, NVMe format, LUKS erase)
//! goes through this trait rather than shelling out directly, so the
//! Executor's phase logic is testable without real hardware or root.

use crate::drives::operations::{EncryptionProbe, HpaDcoManager};
use crate::error::{WipeError, WipeErrorKind};
use std::process::Command;

pub trait SanitizeCommands: Send + Sync {
    fn unmount_partitions(&self, device_path: &str) -> Result<(), WipeError>;
    fn restore_hidden_area(&self, device_path: &str) -> Result<(), WipeError>;
    fn ata_secure_erase(&self, device_path: &str, capacity_bytes: u64) -> Result<(), WipeError>;
    fn nvme_secure_erase(&self, device_path: &str) -> Result<(), WipeError>;
    fn nvme_crypto_erase(&self, device_path: &str) -> Result<(), WipeError>;
    fn luks_erase(&self, device_path: &str) -> Result<(), WipeError>;
    fn factory_reset(&self, device_path: &str) -> Result<(), WipeError>;
}

/// Shells out to `lsblk`/`umount`, `hdparm`, `nvme`, `cryptsetup` the way
/// the probe-capability sources do.
pub struct SystemSanitizeCommands;

impl SanitizeCommands for SystemSanitizeCommands {
    fn unmount_partitions(&self, device_path: &str) -> Result<(), WipeError> {
        let device_name = device_path.rsplit('/').next().unwrap_or(device_path);
        let out = Command::new("lsblk")
            .args(["-ln", "-o", "NAME"])
            .arg(device_path)
            .output()
            .map_err(|e| WipeError::device_busy(e.to_string()))?;

        let mounts = std::fs::read_to_string("/proc/mounts").unwrap_or_default();

        for line in String::from_utf8_lossy(&out.stdout).lines() {
            let part = line.trim();
            if part.is_empty() || part == device_name {
                continue;
            }
            let partition_path = format!("/dev/{part}");
            if !is_mounted(&mounts, &partition_path) {
                continue;
            }
            let status = Command::new("umount")
                .arg(&partition_path)
                .status()
                .map_err(|e| WipeError::device_busy(e.to_string()))?;
            if !status.success() {
                return Err(WipeError::device_busy(format!(
                    "failed to unmount {partition_path}"
                )));
            }
        }
        Ok(())
    }

    fn restore_hidden_area(&self, device_path: &str) -> Result<(), WipeError> {
        HpaDcoManager::restore_full_capacity(device_path)
            .map_err(|e| WipeError::io_error(e.to_string()))
    }

    fn ata_secure_erase(&self, device_path: &str, _capacity_bytes: u64) -> Result<(), WipeError> {
        let set_pass = Command::new("hdparm")
            .args(["--user-master", "u", "--security-set-pass", "NULL"])
            .arg(device_path)
            .status();
        match set_pass {
            Ok(status) if status.success() => {}
            Ok(_) => return Err(WipeError::unsupported("failed to set security password")),
            Err(e) => return Err(WipeError::io_error(e.to_string())),
        }

        let erase = Command::new("hdparm")
            .args(["--user-master", "u", "--security-erase", "NULL"])
            .arg(device_path)
            .status()
            .map_err(|e| WipeError::io_error(e.to_string()))?;

        if erase.success() {
            Ok(())
        } else {
            Err(WipeError::unsupported(
                "device rejected the ATA secure erase command",
            ))
        }
    }

    fn nvme_secure_erase(&self, device_path: &str) -> Result<(), WipeError> {
        nvme_format(device_path, 1)
    }

    fn nvme_crypto_erase(&self, device_path: &str) -> Result<(), WipeError> {
        nvme_format(device_path, 2)
    }

    fn luks_erase(&self, device_path: &str) -> Result<(), WipeError> {
        EncryptionProbe::luks_erase(device_path).map_err(|e| {
            let msg = e.to_string();
            if msg.to_lowercase().contains("not supported") {
                WipeError::unsupported(msg)
            } else {
                WipeError::io_error(msg)
            }
        })
    }

    fn factory_reset(&self, device_path: &str) -> Result<(), WipeError> {
        // No generic factory-reset primitive exists across media classes;
        // this strategy is reached only when a device advertises one, so
        // treat the absence of a vendor tool as unsupported rather than
        // a hard I/O error.
        let _ = device_path;
        Err(WipeError::unsupported(
            "no factory-reset primitive available for this device",
        ))
    }
}

/// True if `/proc/mounts` lists `partition_path` as a mounted device. An
/// unmounted partition is the ordinary case for a drive staged for wiping;
/// only an unmount that was actually needed should count as device-busy.
fn is_mounted(proc_mounts: &str, partition_path: &str) -> bool {
    proc_mounts
        .lines()
        .any(|line| line.split_whitespace().next() == Some(partition_path))
}

fn nvme_format(device_path: &str, secure_erase_setting: u8) -> Result<(), WipeError> {
    let status = Command::new("nvme")
        .arg("format")
        .arg(device_path)
        .args(["--namespace-id", "1"])
        .args(["--ses", &secure_erase_setting.to_string()])
        .status()
        .map_err(|e| WipeError::io_error(e.to_string()))?;

    if status.success() {
        Ok(())
    } else {
        Err(WipeError::unsupported(
            "device rejected the NVMe format/secure-erase command",
        ))
    }
}

/// Test double: every call is pre-scripted by the test.
#[derive(Default)]
pub struct FakeSanitizeCommands {
    pub unmount_result: Option<WipeErrorKind>,
    pub ata_result: Option<WipeErrorKind>,
    pub nvme_secure_result: Option<WipeErrorKind>,
    pub nvme_crypto_result: Option<WipeErrorKind>,
    pub luks_result: Option<WipeErrorKind>,
}

fn to_result(kind: &Option<WipeErrorKind>) -> Result<(), WipeError> {
    match kind {
        None => Ok(()),
        Some(k) => Err(WipeError::new(*k, "fake sanitize command failure")),
    }
}

impl SanitizeCommands for FakeSanitizeCommands {
    fn unmount_partitions(&self, _device_path: &str) -> Result<(), WipeError> {
        to_result(&self.unmount_result)
    }

    fn restore_hidden_area(&self, _device_path: &str) -> Result<(), WipeError> {
        Ok(())
    }

    fn ata_secure_erase(&self, _device_path: &str, _capacity_bytes: u64) -> Result<(), WipeError> {
        to_result(&self.ata_result)
    }

    fn nvme_secure_erase(&self, _device_path: &str) -> Result<(), WipeError> {
        to_result(&self.nvme_secure_result)
    }

    fn nvme_crypto_erase(&self, _device_path: &str) -> Result<(), WipeError> {
        to_result(&self.nvme_crypto_result)
    }

    fn luks_erase(&self, _device_path: &str) -> Result<(), WipeError> {
        to_result(&self.luks_result)
    }

    fn factory_reset(&self, _device_path: &str) -> Result<(), WipeError> {
        Err(WipeError::unsupported("fake: no factory reset primitive"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn is_mounted_matches_exact_device_column() {
        let proc_mounts = "/dev/sda1 / ext4 rw,relatime 0 0\n/dev/sdb1 /mnt/data ext4 rw 0 0\n";
        assert!(is_mounted(proc_mounts, "/dev/sda1"));
        assert!(is_mounted(proc_mounts, "/dev/sdb1"));
        assert!(!is_mounted(proc_mounts, "/dev/sdc1"));
    }

    #[test]
    fn is_mounted_is_false_for_empty_proc_mounts() {
        assert!(!is_mounted("", "/dev/sda1"));
    }
}
