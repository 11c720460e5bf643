//! Device Probe: enumerate block devices and derive `DeviceFacts`.

use crate::drives::operations::{EncryptionProbe, HpaDcoManager, InventoryProbe, SecureEraseProbe};
use crate::drives::types::{DeviceFacts, EncryptionStatus, MediaClass};
use anyhow::Result;
use std::fs;
use std::path::Path;
use tracing::warn;

pub struct DeviceProbe;

impl DeviceProbe {
    /// Enumerate disk-class block devices and probe each one.
    ///
    /// Never fails outright: a fatal enumeration error yields an empty list
    /// (logged), and a single device's analysis failure skips that device.
    pub fn probe_all() -> Vec<DeviceFacts> {
        let entries = match fs::read_dir("/sys/block") {
            Ok(entries) => entries,
            Err(e) => {
                tracing::error!("failed to enumerate /sys/block: {e}");
                return Vec::new();
            }
        };

        let mut facts = Vec::new();
        for entry in entries.flatten() {
            let device_name = entry.file_name().to_string_lossy().to_string();
            if Self::should_skip(&device_name) {
                continue;
            }
            let device_path = format!("/dev/{device_name}");
            if !Path::new(&device_path).exists() {
                continue;
            }
            match Self::probe_one(&device_name, &device_path) {
                Ok(f) => facts.push(f),
                Err(e) => warn!("skipping {device_path}: {e}"),
            }
        }
        facts
    }

    pub fn should_skip(device_name: &str) -> bool {
        device_name.starts_with("loop")
            || device_name.starts_with("ram")
            || device_name.starts_with("dm-")
            || device_name.starts_with("sr")
            || device_name.starts_with("zram")
    }

    /// Probe a single device by its `/dev` path, deriving the device name
    /// used for `/sys/block` lookups.
    pub fn probe_path(device_path: &str) -> Result<DeviceFacts> {
        let device_name = device_path
            .rsplit('/')
            .next()
            .ok_or_else(|| anyhow::anyhow!("malformed device path: {device_path}"))?;
        Self::probe_one(device_name, device_path)
    }

    fn probe_one(device_name: &str, device_path: &str) -> Result<DeviceFacts> {
        let inventory = InventoryProbe::probe(device_name, device_path)?;

        let media_class = Self::classify_media(device_name, &inventory);

        let encryption = EncryptionProbe::detect(device_path).unwrap_or(EncryptionStatus::Unknown);

        let hidden_area_present = HpaDcoManager::hidden_area_present(device_path).unwrap_or(false);

        let supports_secure_erase =
            SecureEraseProbe::supports_secure_erase(device_path, media_class).unwrap_or(false);

        let mut raw_probe_blobs = std::collections::HashMap::new();
        raw_probe_blobs.insert("lsblk".to_string(), inventory.raw.clone());

        Ok(DeviceFacts {
            device_id: device_path.to_string(),
            media_class,
            model: inventory.model,
            serial: inventory.serial,
            capacity_bytes: inventory.capacity_bytes,
            transport: inventory.transport,
            encryption,
            hidden_area_present,
            supports_secure_erase,
            raw_probe_blobs,
        })
    }

    /// Priority ladder: NVMe identify present, then rotation rate (SSD vs.
    /// HDD), then eMMC signature, then USB transport, else unknown. A
    /// rotational device answers "is this spinning media" before transport
    /// is consulted, so a USB-attached HDD still classifies as `hdd` rather
    /// than falling into the generic `usb` bucket.
    fn classify_media(
        device_name: &str,
        inventory: &super::operations::smart::InventoryFacts,
    ) -> MediaClass {
        use crate::drives::types::Transport;

        if inventory.nvme_identify_present || device_name.starts_with("nvme") {
            return MediaClass::SsdNvme;
        }
        match inventory.rotational {
            Some(false) => return MediaClass::SsdSata,
            Some(true) => return MediaClass::Hdd,
            None => {}
        }
        if inventory.emmc_signature {
            return MediaClass::Emmc;
        }
        if inventory.transport == Transport::Usb {
            return MediaClass::Usb;
        }
        MediaClass::Unknown
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn skips_virtual_devices() {
        assert!(DeviceProbe::should_skip("loop0"));
        assert!(DeviceProbe::should_skip("ram0"));
        assert!(DeviceProbe::should_skip("dm-0"));
        assert!(DeviceProbe::should_skip("sr0"));
        assert!(DeviceProbe::should_skip("zram0"));
        assert!(!DeviceProbe::should_skip("sda"));
        assert!(!DeviceProbe::should_skip("nvme0n1"));
    }

    #[test]
    fn media_classification_priority() {
        use super::super::operations::smart::InventoryFacts;
        use crate::drives::types::Transport;

        let nvme = InventoryFacts {
            nvme_identify_present: true,
            ..Default::default()
        };
        assert_eq!(
            DeviceProbe::classify_media("nvme0n1", &nvme),
            MediaClass::SsdNvme
        );

        let emmc = InventoryFacts {
            emmc_signature: true,
            ..Default::default()
        };
        assert_eq!(
            DeviceProbe::classify_media("mmcblk0", &emmc),
            MediaClass::Emmc
        );

        let usb = InventoryFacts {
            transport: Transport::Usb,
            ..Default::default()
        };
        assert_eq!(DeviceProbe::classify_media("sdb", &usb), MediaClass::Usb);

        let ssd = InventoryFacts {
            rotational: Some(false),
            ..Default::default()
        };
        assert_eq!(
            DeviceProbe::classify_media("sda", &ssd),
            MediaClass::SsdSata
        );

        let hdd = InventoryFacts {
            rotational: Some(true),
            ..Default::default()
        };
        assert_eq!(DeviceProbe::classify_media("sda", &hdd), MediaClass::Hdd);

        let unknown = InventoryFacts::default();
        assert_eq!(
            DeviceProbe::classify_media("sda", &unknown),
            MediaClass::Unknown
        );
    }

    #[test]
    fn usb_attached_rotational_drive_classifies_as_hdd() {
        use super::super::operations::smart::InventoryFacts;
        use crate::drives::types::Transport;

        let usb_hdd = InventoryFacts {
            transport: Transport::Usb,
            rotational: Some(true),
            ..Default::default()
        };
        assert_eq!(
            DeviceProbe::classify_media("sdb", &usb_hdd),
            MediaClass::Hdd
        );
    }
}
