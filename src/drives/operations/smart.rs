//! Generic block-device inventory: size, model, serial, transport, rotation.

use crate::drives::types::Transport;
use anyhow::Result;
use std::fs;
use std::process::Command;

pub struct InventoryProbe;

#[derive(Debug, Clone, Default)]
pub struct InventoryFacts {
    pub model: String,
    pub serial: String,
    pub capacity_bytes: u64,
    pub transport: Transport,
    pub rotational: Option<bool>,
    pub nvme_identify_present: bool,
    pub emmc_signature: bool,
    pub raw: String,
}

impl InventoryProbe {
    /// Gather basic inventory facts from `/sys/block/<dev>` and `lsblk`.
    ///
    /// Each source is independent; a missing file yields a default rather
    /// than aborting the whole probe.
    pub fn probe(device_name: &str, device_path: &str) -> Result<InventoryFacts> {
        let sys_block = format!("/sys/block/{device_name}");

        let capacity_bytes = fs::read_to_string(format!("{sys_block}/size"))
            .ok()
            .and_then(|s| s.trim().parse::<u64>().ok())
            .map(|sectors| sectors * 512)
            .unwrap_or(0);

        let rotational = fs::read_to_string(format!("{sys_block}/queue/rotational"))
            .ok()
            .map(|s| s.trim() == "1");

        let transport = if device_name.starts_with("nvme") {
            Transport::Nvme
        } else if Self::is_usb(&sys_block) {
            Transport::Usb
        } else if device_name.starts_with("mmcblk") {
            Transport::Mmc
        } else if device_name.starts_with("sd") {
            Transport::Sata
        } else {
            Transport::Unknown
        };

        let nvme_identify_present = device_name.starts_with("nvme")
            && Command::new("nvme")
                .arg("id-ctrl")
                .arg(device_path)
                .output()
                .map(|o| o.status.success())
                .unwrap_or(false);

        let emmc_signature = device_name.starts_with("mmcblk");

        let (model, serial) = Self::model_and_serial(&sys_block, device_path);

        let raw = Command::new("lsblk")
            .args(["-no", "NAME,MODEL,SERIAL,TRAN"])
            .arg(device_path)
            .output()
            .map(|o| String::from_utf8_lossy(&o.stdout).trim().to_string())
            .unwrap_or_default();

        Ok(InventoryFacts {
            model,
            serial,
            capacity_bytes,
            transport,
            rotational,
            nvme_identify_present,
            emmc_signature,
            raw,
        })
    }

    fn is_usb(sys_block: &str) -> bool {
        fs::read_link(format!("{sys_block}/device"))
            .map(|target| target.to_string_lossy().contains("usb"))
            .unwrap_or(false)
    }

    fn model_and_serial(sys_block: &str, device_path: &str) -> (String, String) {
        let model = fs::read_to_string(format!("{sys_block}/device/model"))
            .map(|s| s.trim().to_string())
            .unwrap_or_default();
        let serial = fs::read_to_string(format!("{sys_block}/device/serial"))
            .map(|s| s.trim().to_string())
            .unwrap_or_else(|_| {
                Command::new("lsblk")
                    .args(["-no", "SERIAL"])
                    .arg(device_path)
                    .output()
                    .map(|o| String::from_utf8_lossy(&o.stdout).trim().to_string())
                    .unwrap_or_default()
            });
        (model, serial)
    }
}
