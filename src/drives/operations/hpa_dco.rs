//! Host Protected Area / Device Configuration Overlay inspection and restore.

use anyhow::Result;
use std::process::Command;

pub struct HpaDcoManager;

impl HpaDcoManager {
    /// True if `hdparm -N`/`--dco-identify` output advertises a hidden area.
    pub fn hidden_area_present(device_path: &str) -> Result<bool> {
        let native_max = Command::new("hdparm").arg("-N").arg(device_path).output();
        if let Ok(out) = native_max {
            let text = String::from_utf8_lossy(&out.stdout).to_lowercase();
            if text.contains("hpa") || text.contains("native") && text.contains("current") {
                if Self::reports_shrunk_capacity(&text) {
                    return Ok(true);
                }
            }
        }

        let dco = Command::new("hdparm")
            .arg("--dco-identify")
            .arg(device_path)
            .output();
        if let Ok(out) = dco {
            let text = String::from_utf8_lossy(&out.stdout).to_lowercase();
            if text.contains("dco") && out.status.success() {
                return Ok(true);
            }
        }

        Ok(false)
    }

    fn reports_shrunk_capacity(hdparm_n_output: &str) -> bool {
        // "-N" output looks like: "max sectors   = 1000000/2000000, HPA is enabled"
        hdparm_n_output.contains("hpa is enabled")
    }

    /// Restore full native capacity (HPA) and remove any DCO limitation.
    ///
    /// Returns `Err` if either `hdparm` invocation fails or errors; the
    /// caller logs that as a pre-flight warning and continues rather than
    /// aborting the operation.
    pub fn restore_full_capacity(device_path: &str) -> Result<()> {
        let hpa = Command::new("hdparm")
            .arg("--yes-i-know-what-i-am-doing")
            .arg("-N")
            .arg("p1048576")
            .arg(device_path)
            .output()?;
        if !hpa.status.success() {
            anyhow::bail!(
                "hdparm -N restore failed: {}",
                String::from_utf8_lossy(&hpa.stderr).trim()
            );
        }

        let dco = Command::new("hdparm")
            .arg("--dco-restore")
            .arg("--yes-i-know-what-i-am-doing")
            .arg(device_path)
            .output()?;
        if !dco.status.success() {
            anyhow::bail!(
                "hdparm --dco-restore failed: {}",
                String::from_utf8_lossy(&dco.stderr).trim()
            );
        }

        Ok(())
    }
}
