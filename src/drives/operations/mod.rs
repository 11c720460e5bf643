// Probe-capability sources. Each is independent: a failure here yields a
// missing fact, never an aborted probe.

pub mod hpa_dco; // Hidden Protected Area / Device Configuration Overlay
pub mod sed; // Encryption-container detection and crypto erase
pub mod smart; // Generic block-device inventory
pub mod trim; // Media-specific secure-erase capability

pub use hpa_dco::HpaDcoManager;
pub use sed::EncryptionProbe;
pub use smart::InventoryProbe;
pub use trim::SecureEraseProbe;
