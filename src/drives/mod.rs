//! Device Probe: enumerates block devices and derives `DeviceFacts`.
//!
//! - `types`: the `DeviceFacts`/`WipeStrategy` data model.
//! - `detection`: the probe itself, composing the capability sources below.
//! - `operations`: independent probe-capability sources (inventory,
//!   encryption, hidden-area, secure-erase support).

pub mod detection;
pub mod operations;
pub mod types;

pub use detection::DeviceProbe;
pub use types::{
    DeviceFacts, EncryptionStatus, MediaClass, NistClassification, Transport, WipeStrategy,
};
