//! Method Selector: deterministic mapping from device facts to a wipe
//! strategy, with a fallback rule used by the Executor on recoverable
//! error and a pluggable scoring hook for future use.

use crate::drives::types::{DeviceFacts, EncryptionStatus, MediaClass, WipeStrategy};
use crate::error::WipeErrorKind;
use std::collections::HashMap;

/// Pure, deterministic selection. Same facts always produce the same
/// strategy.
pub fn select(facts: &DeviceFacts) -> WipeStrategy {
    if matches!(
        facts.encryption,
        EncryptionStatus::Luks | EncryptionStatus::BitLocker
    ) {
        return WipeStrategy::CryptoEraseLuks;
    }

    match facts.media_class {
        MediaClass::SsdNvme => {
            if facts.supports_secure_erase {
                WipeStrategy::NvmeSecureErase
            } else {
                WipeStrategy::NvmeCryptoErase
            }
        }
        MediaClass::SsdSata | MediaClass::Emmc => {
            if facts.supports_secure_erase {
                WipeStrategy::AtaSecureErase
            } else {
                WipeStrategy::SinglePassRandom
            }
        }
        MediaClass::Hdd => {
            if facts.supports_secure_erase {
                WipeStrategy::AtaSecureErase
            } else {
                WipeStrategy::MultipassOverwrite
            }
        }
        MediaClass::Usb | MediaClass::Unknown => WipeStrategy::SinglePassRandom,
    }
}

/// `select`, but with an optional scoring hook that can override the rule
/// ladder. Kept as a typed seam for a future trained classifier; absent a
/// scorer this is identical to `select`.
///
/// The scorer returns a score per candidate strategy; the highest-scoring
/// strategy wins ties broken by the rule ladder's own pick.
pub fn select_with_scorer<F>(facts: &DeviceFacts, scorer: Option<F>) -> WipeStrategy
where
    F: Fn(&DeviceFacts) -> HashMap<WipeStrategy, f64>,
{
    let rule_pick = select(facts);
    let Some(scorer) = scorer else {
        return rule_pick;
    };

    let scores = scorer(facts);
    scores
        .into_iter()
        .max_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal))
        .map(|(strategy, _)| strategy)
        .unwrap_or(rule_pick)
}

/// Substitute strategy for a recoverable error during sanitize (§4.2 /
/// §4.3). Returns `None` when the error is not recoverable for this
/// strategy, in which case the Executor terminates with `failed`.
pub fn fallback(current: WipeStrategy, error_kind: WipeErrorKind) -> Option<WipeStrategy> {
    match error_kind {
        WipeErrorKind::Unsupported => Some(WipeStrategy::SinglePassRandom),
        WipeErrorKind::Timeout => match current {
            WipeStrategy::MultipassOverwrite => Some(WipeStrategy::SinglePassRandom),
            _ => None,
        },
        _ => None,
    }
}
