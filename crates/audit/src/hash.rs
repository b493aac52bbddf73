//! Hash chain utilities for audit integrity

use crate::entry::AuditEntry;
use crate::error::{AuditError, AuditResult, IntegrityFault};
use serde_json::Value;
use sha2::{Digest, Sha256};

/// Hash of the entry preceding the first entry: none, so empty.
pub const GENESIS_PREV_HASH: &str = "";

/// Canonical serialization of an entry payload.
///
/// `serde_json::Map` is BTreeMap-backed (the `preserve_order` feature
/// is not enabled anywhere in this workspace), so object keys always
/// serialize in sorted order and recomputation is reproducible.
pub fn canonical_payload(payload: &Value) -> AuditResult<String> {
    Ok(serde_json::to_string(payload)?)
}

/// Calculate the SHA256 hash of entry content (excluding the hash field itself).
///
/// Every field is framed with a little-endian length prefix, and
/// optional fields carry a presence byte, so bytes can never shift
/// between adjacent fields without changing the digest.
pub fn calculate_entry_hash(entry: &AuditEntry) -> AuditResult<String> {
    let mut hasher = Sha256::new();

    hasher.update(entry.sequence.to_le_bytes());
    update_field(&mut hasher, entry.action.to_string().as_bytes());
    update_optional(&mut hasher, entry.actor_id.as_deref());
    update_field(&mut hasher, entry.target_id.as_bytes());
    update_field(&mut hasher, canonical_payload(&entry.payload)?.as_bytes());
    update_optional(&mut hasher, entry.client_info.as_deref());
    update_field(&mut hasher, entry.timestamp.to_rfc3339().as_bytes());
    update_field(&mut hasher, entry.prev_hash.as_bytes());

    Ok(hex::encode(hasher.finalize()))
}

fn update_field(hasher: &mut Sha256, bytes: &[u8]) {
    hasher.update((bytes.len() as u64).to_le_bytes());
    hasher.update(bytes);
}

fn update_optional(hasher: &mut Sha256, field: Option<&str>) {
    match field {
        Some(value) => {
            hasher.update([1u8]);
            update_field(hasher, value.as_bytes());
        }
        None => hasher.update([0u8]),
    }
}

/// Verify a contiguous run of entries.
///
/// `starting_prev` is the hash the first entry must link back to: the
/// empty genesis value for a full verification, or the stored hash of
/// the entry just before the slice for a partial one.
pub fn verify_entries(entries: &[AuditEntry], starting_prev: &str) -> AuditResult<()> {
    let mut prev_hash = starting_prev.to_string();
    let mut expected_seq = entries.first().map(|e| e.sequence);

    for entry in entries {
        if let Some(expected) = expected_seq {
            if entry.sequence != expected {
                return Err(AuditError::ChainIntegrity {
                    sequence: entry.sequence,
                    fault: IntegrityFault::SequenceGap {
                        expected,
                        actual: entry.sequence,
                    },
                });
            }
        }

        if entry.prev_hash != prev_hash {
            return Err(AuditError::ChainIntegrity {
                sequence: entry.sequence,
                fault: IntegrityFault::BrokenLink {
                    expected: prev_hash,
                    actual: entry.prev_hash.clone(),
                },
            });
        }

        let calculated = calculate_entry_hash(entry)?;
        if entry.hash != calculated {
            return Err(AuditError::ChainIntegrity {
                sequence: entry.sequence,
                fault: IntegrityFault::InvalidHash {
                    expected: calculated,
                    actual: entry.hash.clone(),
                },
            });
        }

        prev_hash = entry.hash.clone();
        expected_seq = Some(entry.sequence + 1);
    }

    Ok(())
}
