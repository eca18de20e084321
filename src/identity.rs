use sha2::{Digest, Sha256};

use crate::item::VaultItem;

/// Name of the custom field that carries an item's durable sync identity.
pub const SYNC_FIELD: &str = "sync_id";

/// Compute the deterministic fingerprint of an item: the sha256 hex digest
/// of `name|username|first-URI-domain`, each component lowercased and
/// trimmed, absent components treated as empty.
///
/// Store-assigned IDs and timestamps never feed into the digest, so the
/// same semantic content always fingerprints identically on both sides.
pub fn compute_fingerprint(item: &VaultItem) -> String {
    let name = item.name.trim().to_lowercase();
    let username = item.username().trim().to_lowercase();
    let domain = uri_domain(item.first_uri());

    let mut hasher = Sha256::new();
    hasher.update(format!("{name}|{username}|{domain}").as_bytes());
    hex::encode(hasher.finalize())
}

/// Looser identity used as a fallback when no fingerprint is resolvable:
/// `name|first-URI`, lowercased and trimmed.
pub fn fuzzy_key(item: &VaultItem) -> String {
    let name = item.name.trim().to_lowercase();
    let uri = item.first_uri().trim().to_lowercase();
    format!("{name}|{uri}")
}

/// Read the fingerprint stored on an item, if any.
pub fn fingerprint(item: &VaultItem) -> Option<String> {
    item.custom_field(SYNC_FIELD)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// Store a fingerprint on an item as the `sync_id` custom field.
/// Idempotent: writing the same value twice changes nothing.
pub fn set_fingerprint(item: &mut VaultItem, fp: &str) {
    item.set_custom_field(SYNC_FIELD, fp);
}

/// Resolve an item's identity before matching.
///
/// An existing `sync_id` is trusted and never overwritten. Otherwise a
/// fingerprint is computed and attached in place, unless the item has no
/// usable identity inputs at all (empty name, username, and URI), in which
/// case it falls through to fuzzy matching.
pub fn assign(item: &mut VaultItem) -> Option<String> {
    if let Some(existing) = fingerprint(item) {
        return Some(existing);
    }
    if !has_identity_inputs(item) {
        return None;
    }
    let fp = compute_fingerprint(item);
    set_fingerprint(item, &fp);
    Some(fp)
}

/// Whether at least one of the fingerprint inputs is non-empty.
pub fn has_identity_inputs(item: &VaultItem) -> bool {
    !item.name.trim().is_empty()
        || !item.username().trim().is_empty()
        || !item.first_uri().trim().is_empty()
}

/// Extract the host part of a URI: lowercase, strip the scheme separator,
/// truncate at the first path segment.
fn uri_domain(uri: &str) -> String {
    let uri = uri.trim().to_lowercase();
    let after_scheme = uri.rsplit("//").next().unwrap_or("");
    after_scheme.split('/').next().unwrap_or("").to_string()
}
