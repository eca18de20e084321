use anyhow::{Context, Result};

use crate::item::VaultItem;
use crate::normalize::normalize;

/// Serialize an item's canonical projection to its comparison byte form.
///
/// serde_json backs objects with a BTreeMap, so key order in the output is
/// stable and the encoding carries no extraneous whitespace; byte equality
/// of two encodings is therefore equivalent to structural equality of the
/// projections.
pub fn canonical_bytes(item: &VaultItem) -> Result<Vec<u8>> {
    let tree = normalize(item)?;
    serde_json::to_vec(&tree).context("Failed to serialize canonical projection")
}

/// Whether two items differ once store metadata, volatile fields, and
/// collection ordering are normalized away. Symmetric.
pub fn items_differ(source: &VaultItem, destination: &VaultItem) -> Result<bool> {
    let left = canonical_bytes(source)?;
    let right = canonical_bytes(destination)?;

    if left == right {
        return Ok(false);
    }

    log::debug!(
        "Item '{}' differs:\n  source:      {}\n  destination: {}",
        source.name,
        String::from_utf8_lossy(&left),
        String::from_utf8_lossy(&right)
    );
    Ok(true)
}
