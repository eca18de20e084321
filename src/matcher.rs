use rayon::prelude::*;
use rayon::ThreadPool;
use std::collections::HashMap;

use crate::identity;
use crate::item::VaultItem;

/// Result of the exact fingerprint matching phase.
#[derive(Debug, Default)]
pub struct ExactMatches {
    /// Pairs whose fingerprint exists on both sides.
    pub pairs: Vec<(VaultItem, VaultItem)>,
    /// Source items whose fingerprint has no destination counterpart.
    pub source_only: Vec<VaultItem>,
    /// Destination items whose fingerprint has no source counterpart.
    pub destination_only: Vec<VaultItem>,
}

/// Result of the fuzzy matching phase.
#[derive(Debug, Default)]
pub struct FuzzyMatches {
    /// Pairs claimed by fuzzy key lookup.
    pub pairs: Vec<(VaultItem, VaultItem)>,
    /// Source items with no fuzzy hit (create candidates).
    pub source_only: Vec<VaultItem>,
    /// Destination items not consumed by any match (delete candidates).
    pub destination_only: Vec<VaultItem>,
}

/// Match the two fingerprinted sets exactly. Maps are fully built before
/// this runs, so lookups need no coordination.
pub fn match_exact(
    source: HashMap<String, VaultItem>,
    mut destination: HashMap<String, VaultItem>,
) -> ExactMatches {
    let mut matches = ExactMatches::default();

    for (fp, src) in source {
        match destination.remove(&fp) {
            Some(dst) => matches.pairs.push((src, dst)),
            None => matches.source_only.push(src),
        }
    }
    matches.destination_only = destination.into_values().collect();
    matches
}

/// Fuzzy-match the items left over from the exact phase.
///
/// Key lookups are independent per source item and run on the worker pool
/// against a read-only index. Claims are then applied by a single
/// sequential pass in source input order, so each destination item is
/// consumed at most once and a contested key always goes to the earliest
/// source item; the loser falls through to create.
pub fn match_fuzzy(
    pool: &ThreadPool,
    source: Vec<VaultItem>,
    destination: Vec<VaultItem>,
) -> FuzzyMatches {
    let mut index: HashMap<String, usize> = HashMap::new();
    for (slot, dst) in destination.iter().enumerate() {
        index.entry(identity::fuzzy_key(dst)).or_insert(slot);
    }

    let hits: Vec<Option<usize>> = pool.install(|| {
        source
            .par_iter()
            .map(|src| index.get(&identity::fuzzy_key(src)).copied())
            .collect()
    });

    let mut slots: Vec<Option<VaultItem>> = destination.into_iter().map(Some).collect();
    let mut matches = FuzzyMatches::default();

    for (src, hit) in source.into_iter().zip(hits) {
        match hit.and_then(|slot| slots[slot].take()) {
            Some(dst) => matches.pairs.push((src, dst)),
            None => matches.source_only.push(src),
        }
    }
    matches.destination_only = slots.into_iter().flatten().collect();
    matches
}
