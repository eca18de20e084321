use anyhow::{Context, Result};
use log::{debug, info, warn};
use rayon::prelude::*;
use rayon::ThreadPool;
use std::collections::HashMap;

use crate::compare;
use crate::identity;
use crate::item::VaultItem;
use crate::matcher;
use crate::store::VaultStore;

/// Default width of the comparison worker pool.
pub const DEFAULT_MAX_WORKERS: usize = 8;

/// The three-way diff produced by one planning run.
///
/// Bucket order is not guaranteed across runs; membership is deterministic
/// for deterministic input content. Reporting sorts by item name for
/// stable output.
#[derive(Debug, Default)]
pub struct SyncPlan {
    /// Source items missing from the destination.
    pub to_create: Vec<VaultItem>,
    /// `(source, destination)` pairs whose normalized content differs.
    pub to_update: Vec<(VaultItem, VaultItem)>,
    /// Destination items missing from the source.
    pub to_delete: Vec<VaultItem>,
}

impl SyncPlan {
    /// Whether both vaults are already in sync.
    pub fn is_empty(&self) -> bool {
        self.to_create.is_empty() && self.to_update.is_empty() && self.to_delete.is_empty()
    }

    /// Total number of planned changes.
    pub fn change_count(&self) -> usize {
        self.to_create.len() + self.to_update.len() + self.to_delete.len()
    }
}

/// Computes a dry-run reconciliation plan between a source and a
/// destination vault. Read-only: neither store is ever mutated.
pub struct SyncPlanner {
    source: Box<dyn VaultStore>,
    destination: Box<dyn VaultStore>,
    pool: ThreadPool,
}

impl SyncPlanner {
    /// Create a planner with the default worker pool width.
    pub fn new(source: Box<dyn VaultStore>, destination: Box<dyn VaultStore>) -> Result<Self> {
        Self::with_workers(source, destination, DEFAULT_MAX_WORKERS)
    }

    /// Create a planner with an explicit worker pool width. The pool is
    /// built once here and shared by every parallel phase.
    pub fn with_workers(
        source: Box<dyn VaultStore>,
        destination: Box<dyn VaultStore>,
        max_workers: usize,
    ) -> Result<Self> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(max_workers.max(1))
            .build()
            .context("Failed to build comparison worker pool")?;

        Ok(SyncPlanner {
            source,
            destination,
            pool,
        })
    }

    /// Compute the sync plan.
    ///
    /// Phases run strictly in sequence; work inside a phase runs on the
    /// worker pool. A fetch failure on either side aborts before any
    /// matching, and a comparison failure aborts the whole call rather
    /// than return a partial plan.
    pub fn plan(&self) -> Result<SyncPlan> {
        info!("Fetching source and destination items");
        let src_items = self
            .source
            .list_items()
            .context("Source vault unavailable")?;
        let dst_items = self
            .destination
            .list_items()
            .context("Destination vault unavailable")?;
        debug!(
            "Fetched {} source and {} destination items",
            src_items.len(),
            dst_items.len()
        );

        let (src_map, src_unmatched) = partition_by_fingerprint(src_items, "source");
        let (dst_map, dst_unmatched) = partition_by_fingerprint(dst_items, "destination");

        let mut plan = SyncPlan::default();

        info!("Matching by fingerprint");
        let exact = matcher::match_exact(src_map, dst_map);
        plan.to_create = exact.source_only;
        plan.to_delete = exact.destination_only;

        info!("Comparing {} matched pairs", exact.pairs.len());
        plan.to_update = self.changed_pairs(exact.pairs)?;

        info!(
            "Fuzzy matching {} source / {} destination leftovers",
            src_unmatched.len(),
            dst_unmatched.len()
        );
        let fuzzy = matcher::match_fuzzy(&self.pool, src_unmatched, dst_unmatched);

        info!("Comparing {} fuzzy matched pairs", fuzzy.pairs.len());
        plan.to_update.extend(self.changed_pairs(fuzzy.pairs)?);
        plan.to_create.extend(fuzzy.source_only);
        plan.to_delete.extend(fuzzy.destination_only);

        info!(
            "Plan complete: create {}, update {}, delete {}",
            plan.to_create.len(),
            plan.to_update.len(),
            plan.to_delete.len()
        );
        Ok(plan)
    }

    /// Compare pairs in parallel, keeping only the ones that differ.
    /// Any task error fails the whole phase.
    fn changed_pairs(
        &self,
        pairs: Vec<(VaultItem, VaultItem)>,
    ) -> Result<Vec<(VaultItem, VaultItem)>> {
        let compared: Vec<Option<(VaultItem, VaultItem)>> = self.pool.install(|| {
            pairs
                .into_par_iter()
                .map(|(src, dst)| {
                    let differs = compare::items_differ(&src, &dst)
                        .with_context(|| format!("Failed to compare item '{}'", src.name))?;
                    Ok(differs.then_some((src, dst)))
                })
                .collect::<Result<_>>()
        })?;

        Ok(compared.into_iter().flatten().collect())
    }
}

/// Assign identities to every item and split a snapshot into a
/// fingerprint map and the leftovers that have no usable fingerprint.
fn partition_by_fingerprint(
    items: Vec<VaultItem>,
    side: &str,
) -> (HashMap<String, VaultItem>, Vec<VaultItem>) {
    let mut map = HashMap::new();
    let mut unmatched = Vec::new();

    for mut item in items {
        match identity::assign(&mut item) {
            Some(fp) => {
                // Last item wins the map slot; the displaced one still has
                // to land in a bucket, so it falls through to fuzzy matching
                if let Some(previous) = map.insert(fp, item) {
                    warn!(
                        "Duplicate fingerprint on {side} side for '{}'; \
                         routing the earlier item to fuzzy matching",
                        previous.name
                    );
                    unmatched.push(previous);
                }
            }
            None => unmatched.push(item),
        }
    }

    (map, unmatched)
}
