//! # vault-sync
//!
//! A command-line tool that reconciles two Bitwarden-compatible vaults and
//! reports what a synchronization *would* do, without applying anything.
//!
//! ## Overview
//!
//! `vault-sync` reads a full snapshot from a source vault and a destination
//! vault (via their respective `bw` CLIs), assigns each item a durable
//! identity, matches items across the two sides, and classifies every item
//! into a three-way plan: items to create, items to update, and items to
//! delete. Source content is authoritative; the destination is never
//! consulted for conflict resolution. The plan is strictly a dry run.
//!
//! ## How matching works
//!
//! - Each item gets a deterministic fingerprint (sha256 of its name,
//!   username, and first URI domain), persisted as a `sync_id` custom field
//!   so identity survives across runs and across stores.
//! - Items whose fingerprints appear on both sides are compared structurally
//!   after normalization strips store metadata and volatile fields.
//! - Items without a usable fingerprint fall back to fuzzy matching on
//!   `(name, first URI)`.
//! - Comparisons run in parallel on a bounded worker pool; phases join
//!   before the next one starts.

/// Configuration directory management and store connection settings
/// (TOML file plus `SRC_BW_*` / `DST_BW_*` environment overrides).
pub mod config;

/// Canonical-byte equality oracle built on the normalizer.
pub mod compare;

/// Fingerprint and fuzzy-key identity assignment, including the `sync_id`
/// custom field round-trip.
pub mod identity;

/// The vault item data model: structured record types with a catch-all for
/// store fields the planner does not interpret.
pub mod item;

/// Logging to console (RUST_LOG) and a rotating file in the config dir.
pub mod logger;

/// Two-phase matching: exact by fingerprint, then fuzzy over the leftovers.
pub mod matcher;

/// Deep structural normalization used only for equality comparison.
pub mod normalize;

/// The orchestrator: fetch, assign, match, compare, classify.
pub mod planner;

/// Plan rendering in console, JSON, and Markdown formats.
pub mod report;

/// Vault store collaborators: the `VaultStore` trait and the `bw` CLI
/// backend.
pub mod store;
