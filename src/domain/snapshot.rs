//! Wallet balance snapshots
//!
//! A snapshot maps an asset identifier (mint address) to the UI-denominated
//! quantity held by one wallet at one point in time.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Wrapped SOL mint, used as the key for the wallet's native SOL balance
pub const SOL_MINT: &str = "So11111111111111111111111111111111111111112";

/// Lamports per SOL
pub const LAMPORTS_PER_SOL: f64 = 1_000_000_000.0;

/// Point-in-time holdings of a single wallet.
///
/// Backed by a `BTreeMap` so iteration is ordered by asset identifier.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    balances: BTreeMap<String, f64>,
}

impl Snapshot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert, mostly for tests and fixtures
    pub fn with(mut self, asset: impl Into<String>, quantity: f64) -> Self {
        self.set(asset, quantity);
        self
    }

    /// Set the held quantity for an asset (negative values clamp to zero)
    pub fn set(&mut self, asset: impl Into<String>, quantity: f64) {
        self.balances.insert(asset.into(), quantity.max(0.0));
    }

    /// Add to the held quantity for an asset
    pub fn add(&mut self, asset: impl Into<String>, quantity: f64) {
        let entry = self.balances.entry(asset.into()).or_insert(0.0);
        *entry += quantity.max(0.0);
    }

    /// Quantity held, zero when the asset is absent
    pub fn get(&self, asset: &str) -> f64 {
        self.balances.get(asset).copied().unwrap_or(0.0)
    }

    pub fn contains(&self, asset: &str) -> bool {
        self.balances.contains_key(asset)
    }

    pub fn len(&self) -> usize {
        self.balances.len()
    }

    pub fn is_empty(&self) -> bool {
        self.balances.is_empty()
    }

    pub fn assets(&self) -> impl Iterator<Item = &String> {
        self.balances.keys()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &f64)> {
        self.balances.iter()
    }
}

impl FromIterator<(String, f64)> for Snapshot {
    fn from_iter<I: IntoIterator<Item = (String, f64)>>(iter: I) -> Self {
        let mut snapshot = Snapshot::new();
        for (asset, quantity) in iter {
            snapshot.set(asset, quantity);
        }
        snapshot
    }
}
