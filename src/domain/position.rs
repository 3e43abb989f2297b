use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Follower holding opened by a copy-buy
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub asset: String,
    /// Quantity in the asset's smallest unit, sold back in full on close
    pub raw_quantity: u64,
    /// True when sized from a quote estimate rather than the executed fill
    pub approximate: bool,
    pub opened_at: DateTime<Utc>,
}

impl Position {
    pub fn new(asset: impl Into<String>, raw_quantity: u64, approximate: bool) -> Self {
        Self {
            asset: asset.into(),
            raw_quantity,
            approximate,
            opened_at: Utc::now(),
        }
    }
}

/// Lifecycle of one asset from the follower's point of view
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AssetState {
    /// Never bought
    Untouched,
    /// Bought and a position is open
    BoughtOpen,
    /// Bought before and no position is open; no further buys
    Closed,
}

#[derive(Debug, Error, PartialEq)]
pub enum PositionError {
    #[error("Position already open for {0}")]
    AlreadyOpen(String),
    #[error("No open position for {0}")]
    NotOpen(String),
    #[error("Invalid quantity for {0}: 0")]
    InvalidQuantity(String),
}

/// EverCopied set plus open positions for one monitored wallet.
///
/// `ever_copied` only grows. Each asset has at most one open position.
#[derive(Debug, Clone, Default)]
pub struct PositionTracker {
    ever_copied: HashSet<String>,
    open: HashMap<String, Position>,
}

impl PositionTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark an asset as copied. Returns false if it was already present.
    pub fn record_copied_asset(&mut self, asset: &str) -> bool {
        self.ever_copied.insert(asset.to_string())
    }

    pub fn has_copied(&self, asset: &str) -> bool {
        self.ever_copied.contains(asset)
    }

    pub fn open_position(
        &mut self,
        asset: &str,
        raw_quantity: u64,
        approximate: bool,
    ) -> Result<&Position, PositionError> {
        if raw_quantity == 0 {
            return Err(PositionError::InvalidQuantity(asset.to_string()));
        }
        if self.open.contains_key(asset) {
            return Err(PositionError::AlreadyOpen(asset.to_string()));
        }

        let position = self
            .open
            .entry(asset.to_string())
            .or_insert_with(|| Position::new(asset, raw_quantity, approximate));
        Ok(position)
    }

    pub fn close_position(&mut self, asset: &str) -> Result<Position, PositionError> {
        self.open
            .remove(asset)
            .ok_or_else(|| PositionError::NotOpen(asset.to_string()))
    }

    /// Raw quantity of the open position, if any
    pub fn get_position(&self, asset: &str) -> Option<u64> {
        self.open.get(asset).map(|p| p.raw_quantity)
    }

    pub fn position(&self, asset: &str) -> Option<&Position> {
        self.open.get(asset)
    }

    pub fn state(&self, asset: &str) -> AssetState {
        if self.open.contains_key(asset) {
            AssetState::BoughtOpen
        } else if self.ever_copied.contains(asset) {
            AssetState::Closed
        } else {
            AssetState::Untouched
        }
    }

    pub fn open_positions(&self) -> impl Iterator<Item = &Position> {
        self.open.values()
    }

    pub fn open_count(&self) -> usize {
        self.open.len()
    }

    pub fn copied_count(&self) -> usize {
        self.ever_copied.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TOKEN_X: &str = "TokenXxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxx";

    #[test]
    fn test_open_and_get() {
        let mut tracker = PositionTracker::new();
        let position = tracker.open_position(TOKEN_X, 5_000_000, false).unwrap();
        assert_eq!(position.raw_quantity, 5_000_000);
        assert!(!position.approximate);
        assert_eq!(tracker.get_position(TOKEN_X), Some(5_000_000));
        assert_eq!(tracker.open_count(), 1);
    }

    #[test]
    fn test_second_open_rejected() {
        let mut tracker = PositionTracker::new();
        tracker.open_position(TOKEN_X, 1, false).unwrap();
        let result = tracker.open_position(TOKEN_X, 2, false);
        assert_eq!(result.unwrap_err(), PositionError::AlreadyOpen(TOKEN_X.to_string()));
        assert_eq!(tracker.get_position(TOKEN_X), Some(1));
    }

    #[test]
    fn test_zero_quantity_rejected() {
        let mut tracker = PositionTracker::new();
        assert!(matches!(
            tracker.open_position(TOKEN_X, 0, true),
            Err(PositionError::InvalidQuantity(_))
        ));
        assert_eq!(tracker.open_count(), 0);
    }

    #[test]
    fn test_close_never_opened_is_error() {
        let mut tracker = PositionTracker::new();
        let result = tracker.close_position(TOKEN_X);
        assert_eq!(result.unwrap_err(), PositionError::NotOpen(TOKEN_X.to_string()));
    }

    #[test]
    fn test_close_returns_position() {
        let mut tracker = PositionTracker::new();
        tracker.open_position(TOKEN_X, 42, true).unwrap();
        let closed = tracker.close_position(TOKEN_X).unwrap();
        assert_eq!(closed.raw_quantity, 42);
        assert!(closed.approximate);
        assert!(tracker.get_position(TOKEN_X).is_none());
    }

    #[test]
    fn test_ever_copied_is_monotonic() {
        let mut tracker = PositionTracker::new();
        assert!(tracker.record_copied_asset(TOKEN_X));
        assert!(!tracker.record_copied_asset(TOKEN_X));
        tracker.open_position(TOKEN_X, 1, false).unwrap();
        tracker.close_position(TOKEN_X).unwrap();
        assert!(tracker.has_copied(TOKEN_X));
        assert_eq!(tracker.copied_count(), 1);
    }

    #[test]
    fn test_asset_state_lifecycle() {
        let mut tracker = PositionTracker::new();
        assert_eq!(tracker.state(TOKEN_X), AssetState::Untouched);

        tracker.record_copied_asset(TOKEN_X);
        tracker.open_position(TOKEN_X, 10, false).unwrap();
        assert_eq!(tracker.state(TOKEN_X), AssetState::BoughtOpen);

        tracker.close_position(TOKEN_X).unwrap();
        assert_eq!(tracker.state(TOKEN_X), AssetState::Closed);
    }
}
