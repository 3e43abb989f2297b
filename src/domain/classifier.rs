//! Delta Classifier
//!
//! Compares two snapshots of the parent wallet and reports at most one
//! trade event. Only a single event is produced per comparison; a batched
//! transaction touching several assets reports the first qualifying asset
//! (smallest identifier) and ignores the rest.

use serde::{Deserialize, Serialize};

use super::snapshot::{Snapshot, SOL_MINT};
use super::trade_event::TradeEvent;

/// Gates applied when classifying a snapshot delta
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassifierConfig {
    /// Base currency asset (native SOL)
    pub base_asset: String,
    /// Minimum |base currency change| for a trade to count, in SOL
    pub min_base_delta: f64,
    /// Per-asset changes smaller than this are treated as noise
    pub change_threshold: f64,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            base_asset: SOL_MINT.to_string(),
            min_base_delta: 0.1,
            change_threshold: 0.0001,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct DeltaClassifier {
    config: ClassifierConfig,
}

impl DeltaClassifier {
    pub fn new(config: ClassifierConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ClassifierConfig {
        &self.config
    }

    /// Classify the change between two snapshots
    pub fn classify(&self, prev: &Snapshot, curr: &Snapshot) -> Option<TradeEvent> {
        classify_with_base(
            prev,
            curr,
            &self.config.base_asset,
            self.config.min_base_delta,
            self.config.change_threshold,
        )
    }
}

/// Classify using native SOL as the base currency
pub fn classify(
    prev: &Snapshot,
    curr: &Snapshot,
    min_base_delta: f64,
    change_threshold: f64,
) -> Option<TradeEvent> {
    classify_with_base(prev, curr, SOL_MINT, min_base_delta, change_threshold)
}

/// Classify against an arbitrary base asset
pub fn classify_with_base(
    prev: &Snapshot,
    curr: &Snapshot,
    base_asset: &str,
    min_base_delta: f64,
    change_threshold: f64,
) -> Option<TradeEvent> {
    // Ascending asset order makes "first match" deterministic
    let mut assets: Vec<&String> = prev.assets().chain(curr.assets()).collect();
    assets.sort();
    assets.dedup();

    let changes: Vec<(&String, f64)> = assets
        .into_iter()
        .map(|asset| (asset, curr.get(asset) - prev.get(asset)))
        .filter(|(_, diff)| diff.abs() >= change_threshold)
        .collect();

    let base_delta = curr.get(base_asset) - prev.get(base_asset);
    if base_delta.abs() < min_base_delta {
        return None;
    }

    let mut non_base = changes.iter().filter(|(asset, _)| asset.as_str() != base_asset);

    if base_delta < 0.0 {
        non_base
            .find(|(_, diff)| *diff > 0.0)
            .map(|(asset, diff)| TradeEvent::acquired(asset.as_str(), *diff, base_delta))
    } else if base_delta > 0.0 {
        non_base
            .find(|(_, diff)| *diff < 0.0)
            .map(|(asset, diff)| TradeEvent::disposed(asset.as_str(), *diff, base_delta))
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::trade_event::Direction;
    use approx::assert_relative_eq;

    const TOKEN_X: &str = "TokenXxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxx";
    const TOKEN_Y: &str = "TokenYyyyyyyyyyyyyyyyyyyyyyyyyyyyyyyyyyyyyy";

    #[test]
    fn test_parent_buy_detected() {
        let prev = Snapshot::new().with(SOL_MINT, 10.0);
        let curr = Snapshot::new().with(SOL_MINT, 9.8).with(TOKEN_X, 100.0);

        let event = classify(&prev, &curr, 0.1, 0.0001).unwrap();
        assert_eq!(event.asset, TOKEN_X);
        assert_eq!(event.direction, Direction::Acquired);
        assert_relative_eq!(event.magnitude, 100.0);
        assert_relative_eq!(event.base_currency_delta, -0.2, epsilon = 1e-9);
    }

    #[test]
    fn test_small_base_delta_rejected() {
        let prev = Snapshot::new().with(SOL_MINT, 10.0);
        let curr = Snapshot::new().with(SOL_MINT, 9.8).with(TOKEN_X, 100.0);

        assert!(classify(&prev, &curr, 0.5, 0.0001).is_none());
    }

    #[test]
    fn test_parent_sell_detected() {
        let prev = Snapshot::new().with(SOL_MINT, 5.0).with(TOKEN_X, 100.0);
        let curr = Snapshot::new().with(SOL_MINT, 6.0);

        let event = classify(&prev, &curr, 0.1, 0.0001).unwrap();
        assert_eq!(event.asset, TOKEN_X);
        assert_eq!(event.direction, Direction::Disposed);
        assert_relative_eq!(event.magnitude, -100.0);
        assert_relative_eq!(event.base_currency_delta, 1.0, epsilon = 1e-9);
    }

    #[test]
    fn test_identical_snapshots_yield_nothing() {
        let snapshot = Snapshot::new().with(SOL_MINT, 3.0).with(TOKEN_X, 7.0);
        assert!(classify(&snapshot, &snapshot, 0.1, 0.0001).is_none());
        assert!(classify(&snapshot, &snapshot, 0.0, 0.0).is_none());
    }

    #[test]
    fn test_dust_change_is_ignored() {
        let prev = Snapshot::new().with(SOL_MINT, 10.0).with(TOKEN_X, 50.0);
        let curr = Snapshot::new().with(SOL_MINT, 9.0).with(TOKEN_X, 50.00005);

        // SOL left the wallet but the only token movement is below the threshold
        assert!(classify(&prev, &curr, 0.1, 0.0001).is_none());
    }

    #[test]
    fn test_direction_must_oppose_base_flow() {
        // SOL went down and the token also went down: not a buy
        let prev = Snapshot::new().with(SOL_MINT, 10.0).with(TOKEN_X, 50.0);
        let curr = Snapshot::new().with(SOL_MINT, 9.0).with(TOKEN_X, 40.0);
        assert!(classify(&prev, &curr, 0.1, 0.0001).is_none());
    }

    #[test]
    fn test_tie_break_is_smallest_identifier() {
        let prev = Snapshot::new().with(SOL_MINT, 10.0);
        let curr = Snapshot::new()
            .with(SOL_MINT, 8.0)
            .with(TOKEN_Y, 5.0)
            .with(TOKEN_X, 5.0);

        let event = classify(&prev, &curr, 0.1, 0.0001).unwrap();
        assert_eq!(event.asset, TOKEN_X);
    }

    #[test]
    fn test_custom_base_asset() {
        let usdc = "EPjFWdd5AufqSSqeM2qN1xzybapC8G4wEGGkZwyTDt1v";
        let classifier = DeltaClassifier::new(ClassifierConfig {
            base_asset: usdc.to_string(),
            min_base_delta: 1.0,
            change_threshold: 0.0001,
        });

        let prev = Snapshot::new().with(usdc, 100.0);
        let curr = Snapshot::new().with(usdc, 50.0).with(TOKEN_X, 10.0);

        let event = classifier.classify(&prev, &curr).unwrap();
        assert_eq!(event.asset, TOKEN_X);
        assert_eq!(event.direction, Direction::Acquired);
    }

    #[test]
    fn test_default_classifier_uses_sol() {
        let classifier = DeltaClassifier::default();
        let prev = Snapshot::new().with(SOL_MINT, 10.0);
        let curr = Snapshot::new().with(SOL_MINT, 9.0).with(TOKEN_X, 1.0);
        assert!(classifier.classify(&prev, &curr).is_some());
    }
}
