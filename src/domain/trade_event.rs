use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Direction of a parent trade, from the parent's perspective
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    /// Parent spent base currency and received the asset
    Acquired,
    /// Parent gave up the asset and received base currency
    Disposed,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Acquired => write!(f, "BUY"),
            Direction::Disposed => write!(f, "SELL"),
        }
    }
}

/// A classified parent trade, consumed once by the orchestrator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeEvent {
    /// Asset the parent bought or sold
    pub asset: String,
    pub direction: Direction,
    /// Size of the asset change (UI units for snapshots, raw units for swaps)
    pub magnitude: f64,
    /// Change in the parent's base currency, in SOL
    pub base_currency_delta: f64,
    /// Originating transaction, when known
    pub signature: Option<String>,
    pub detected_at: DateTime<Utc>,
}

impl TradeEvent {
    pub fn new(asset: impl Into<String>, direction: Direction, magnitude: f64, base_currency_delta: f64) -> Self {
        Self {
            asset: asset.into(),
            direction,
            magnitude,
            base_currency_delta,
            signature: None,
            detected_at: Utc::now(),
        }
    }

    pub fn acquired(asset: impl Into<String>, magnitude: f64, base_currency_delta: f64) -> Self {
        Self::new(asset, Direction::Acquired, magnitude, base_currency_delta)
    }

    pub fn disposed(asset: impl Into<String>, magnitude: f64, base_currency_delta: f64) -> Self {
        Self::new(asset, Direction::Disposed, magnitude, base_currency_delta)
    }

    pub fn with_signature(mut self, signature: impl Into<String>) -> Self {
        self.signature = Some(signature.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constructors() {
        let buy = TradeEvent::acquired("TOKEN", 100.0, -0.2);
        assert_eq!(buy.direction, Direction::Acquired);
        assert!(buy.signature.is_none());

        let sell = TradeEvent::disposed("TOKEN", -100.0, 0.3).with_signature("sig");
        assert_eq!(sell.direction, Direction::Disposed);
        assert_eq!(sell.signature.as_deref(), Some("sig"));
    }

    #[test]
    fn test_direction_display() {
        assert_eq!(Direction::Acquired.to_string(), "BUY");
        assert_eq!(Direction::Disposed.to_string(), "SELL");
    }
}
