//! Core types used throughout GoldBasis
//!
//! Defines the tracked feed set, status classifications and display units.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Tracked price feeds (the oracle plus each venue)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Feed {
    /// Pyth oracle (reference price)
    Pyth,
    /// Binance XAUUSDT perpetual futures
    BinanceFutures,
    /// Binance USDCUSDT spot (FX conversion only, not basis)
    BinanceSpot,
    /// Hyperliquid builder-deployed perp DEX
    Hyperliquid,
    /// Meteora DLMM liquidity pool
    Meteora,
}

impl Feed {
    /// All feeds, in the order they appear in the diagnostics table
    pub const ALL: [Feed; 5] = [
        Feed::Pyth,
        Feed::BinanceFutures,
        Feed::BinanceSpot,
        Feed::Hyperliquid,
        Feed::Meteora,
    ];

    /// Venues whose basis against the oracle is tracked
    pub const BASIS_VENUES: [Feed; 3] = [Feed::BinanceFutures, Feed::Hyperliquid, Feed::Meteora];

    /// Short uppercase label used as the error prefix and log field
    pub fn label(&self) -> &'static str {
        match self {
            Feed::Pyth => "PYTH",
            Feed::BinanceFutures => "BINANCE FUT",
            Feed::BinanceSpot => "BINANCE SPOT",
            Feed::Hyperliquid => "HL",
            Feed::Meteora => "METEORA",
        }
    }

    /// True for the reference oracle feed
    pub fn is_oracle(&self) -> bool {
        matches!(self, Feed::Pyth)
    }
}

impl std::str::FromStr for Feed {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "PYTH" => Ok(Feed::Pyth),
            "BINANCE_FUTURES" | "BINANCE FUT" => Ok(Feed::BinanceFutures),
            "BINANCE_SPOT" | "BINANCE SPOT" => Ok(Feed::BinanceSpot),
            "HYPERLIQUID" | "HL" => Ok(Feed::Hyperliquid),
            "METEORA" => Ok(Feed::Meteora),
            other => Err(format!("unknown feed: {}", other)),
        }
    }
}

impl fmt::Display for Feed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Freshness classification of a single feed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum FeedStatus {
    /// Last success within the staleness threshold
    Ok,
    /// Has a last-known value but it aged past the threshold
    Stale,
    /// Never produced a value, or currently erroring
    Err,
}

/// Aggregate engine status consumed by renderers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum AggregateStatus {
    /// Oracle and every venue fresh
    Live,
    /// Oracle fresh, at least one venue stale or failing
    Partial,
    /// Oracle has a last-known value but it is stale
    Stale,
    /// Oracle never produced a value
    Error,
    /// Polling suspended by the user
    Paused,
}

impl fmt::Display for AggregateStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            AggregateStatus::Live => "LIVE",
            AggregateStatus::Partial => "PARTIAL",
            AggregateStatus::Stale => "STALE",
            AggregateStatus::Error => "ERROR",
            AggregateStatus::Paused => "PAUSED",
        };
        write!(f, "{}", s)
    }
}

/// Chart display unit for basis series
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DisplayUnit {
    /// Absolute USD deviation
    Usd,
    /// Basis points
    Bps,
}

impl Default for DisplayUnit {
    fn default() -> Self {
        DisplayUnit::Usd
    }
}

impl std::str::FromStr for DisplayUnit {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "usd" => Ok(DisplayUnit::Usd),
            "bps" => Ok(DisplayUnit::Bps),
            other => Err(format!("unknown display unit: {}", other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_feed_parse_roundtrip() {
        for feed in Feed::ALL {
            assert_eq!(feed.label().parse::<Feed>().ok(), Some(feed));
        }
        assert!("SILVER".parse::<Feed>().is_err());
    }

    #[test]
    fn test_display_unit_parse() {
        assert_eq!("usd".parse::<DisplayUnit>(), Ok(DisplayUnit::Usd));
        assert_eq!("BPS".parse::<DisplayUnit>(), Ok(DisplayUnit::Bps));
        assert!("pct".parse::<DisplayUnit>().is_err());
    }

    #[test]
    fn test_basis_venues_exclude_oracle_and_spot() {
        assert!(!Feed::BASIS_VENUES.contains(&Feed::Pyth));
        assert!(!Feed::BASIS_VENUES.contains(&Feed::BinanceSpot));
    }
}
