//! Feed channel enumeration.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::KrecError;

/// Wildcard accepted wherever a channel or pair list is configured.
pub const WILDCARD: &str = "all";

// ---------------------------------------------------------------------------
// Channels
// ---------------------------------------------------------------------------

/// Public market data channels of the streaming feed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Channel {
    Book,
    Ohlc,
    Spread,
    Ticker,
    Trade,
}

impl Channel {
    /// Every concrete channel, in the order the wildcard expands to.
    pub const ALL: [Channel; 5] = [Self::Book, Self::Ohlc, Self::Spread, Self::Ticker, Self::Trade];

    /// Wire name used in subscribe requests and output file names.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Book => "book",
            Self::Ohlc => "ohlc",
            Self::Spread => "spread",
            Self::Ticker => "ticker",
            Self::Trade => "trade",
        }
    }

    /// Only order book subscriptions carry a depth.
    pub fn takes_depth(&self) -> bool {
        matches!(self, Self::Book)
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Channel {
    type Err = KrecError;

    /// Case-insensitive. The wildcard is not a channel; see [`expand_channels`].
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|c| c.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| KrecError::Config(format!("unknown channel '{s}'")))
    }
}

/// Expand a configured channel list into concrete channels.
///
/// Any occurrence of `"all"` yields [`Channel::ALL`]. Otherwise names are
/// parsed in order with duplicates removed, so each channel maps to at most
/// one subscription per pair.
pub fn expand_channels<S: AsRef<str>>(names: &[S]) -> Result<Vec<Channel>, KrecError> {
    if names.iter().any(|n| n.as_ref().trim().eq_ignore_ascii_case(WILDCARD)) {
        return Ok(Channel::ALL.to_vec());
    }

    let mut out = Vec::with_capacity(names.len());
    for name in names {
        let channel: Channel = name.as_ref().parse()?;
        if !out.contains(&channel) {
            out.push(channel);
        }
    }
    Ok(out)
}

/// `true` if the configured pair list asks for every tradable pair.
pub fn is_wildcard<S: AsRef<str>>(names: &[S]) -> bool {
    names.iter().any(|n| n.as_ref().trim().eq_ignore_ascii_case(WILDCARD))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_is_case_insensitive() {
        assert_eq!("book".parse::<Channel>().unwrap(), Channel::Book);
        assert_eq!("TRADE".parse::<Channel>().unwrap(), Channel::Trade);
        assert_eq!(" Ohlc ".parse::<Channel>().unwrap(), Channel::Ohlc);
    }

    #[test]
    fn unknown_channel_is_config_error() {
        assert!(matches!("candles".parse::<Channel>(), Err(KrecError::Config(_))));
        assert!("all".parse::<Channel>().is_err());
    }

    #[test]
    fn wildcard_expands_to_every_channel() {
        let channels = expand_channels(&["all"]).unwrap();
        assert_eq!(channels, vec![Channel::Book, Channel::Ohlc, Channel::Spread, Channel::Ticker, Channel::Trade]);

        // Wildcard wins even when mixed with explicit names.
        assert_eq!(expand_channels(&["book", "ALL"]).unwrap().len(), 5);
    }

    #[test]
    fn explicit_channels_keep_order_and_dedup() {
        let channels = expand_channels(&["trade", "book", "Trade"]).unwrap();
        assert_eq!(channels, vec![Channel::Trade, Channel::Book]);
    }

    #[test]
    fn only_book_takes_depth() {
        assert!(Channel::Book.takes_depth());
        assert!(Channel::ALL.iter().filter(|c| c.takes_depth()).count() == 1);
    }

    #[test]
    fn pair_wildcard_detection() {
        assert!(is_wildcard(&["BTC/USD", "all"]));
        assert!(!is_wildcard(&["BTC/USD", "ETH/USD"]));
    }
}
