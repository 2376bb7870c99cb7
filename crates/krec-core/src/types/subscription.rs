//! One independently managed stream: a (pair, channel) with its book depth.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::Serialize;

use super::channel::Channel;

/// A (pair, channel) subscription.
///
/// Identity is `(pair, channel)`; `depth` only matters for [`Channel::Book`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Subscription {
    /// Feed pair name, e.g. `"BTC/USD"`.
    pub pair: String,
    pub channel: Channel,
    /// Order book depth (levels).
    pub depth: u32,
}

#[derive(Serialize)]
struct SubscribeRequest<'a> {
    event: &'static str,
    subscription: SubscriptionSpec,
    pair: [&'a str; 1],
}

#[derive(Serialize)]
struct SubscriptionSpec {
    name: Channel,
    #[serde(skip_serializing_if = "Option::is_none")]
    depth: Option<u32>,
}

impl Subscription {
    pub fn new(pair: impl Into<String>, channel: Channel, depth: u32) -> Self {
        Self { pair: pair.into(), channel, depth }
    }

    /// Build the subscribe request sent right after every (re)connect.
    ///
    /// `{"event":"subscribe","subscription":{"name":"book","depth":1000},"pair":["BTC/USD"]}`
    pub fn subscribe_request(&self) -> serde_json::Result<String> {
        let request = SubscribeRequest {
            event: "subscribe",
            subscription: SubscriptionSpec {
                name: self.channel,
                depth: self.channel.takes_depth().then_some(self.depth),
            },
            pair: [&self.pair],
        };
        serde_json::to_string(&request)
    }

    /// Output file name: `/` in the pair becomes `_`, e.g. `BTC_USD_book.jsonl`.
    pub fn file_name(&self) -> String {
        format!("{}_{}.jsonl", self.pair.replace('/', "_"), self.channel)
    }

    /// Output target for this subscription inside `output_folder`.
    pub fn output_path(&self, output_folder: &Path) -> PathBuf {
        output_folder.join(self.file_name())
    }
}

impl fmt::Display for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.pair, self.channel)
    }
}

/// Cross product of pairs × channels, pair-major.
pub fn cross_product(pairs: &[String], channels: &[Channel], depth: u32) -> Vec<Subscription> {
    let mut seen = std::collections::HashSet::new();
    pairs
        .iter()
        .flat_map(|pair| channels.iter().map(move |&channel| Subscription::new(pair.clone(), channel, depth)))
        .filter(|sub| seen.insert((sub.pair.clone(), sub.channel)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn book_request_carries_depth() {
        let sub = Subscription::new("BTC/USD", Channel::Book, 1000);
        assert_eq!(
            sub.subscribe_request().unwrap(),
            r#"{"event":"subscribe","subscription":{"name":"book","depth":1000},"pair":["BTC/USD"]}"#
        );
    }

    #[test]
    fn non_book_request_omits_depth() {
        let sub = Subscription::new("ETH/USD", Channel::Trade, 1000);
        assert_eq!(
            sub.subscribe_request().unwrap(),
            r#"{"event":"subscribe","subscription":{"name":"trade"},"pair":["ETH/USD"]}"#
        );
    }

    #[test]
    fn output_path_is_deterministic() {
        let dir = Path::new("/data/out");
        let sub = Subscription::new("BTC/USD", Channel::Book, 10);
        assert_eq!(sub.output_path(dir), PathBuf::from("/data/out/BTC_USD_book.jsonl"));
        assert_eq!(sub.output_path(dir), sub.clone().output_path(dir));

        // Depth is not part of the identity.
        let other_depth = Subscription::new("BTC/USD", Channel::Book, 25);
        assert_eq!(sub.output_path(dir), other_depth.output_path(dir));
    }

    #[test]
    fn file_name_handles_every_slash() {
        let sub = Subscription::new("A/B/C", Channel::Spread, 0);
        assert_eq!(sub.file_name(), "A_B_C_spread.jsonl");
    }

    #[test]
    fn cross_product_is_pair_major_and_unique() {
        let pairs = vec!["BTC/USD".to_string(), "ETH/USD".to_string(), "BTC/USD".to_string()];
        let subs = cross_product(&pairs, &[Channel::Book, Channel::Trade], 100);
        let ids: Vec<String> = subs.iter().map(|s| s.to_string()).collect();
        assert_eq!(ids, vec!["BTC/USD book", "BTC/USD trade", "ETH/USD book", "ETH/USD trade"]);
    }
}
