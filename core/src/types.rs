//! Typed records decoded from API responses.
//!
//! # Design
//! Records are plain serde structs: unknown fields are ignored and a missing
//! required field fails decoding. Optional numeric and flag fields are
//! `Option` because the API leaves them out for some assets.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// A tradable asset as listed by `/assets`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Asset {
    /// Ticker the asset was listed under, when the listing is keyed by ticker.
    #[serde(skip)]
    pub ticker: Option<String>,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub can_deposit: Option<bool>,
    #[serde(default)]
    pub can_withdraw: Option<bool>,
    #[serde(default)]
    pub maker_fee: Option<f64>,
    #[serde(default)]
    pub taker_fee: Option<f64>,
    #[serde(default)]
    pub min_withdraw: Option<f64>,
    #[serde(default)]
    pub max_withdraw: Option<f64>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum AssetsListing {
    ByTicker(BTreeMap<String, Asset>),
    List(Vec<Asset>),
}

/// Assets decoded from an `/assets` listing, which is either an object keyed
/// by ticker or a plain array.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(from = "AssetsListing")]
pub struct AssetsCollection {
    items: Vec<Asset>,
}

impl From<AssetsListing> for AssetsCollection {
    fn from(listing: AssetsListing) -> Self {
        let items = match listing {
            AssetsListing::ByTicker(by_ticker) => by_ticker
                .into_iter()
                .map(|(ticker, mut asset)| {
                    asset.ticker = Some(ticker);
                    asset
                })
                .collect(),
            AssetsListing::List(items) => items,
        };
        Self { items }
    }
}

impl AssetsCollection {
    pub fn items(&self) -> &[Asset] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Looks an asset up by ticker (case-insensitive), falling back to name.
    pub fn get(&self, ticker: &str) -> Option<&Asset> {
        self.items
            .iter()
            .find(|a| matches!(a.ticker.as_deref(), Some(t) if t.eq_ignore_ascii_case(ticker)))
            .or_else(|| self.items.iter().find(|a| a.name.eq_ignore_ascii_case(ticker)))
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Asset> {
        self.items.iter()
    }
}

impl IntoIterator for AssetsCollection {
    type Item = Asset;
    type IntoIter = std::vec::IntoIter<Asset>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.into_iter()
    }
}

impl<'a> IntoIterator for &'a AssetsCollection {
    type Item = &'a Asset;
    type IntoIter = std::slice::Iter<'a, Asset>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn asset_ignores_unknown_fields() {
        let asset: Asset = serde_json::from_str(
            r#"{"name":"Bitcoin","description":"BTC","maker_fee":0.1,"listed":true}"#,
        )
        .unwrap();
        assert_eq!(asset.name, "Bitcoin");
        assert_eq!(asset.maker_fee, Some(0.1));
        assert_eq!(asset.taker_fee, None);
        assert_eq!(asset.ticker, None);
    }

    #[test]
    fn asset_requires_name() {
        let result: Result<Asset, _> = serde_json::from_str(r#"{"description":"no name"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn collection_from_keyed_object_keeps_tickers() {
        let assets: AssetsCollection = serde_json::from_str(
            r#"{"ETH":{"name":"Ethereum"},"BTC":{"name":"Bitcoin","can_deposit":true}}"#,
        )
        .unwrap();
        assert_eq!(assets.len(), 2);
        let btc = assets.get("btc").unwrap();
        assert_eq!(btc.ticker.as_deref(), Some("BTC"));
        assert_eq!(btc.can_deposit, Some(true));
    }

    #[test]
    fn collection_from_array() {
        let assets: AssetsCollection =
            serde_json::from_str(r#"[{"name":"Bitcoin"},{"name":"Litecoin"}]"#).unwrap();
        let names: Vec<_> = assets.iter().map(|a| a.name.as_str()).collect();
        assert_eq!(names, vec!["Bitcoin", "Litecoin"]);
        assert_eq!(assets.get("litecoin").map(|a| a.name.as_str()), Some("Litecoin"));
    }

    #[test]
    fn collection_rejects_other_shapes() {
        assert!(serde_json::from_str::<AssetsCollection>(r#""assets""#).is_err());
        assert!(serde_json::from_str::<AssetsCollection>(r#"[{"description":"x"}]"#).is_err());
    }

    #[test]
    fn empty_listing_is_empty() {
        let assets: AssetsCollection = serde_json::from_str("{}").unwrap();
        assert!(assets.is_empty());
        assert_eq!(assets.into_iter().count(), 0);
    }
}
