//! Hyperliquid perp-DEX adapter
//!
//! Two-step lookup: list the builder-deployed perp dexs and select the
//! configured one (case-insensitive, falling back to the configured name
//! verbatim), then request all mids scoped to that dex and pick the gold
//! instrument out of the keyed response.

use reqwest::Client;
use serde_json::{json, Value};
use std::collections::BTreeMap;

use crate::error::FetchError;
use crate::feeds::{NormalizedQuote, QuoteSource};
use crate::types::Feed;
use async_trait::async_trait;

/// Keys tried in order before falling back to a substring scan
const CANDIDATE_KEYS: [&str; 3] = ["GOLD", "flx:GOLD", "GOLD-USDC"];
const INSTRUMENT_SUBSTRING: &str = "GOLD";
/// Cap on keys echoed back in a NotFound error
const MAX_DIAGNOSTIC_KEYS: usize = 8;

#[derive(Debug, Clone)]
pub struct HyperliquidSource {
    client: Client,
    info_url: String,
    dex: String,
}

impl HyperliquidSource {
    pub fn new(client: Client, info_url: impl Into<String>, dex: impl Into<String>) -> Self {
        Self {
            client,
            info_url: info_url.into(),
            dex: dex.into(),
        }
    }

    async fn post_info(&self, body: Value) -> Result<Value, FetchError> {
        let response = self.client.post(&self.info_url).json(&body).send().await?;
        if !response.status().is_success() {
            return Err(FetchError::Http(response.status().as_u16()));
        }
        Ok(response.json().await?)
    }

    /// Pick the listed dex whose name matches ours case-insensitively,
    /// defaulting to the configured name when absent
    fn select_dex(&self, dexs: &Value) -> String {
        dexs.as_array()
            .into_iter()
            .flatten()
            .filter_map(|d| d.get("name").and_then(Value::as_str))
            .find(|name| name.eq_ignore_ascii_case(&self.dex))
            .unwrap_or(&self.dex)
            .to_string()
    }
}

/// Extract the gold mid from the keyed mids map.
///
/// Tries the exact candidate keys first, then any key containing the
/// instrument abbreviation. Mids arrive as price strings.
fn extract_gold_mid(mids: &BTreeMap<String, String>) -> Result<f64, FetchError> {
    let candidates = CANDIDATE_KEYS.iter().filter_map(|k| mids.get(*k)).chain(
        mids.iter()
            .filter(|(k, _)| k.to_uppercase().contains(INSTRUMENT_SUBSTRING))
            .map(|(_, v)| v),
    );

    let mid = candidates
        .filter_map(|s| s.parse::<f64>().ok())
        .find(|m| m.is_finite());
    match mid {
        Some(mid) => Ok(mid),
        None => {
            let mut keys: Vec<&str> = mids.keys().map(String::as_str).collect();
            keys.truncate(MAX_DIAGNOSTIC_KEYS);
            Err(FetchError::NotFound(format!(
                "no gold mid among keys [{}]",
                keys.join(", ")
            )))
        }
    }
}

#[async_trait]
impl QuoteSource for HyperliquidSource {
    fn feed(&self) -> Feed {
        Feed::Hyperliquid
    }

    async fn fetch_quote(&self) -> Result<NormalizedQuote, FetchError> {
        let dexs = self.post_info(json!({"type": "perpDexs"})).await?;
        let dex = self.select_dex(&dexs);

        let mids_value = self
            .post_info(json!({"type": "allMids", "dex": dex}))
            .await?;
        let mids: BTreeMap<String, String> = serde_json::from_value(mids_value)
            .map_err(|_| FetchError::InvalidResponse("allMids is not a string map".into()))?;

        let mid = extract_gold_mid(&mids)?;
        Ok(NormalizedQuote::mid_only(mid))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mids(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_exact_candidate_key_wins() {
        let m = mids(&[("GOLD", "2651.0"), ("SILVER", "31.2")]);
        assert_eq!(extract_gold_mid(&m).unwrap(), 2651.0);
    }

    #[test]
    fn test_prefixed_candidate_key() {
        let m = mids(&[("flx:GOLD", "2652.25")]);
        assert_eq!(extract_gold_mid(&m).unwrap(), 2652.25);
    }

    #[test]
    fn test_substring_fallback_case_insensitive() {
        let m = mids(&[("xGoldPerp", "2649.5"), ("SILVER", "31.2")]);
        assert_eq!(extract_gold_mid(&m).unwrap(), 2649.5);
    }

    #[test]
    fn test_not_found_lists_available_keys() {
        let m = mids(&[("SILVER", "31.2"), ("COPPER", "4.5")]);
        let err = extract_gold_mid(&m).unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("SILVER"));
        assert!(msg.contains("COPPER"));
    }

    #[test]
    fn test_non_numeric_mid_is_not_found() {
        let m = mids(&[("GOLD", "n/a")]);
        assert!(matches!(
            extract_gold_mid(&m),
            Err(FetchError::NotFound(_))
        ));
    }
}
