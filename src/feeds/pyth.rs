//! Pyth Hermes oracle adapter
//!
//! Fetches the latest signed XAU/USD price update and decodes the
//! mantissa/exponent pair into a floating price.

use reqwest::Client;
use serde::Deserialize;

use crate::error::FetchError;
use crate::feeds::{NormalizedQuote, QuoteSource};
use crate::types::Feed;
use async_trait::async_trait;

#[derive(Debug, Clone)]
pub struct PythSource {
    client: Client,
    base_url: String,
    feed_id: String,
}

#[derive(Debug, Deserialize)]
struct LatestPriceResponse {
    #[serde(default)]
    parsed: Vec<ParsedUpdate>,
}

#[derive(Debug, Deserialize)]
struct ParsedUpdate {
    price: Option<PriceField>,
}

#[derive(Debug, Deserialize)]
struct PriceField {
    /// Mantissa, serialized as a decimal string
    price: String,
    /// Power-of-ten exponent
    expo: i32,
    /// Publish time in unix seconds
    publish_time: i64,
}

impl PythSource {
    pub fn new(client: Client, base_url: impl Into<String>, feed_id: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
            feed_id: feed_id.into(),
        }
    }
}

#[async_trait]
impl QuoteSource for PythSource {
    fn feed(&self) -> Feed {
        Feed::Pyth
    }

    async fn fetch_quote(&self) -> Result<NormalizedQuote, FetchError> {
        let url = format!(
            "{}/v2/updates/price/latest?ids[]={}",
            self.base_url, self.feed_id
        );
        let response = self.client.get(&url).send().await?;
        if !response.status().is_success() {
            return Err(FetchError::Http(response.status().as_u16()));
        }

        let body: LatestPriceResponse = response.json().await?;
        let price_field = body
            .parsed
            .into_iter()
            .next()
            .and_then(|u| u.price)
            .ok_or_else(|| FetchError::InvalidResponse("missing parsed price object".into()))?;

        let mantissa: f64 = price_field
            .price
            .parse()
            .map_err(|_| FetchError::InvalidResponse("price mantissa not numeric".into()))?;
        let price = mantissa * 10f64.powi(price_field.expo);
        if !price.is_finite() {
            return Err(FetchError::NonFinite(format!(
                "decoded oracle price {} * 10^{}",
                price_field.price, price_field.expo
            )));
        }

        Ok(NormalizedQuote {
            mid: price,
            publish_time_ms: Some(price_field.publish_time * 1_000),
            funding_rate: None,
            next_funding_time_ms: None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_mantissa_exponent() {
        let body: LatestPriceResponse = serde_json::from_str(
            r#"{"parsed":[{"price":{"price":"265012000000","expo":-8,"publish_time":1714000000}}]}"#,
        )
        .unwrap();
        let field = body.parsed[0].price.as_ref().unwrap();
        let mantissa: f64 = field.price.parse().unwrap();
        let price = mantissa * 10f64.powi(field.expo);
        assert!((price - 2650.12).abs() < 1e-9);
        assert_eq!(field.publish_time * 1_000, 1_714_000_000_000);
    }

    #[test]
    fn test_missing_price_object_is_invalid() {
        let body: LatestPriceResponse = serde_json::from_str(r#"{"parsed":[{}]}"#).unwrap();
        assert!(body.parsed[0].price.is_none());
    }
}
