//! JSON-over-HTTP back office client.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tally_core::validation::validate_discount_value;
use tally_core::{Customer, DiscountDescriptor, DiscountValue, Variant};
use tracing::{debug, warn};

use super::{BackOffice, CheckoutPayload, CheckoutReceipt, ProductDiscount, UpstreamError};

/// Configuration for reaching the back office.
#[derive(Debug, Clone)]
pub struct BackOfficeConfig {
    /// Base URL, e.g. `"http://localhost:8080"`.
    pub base_url: String,

    /// Per-request timeout.
    pub timeout: Duration,
}

/// HTTP client for the back office REST endpoints.
#[derive(Debug, Clone)]
pub struct HttpBackOffice {
    config: BackOfficeConfig,
    http: Client,
}

impl HttpBackOffice {
    /// Create a new client from the given configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the TLS backend cannot be initialised.
    pub fn new(config: BackOfficeConfig) -> Result<Self, UpstreamError> {
        let http = Client::builder().timeout(config.timeout).build()?;
        Ok(Self { config, http })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/api/{}", self.config.base_url.trim_end_matches('/'), path)
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, UpstreamError> {
        let url = self.url(path);
        debug!(url = %url, "GET");

        let response = self.http.get(&url).send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();

            return Err(UpstreamError::UnexpectedResponse(format!(
                "GET {path} failed with status {status}: {text}"
            )));
        }

        Ok(response.json().await?)
    }
}

#[async_trait]
impl BackOffice for HttpBackOffice {
    async fn fetch_variants(&self) -> Result<Vec<Variant>, UpstreamError> {
        let records: Vec<VariantRecord> = self.get_json("variants").await?;
        Ok(records.into_iter().map(Variant::from).collect())
    }

    async fn fetch_customers(&self) -> Result<Vec<Customer>, UpstreamError> {
        self.get_json("customers").await
    }

    async fn fetch_discount_links(&self) -> Result<Vec<ProductDiscount>, UpstreamError> {
        let records: Vec<DiscountLinkRecord> = self.get_json("product-discounts").await?;

        Ok(records
            .into_iter()
            .filter_map(|record| {
                let product_id = record.product_id.clone();
                match record.into_product_discount() {
                    Ok(link) => Some(link),
                    Err(reason) => {
                        warn!(product_id = %product_id, reason = %reason, "Skipping discount link");
                        None
                    }
                }
            })
            .collect())
    }

    async fn submit_checkout(
        &self,
        payload: &CheckoutPayload,
    ) -> Result<CheckoutReceipt, UpstreamError> {
        let url = self.url("sales");
        debug!(url = %url, lines = payload.lines.len(), total = %payload.final_total, "POST checkout");

        let response = self.http.post(&url).json(payload).send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();

            return Err(UpstreamError::UnexpectedResponse(format!(
                "checkout failed with status {status}: {text}"
            )));
        }

        Ok(response.json().await?)
    }
}

// =============================================================================
// Wire Records
// =============================================================================

/// Variant as the inventory service sends it. Prices are minor units.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VariantRecord {
    variant_id: String,
    sku: String,
    #[serde(default)]
    barcode: Option<String>,
    product_id: String,
    product_name: String,
    #[serde(default)]
    brand: Option<String>,
    #[serde(default)]
    category: Option<String>,
    selling_price: i64,
    #[serde(default)]
    cost_price: Option<i64>,
    quantity: i64,
    #[serde(default)]
    threshold: i64,
    taxable: bool,
    #[serde(default)]
    images: Vec<String>,
}

impl From<VariantRecord> for Variant {
    fn from(r: VariantRecord) -> Self {
        Variant {
            variant_id: r.variant_id,
            sku: r.sku,
            barcode: r.barcode.filter(|b| !b.trim().is_empty()),
            product_id: r.product_id,
            product_name: r.product_name,
            brand: r.brand,
            category: r.category,
            selling_price_cents: r.selling_price,
            cost_price_cents: r.cost_price,
            quantity: r.quantity,
            threshold: r.threshold,
            taxable: r.taxable,
            images: r.images,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "lowercase")]
enum DiscountKind {
    Percentage,
    Fixed,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DiscountRecord {
    id: String,
    name: String,
    #[serde(rename = "type")]
    kind: DiscountKind,
    /// Percent (0-100) or fixed amount in minor units.
    value: f64,
    start_date: DateTime<Utc>,
    end_date: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DiscountLinkRecord {
    product_id: String,
    discount: DiscountRecord,
}

impl DiscountLinkRecord {
    fn into_product_discount(self) -> Result<ProductDiscount, String> {
        let d = self.discount;
        if !d.value.is_finite() || d.value < 0.0 {
            return Err(format!("discount {} has value {}", d.id, d.value));
        }

        let value = match d.kind {
            DiscountKind::Percentage => DiscountValue::percentage_bps((d.value * 100.0).round() as u32),
            DiscountKind::Fixed => DiscountValue::fixed_cents(d.value.round() as i64),
        };
        validate_discount_value(&value).map_err(|e| e.to_string())?;

        Ok(ProductDiscount {
            product_id: self.product_id,
            discount: DiscountDescriptor {
                id: d.id,
                name: d.name,
                value,
                starts_at: d.start_date,
                ends_at: d.end_date,
            },
        })
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    /// Serves one canned HTTP response and returns the base URL.
    async fn serve_once(status: &'static str, body: &'static str) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = vec![0u8; 8192];
            let _ = socket.read(&mut buf).await;
            let response = format!(
                "HTTP/1.1 {}\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{}",
                status,
                body.len(),
                body
            );
            socket.write_all(response.as_bytes()).await.unwrap();
            socket.shutdown().await.ok();
        });

        format!("http://{}", addr)
    }

    fn client(base_url: String) -> HttpBackOffice {
        HttpBackOffice::new(BackOfficeConfig {
            base_url,
            timeout: Duration::from_secs(5),
        })
        .unwrap()
    }

    #[test]
    fn test_url_trims_trailing_slash() {
        let backoffice = client("http://shop.local/".into());
        assert_eq!(backoffice.url("variants"), "http://shop.local/api/variants");
    }

    #[tokio::test]
    async fn test_fetch_variants_maps_wire_record() {
        let base = serve_once(
            "200 OK",
            r#"[{"variantId":"v-1","sku":"TEA","barcode":"","productId":"p-1",
                "productName":"Green Tea","sellingPrice":1000,"quantity":5,
                "threshold":2,"taxable":true,"images":["tea.png"]}]"#,
        )
        .await;

        let variants = client(base).fetch_variants().await.unwrap();
        assert_eq!(variants.len(), 1);
        assert_eq!(variants[0].selling_price_cents, 1000);
        assert_eq!(variants[0].barcode, None);
        assert_eq!(variants[0].images, vec!["tea.png".to_string()]);
    }

    #[tokio::test]
    async fn test_error_status_is_unexpected_response() {
        let base = serve_once("503 Service Unavailable", r#"{"error":"down"}"#).await;

        let err = client(base).fetch_customers().await.unwrap_err();
        match err {
            UpstreamError::UnexpectedResponse(msg) => assert!(msg.contains("503")),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_invalid_discount_links_are_skipped() {
        let base = serve_once(
            "200 OK",
            r#"[
              {"productId":"p-1","discount":{"id":"d-1","name":"Tea week","type":"percentage",
               "value":10,"startDate":"2026-01-01T00:00:00Z","endDate":"2026-12-31T00:00:00Z"}},
              {"productId":"p-2","discount":{"id":"d-2","name":"Broken","type":"percentage",
               "value":150,"startDate":"2026-01-01T00:00:00Z","endDate":"2026-12-31T00:00:00Z"}}
            ]"#,
        )
        .await;

        let links = client(base).fetch_discount_links().await.unwrap();
        assert_eq!(links.len(), 1);
        assert_eq!(links[0].product_id, "p-1");
        assert_eq!(links[0].discount.value, DiscountValue::percentage_bps(1000));
    }

    #[tokio::test]
    async fn test_unreachable_back_office_is_http_error() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let err = client(format!("http://{}", addr))
            .fetch_variants()
            .await
            .unwrap_err();
        assert!(matches!(err, UpstreamError::Http(_)));
    }
}
