use std::time::Duration;

use harvest_logging::harvest_debug;
use harvester_core::{Collection, ItemDetail, ItemSummary};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use url::Url;

use crate::{CatalogError, ContinuationToken, Page};

/// Remote media catalog. All calls are opaque async requests.
#[async_trait::async_trait]
pub trait CatalogSource: Send + Sync {
    async fn collections(&self, channel_id: &str) -> Result<Page<Collection>, CatalogError>;
    async fn collections_page(
        &self,
        token: &ContinuationToken,
    ) -> Result<Page<Collection>, CatalogError>;
    async fn items(&self, collection_id: &str) -> Result<Page<ItemSummary>, CatalogError>;
    async fn items_page(&self, token: &ContinuationToken)
        -> Result<Page<ItemSummary>, CatalogError>;
    async fn item_detail(&self, item_id: &str) -> Result<ItemDetail, CatalogError>;
}

#[derive(Debug, Clone)]
pub struct CatalogSettings {
    pub base_url: String,
    /// Forwarded as the `hl` query parameter.
    pub locale: String,
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
}

impl Default for CatalogSettings {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8787/v1".to_string(),
            locale: "en-US".to_string(),
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(30),
        }
    }
}

/// JSON-over-HTTP catalog adapter.
#[derive(Debug, Clone)]
pub struct HttpCatalog {
    base: Url,
    locale: String,
    client: reqwest::Client,
}

#[derive(Debug, Deserialize)]
#[serde(bound(deserialize = "T: Deserialize<'de>"))]
struct WirePage<T> {
    #[serde(default)]
    entries: Vec<T>,
    #[serde(default)]
    continuation: Option<String>,
}

#[derive(Debug, Deserialize)]
struct WireCollection {
    id: String,
    title: String,
    #[serde(default)]
    item_count: Option<u32>,
    #[serde(default)]
    item_count_text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct WireItem {
    id: String,
    title: String,
}

#[derive(Debug, Deserialize)]
struct WireItemDetail {
    id: String,
    #[serde(default)]
    description: Option<String>,
}

impl From<WireCollection> for Collection {
    fn from(wire: WireCollection) -> Self {
        let item_count = wire
            .item_count
            .or_else(|| wire.item_count_text.as_deref().and_then(first_number))
            .unwrap_or(0);
        Collection::new(wire.id, wire.title, item_count)
    }
}

impl From<WireItem> for ItemSummary {
    fn from(wire: WireItem) -> Self {
        ItemSummary::new(wire.id, wire.title)
    }
}

impl<W> WirePage<W> {
    fn into_page<T: From<W>>(self) -> Page<T> {
        let continuation = self
            .continuation
            .filter(|token| !token.is_empty())
            .map(ContinuationToken::new);
        Page::new(self.entries.into_iter().map(T::from).collect(), continuation)
    }
}

impl HttpCatalog {
    pub fn new(settings: CatalogSettings) -> Result<Self, CatalogError> {
        let base = Url::parse(&settings.base_url)
            .map_err(|err| CatalogError::InvalidUrl(format!("{}: {err}", settings.base_url)))?;
        if base.cannot_be_a_base() {
            return Err(CatalogError::InvalidUrl(settings.base_url));
        }
        let client = reqwest::Client::builder()
            .connect_timeout(settings.connect_timeout)
            .timeout(settings.request_timeout)
            .build()
            .map_err(|err| CatalogError::Network(err.to_string()))?;
        Ok(Self {
            base,
            locale: settings.locale,
            client,
        })
    }

    fn endpoint(&self, segments: &[&str], query: &[(&str, &str)]) -> Result<Url, CatalogError> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|_| CatalogError::InvalidUrl(self.base.to_string()))?
            .pop_if_empty()
            .extend(segments);
        {
            let mut pairs = url.query_pairs_mut();
            for (key, value) in query {
                pairs.append_pair(key, value);
            }
            pairs.append_pair("hl", &self.locale);
        }
        Ok(url)
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T, CatalogError> {
        harvest_debug!("Catalog GET {}", url);
        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(map_reqwest_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(CatalogError::HttpStatus {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        let body = response.bytes().await.map_err(map_reqwest_error)?;
        serde_json::from_slice(&body).map_err(|err| CatalogError::Decode(err.to_string()))
    }

    async fn continuation<T, W>(&self, token: &ContinuationToken) -> Result<Page<T>, CatalogError>
    where
        T: From<W>,
        W: DeserializeOwned,
    {
        let url = self.endpoint(&["pages"], &[("token", token.as_str())])?;
        let page: WirePage<W> = self.get_json(url).await?;
        Ok(page.into_page())
    }
}

#[async_trait::async_trait]
impl CatalogSource for HttpCatalog {
    async fn collections(&self, channel_id: &str) -> Result<Page<Collection>, CatalogError> {
        let url = self.endpoint(&["channels", channel_id, "collections"], &[])?;
        let page: WirePage<WireCollection> = self.get_json(url).await?;
        Ok(page.into_page())
    }

    async fn collections_page(
        &self,
        token: &ContinuationToken,
    ) -> Result<Page<Collection>, CatalogError> {
        self.continuation::<Collection, WireCollection>(token).await
    }

    async fn items(&self, collection_id: &str) -> Result<Page<ItemSummary>, CatalogError> {
        let url = self.endpoint(&["collections", collection_id, "items"], &[])?;
        let page: WirePage<WireItem> = self.get_json(url).await?;
        Ok(page.into_page())
    }

    async fn items_page(
        &self,
        token: &ContinuationToken,
    ) -> Result<Page<ItemSummary>, CatalogError> {
        self.continuation::<ItemSummary, WireItem>(token).await
    }

    async fn item_detail(&self, item_id: &str) -> Result<ItemDetail, CatalogError> {
        let url = self.endpoint(&["items", item_id], &[])?;
        let detail: WireItemDetail = self.get_json(url).await?;
        Ok(ItemDetail {
            id: detail.id,
            description: detail.description,
        })
    }
}

/// First run of ASCII digits, e.g. `"42 videos"` -> 42.
fn first_number(text: &str) -> Option<u32> {
    let start = text.find(|c: char| c.is_ascii_digit())?;
    let digits: String = text[start..]
        .chars()
        .take_while(|c| c.is_ascii_digit())
        .collect();
    digits.parse().ok()
}

fn map_reqwest_error(err: reqwest::Error) -> CatalogError {
    if err.is_timeout() {
        return CatalogError::Timeout(err.to_string());
    }
    CatalogError::Network(err.to_string())
}
