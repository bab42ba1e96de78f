use crate::adapters::{check_status, join_url};
use crate::config::toml_config::{GoogleSearchConfig, Secret};
use crate::domain::model::{SearchQuery, SearchResult};
use crate::domain::ports::ValveSearcher;
use crate::utils::error::Result;
use crate::utils::validation::validate_required_field;
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

pub const PROVIDER: &str = "Google Custom Search";

#[derive(Debug, Deserialize)]
struct SearchResponse {
    items: Option<Vec<SearchItem>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SearchItem {
    #[serde(default)]
    title: String,
    #[serde(default)]
    link: String,
    #[serde(default)]
    snippet: String,
    #[serde(default)]
    display_link: String,
    pagemap: Option<PageMap>,
}

#[derive(Debug, Deserialize)]
struct PageMap {
    #[serde(default)]
    cse_image: Vec<CseImage>,
}

#[derive(Debug, Deserialize)]
struct CseImage {
    src: Option<String>,
}

impl From<SearchItem> for SearchResult {
    fn from(item: SearchItem) -> Self {
        let image = item
            .pagemap
            .and_then(|p| p.cse_image.into_iter().next())
            .and_then(|img| img.src)
            .filter(|src| !src.is_empty());

        Self {
            title: item.title,
            link: item.link,
            snippet: item.snippet,
            image,
            source: item.display_link,
        }
    }
}

pub struct GoogleSearchClient {
    client: Client,
    api_key: Secret,
    engine_id: String,
    base_url: String,
    num_results: u8,
}

impl GoogleSearchClient {
    pub fn new(client: Client, config: &GoogleSearchConfig) -> Result<Self> {
        let api_key = validate_required_field("google_search.api_key", &config.api_key)?.clone();
        let engine_id =
            validate_required_field("google_search.engine_id", &config.engine_id)?.clone();
        Ok(Self {
            client,
            api_key,
            engine_id,
            base_url: config.base_url.clone(),
            num_results: config.num_results,
        })
    }
}

#[async_trait]
impl ValveSearcher for GoogleSearchClient {
    async fn search(&self, query: &SearchQuery) -> Result<Vec<SearchResult>> {
        let url = join_url(&self.base_url, "customsearch/v1");
        let terms = query.search_terms();
        tracing::debug!("Searching {} for '{}'", PROVIDER, terms);

        let num = self.num_results.to_string();
        let response = self
            .client
            .get(&url)
            .query(&[
                ("key", self.api_key.expose()),
                ("cx", self.engine_id.as_str()),
                ("q", terms.as_str()),
                ("num", num.as_str()),
            ])
            .send()
            .await?;
        let response = check_status(PROVIDER, response).await?;

        let body: SearchResponse = response.json().await?;
        Ok(body
            .items
            .unwrap_or_default()
            .into_iter()
            .map(SearchResult::from)
            .collect())
    }
}
