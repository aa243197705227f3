// Release asset discovery
//
// Lists the downloadable assets of a fixed GitHub release and keeps the ones
// matching the requested period token. Listing order is preserved: it
// determines load order, and load order determines append order downstream.

use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, info, warn};
use url::Url;

use crate::asset::DiscoveredAsset;
use crate::config::{IngestConfig, Period, TaxiColor};
use crate::{IngestError, Result};

/// One entry of the release asset listing
#[derive(Debug, Deserialize)]
struct ReleaseAsset {
    browser_download_url: String,
}

/// Asset discovery service for the trip-data releases
pub struct AssetDiscovery {
    config: IngestConfig,
    client: Client,
}

impl AssetDiscovery {
    pub fn new(config: IngestConfig) -> Result<Self> {
        config.validate()?;

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(config.user_agent.clone())
            .build()?;

        Ok(Self { config, client })
    }

    /// Discover all assets of a color's release that match the period.
    ///
    /// An empty result is a valid outcome here; the pipeline decides whether
    /// that fails the run.
    pub async fn discover(&self, color: TaxiColor, period: &Period) -> Result<Vec<DiscoveredAsset>> {
        info!(color = %color, period = %period.as_str(), "Discovering release assets");

        let urls = self.list_release_assets(color.release_id()).await?;
        debug!(count = urls.len(), "Fetched asset listing");

        let matched = filter_by_period(urls, period);
        info!(
            count = matched.len(),
            "Matched {} asset(s) for period {}",
            matched.len(),
            period.as_str()
        );

        let mut assets = Vec::with_capacity(matched.len());
        for raw in matched {
            match Url::parse(&raw) {
                Ok(url) => assets.push(DiscoveredAsset::from_url(url)),
                Err(e) => {
                    warn!(url = %raw, error = %e, "Skipping unparseable asset URL");
                },
            }
        }

        Ok(assets)
    }

    /// Fetch every download URL of a release, following pagination.
    ///
    /// The listing endpoint returns at most `page_size` entries per page; a
    /// short page terminates the walk.
    async fn list_release_assets(&self, release_id: &str) -> Result<Vec<String>> {
        let url = self.config.assets_url(release_id);
        let mut urls = Vec::new();
        let mut page: u32 = 1;

        loop {
            debug!(url = %url, page = page, "Fetching asset listing page");

            let response = self
                .client
                .get(&url)
                .query(&[
                    ("per_page", self.config.page_size.to_string()),
                    ("page", page.to_string()),
                ])
                .send()
                .await?;

            if !response.status().is_success() {
                return Err(IngestError::HttpStatus {
                    status: response.status(),
                    url: url.clone(),
                });
            }

            let assets: Vec<ReleaseAsset> = response.json().await?;
            let fetched = assets.len();

            urls.extend(assets.into_iter().map(|a| a.browser_download_url));

            if fetched < self.config.page_size as usize {
                break;
            }
            page += 1;
        }

        Ok(urls)
    }
}

/// Keep URLs containing the period token as a substring, order-preserving.
fn filter_by_period(urls: Vec<String>, period: &Period) -> Vec<String> {
    urls.into_iter()
        .filter(|u| u.contains(period.as_str()))
        .collect()
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::str::FromStr;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn asset_json(urls: &[&str]) -> serde_json::Value {
        json!(urls
            .iter()
            .map(|u| json!({ "browser_download_url": u, "name": "asset" }))
            .collect::<Vec<_>>())
    }

    #[test]
    fn test_filter_by_period_order_preserving() {
        let period = Period::from_str("2020-01").unwrap();
        let urls = vec![
            "https://host/yellow_tripdata_2020-01.csv.gz".to_string(),
            "https://host/yellow_tripdata_2020-02.csv.gz".to_string(),
            "https://host/yellow_tripdata_2019-12.csv.gz".to_string(),
            "https://host/extra_2020-01_fixup.csv.gz".to_string(),
        ];

        let matched = filter_by_period(urls, &period);

        assert_eq!(
            matched,
            vec![
                "https://host/yellow_tripdata_2020-01.csv.gz".to_string(),
                "https://host/extra_2020-01_fixup.csv.gz".to_string(),
            ]
        );
    }

    #[test]
    fn test_filter_by_period_no_match() {
        let period = Period::from_str("2021-07").unwrap();
        let urls = vec!["https://host/yellow_tripdata_2020-01.csv.gz".to_string()];
        assert!(filter_by_period(urls, &period).is_empty());
    }

    #[tokio::test]
    async fn test_discover_filters_listing() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path(
                "/repos/DataTalksClub/nyc-tlc-data/releases/71974786/assets",
            ))
            .respond_with(ResponseTemplate::new(200).set_body_json(asset_json(&[
                "https://host/data/yellow_tripdata_2020-01.csv.gz",
                "https://host/data/yellow_tripdata_2020-02.csv.gz",
            ])))
            .mount(&server)
            .await;

        let config = IngestConfig::builder().api_base_url(server.uri()).build();
        let discovery = AssetDiscovery::new(config).unwrap();
        let period = Period::from_str("2020-01").unwrap();

        let assets = discovery.discover(TaxiColor::Yellow, &period).await.unwrap();

        assert_eq!(assets.len(), 1);
        assert_eq!(assets[0].resource_name, "yellow_tripdata_2020-01.csv.gz");
        assert_eq!(assets[0].bucket_path, "https://host/data/");
    }

    #[tokio::test]
    async fn test_discover_follows_pagination() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path(
                "/repos/DataTalksClub/nyc-tlc-data/releases/71979983/assets",
            ))
            .and(query_param("page", "1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(asset_json(&[
                "https://host/green_tripdata_2020-01.csv.gz",
                "https://host/green_tripdata_2020-02.csv.gz",
            ])))
            .mount(&server)
            .await;

        Mock::given(method("GET"))
            .and(path(
                "/repos/DataTalksClub/nyc-tlc-data/releases/71979983/assets",
            ))
            .and(query_param("page", "2"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(asset_json(&["https://host/green_tripdata_2020-01_extra.csv.gz"])),
            )
            .mount(&server)
            .await;

        let config = IngestConfig::builder()
            .api_base_url(server.uri())
            .page_size(2)
            .build();
        let discovery = AssetDiscovery::new(config).unwrap();
        let period = Period::from_str("2020-01").unwrap();

        let assets = discovery.discover(TaxiColor::Green, &period).await.unwrap();

        assert_eq!(assets.len(), 2);
        assert_eq!(assets[0].resource_name, "green_tripdata_2020-01.csv.gz");
        assert_eq!(assets[1].resource_name, "green_tripdata_2020-01_extra.csv.gz");
    }

    #[tokio::test]
    async fn test_discover_surfaces_http_error() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let config = IngestConfig::builder().api_base_url(server.uri()).build();
        let discovery = AssetDiscovery::new(config).unwrap();
        let period = Period::from_str("2020-01").unwrap();

        let result = discovery.discover(TaxiColor::Yellow, &period).await;

        assert!(matches!(result, Err(IngestError::HttpStatus { .. })));
    }
}
