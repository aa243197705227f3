// Asset download
//
// Fetches one asset object per load unit. Release assets are single files,
// gzip-compressed or plain; decompression happens here so downstream decode
// always sees plain CSV bytes. Failures propagate immediately - this
// pipeline carries no retry policy.

use flate2::read::GzDecoder;
use reqwest::Client;
use std::io::Read;
use std::time::Duration;
use tracing::{debug, info};

use crate::asset::CsvSource;
use crate::config::IngestConfig;
use crate::{IngestError, Result};

/// HTTP fetcher for discovered assets
pub struct AssetFetcher {
    client: Client,
}

impl AssetFetcher {
    pub fn new(config: &IngestConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(config.user_agent.clone())
            .build()?;

        Ok(Self { client })
    }

    /// Fetch the object a source describes, decompressing gzip payloads.
    pub async fn fetch(&self, source: &CsvSource) -> Result<Vec<u8>> {
        let url = source.object_url();
        info!(url = %url, "Downloading asset");

        let response = self.client.get(&url).send().await?;

        if !response.status().is_success() {
            return Err(IngestError::HttpStatus {
                status: response.status(),
                url,
            });
        }

        let bytes = response.bytes().await?.to_vec();
        debug!(bytes = bytes.len(), "Downloaded asset body");

        if source.is_gzip() {
            let decompressed = decompress_gzip(&bytes)?;
            debug!(
                compressed = bytes.len(),
                decompressed = decompressed.len(),
                "Decompressed gzip asset"
            );
            Ok(decompressed)
        } else {
            Ok(bytes)
        }
    }
}

/// Decompress gzip-compressed data
pub fn decompress_gzip(data: &[u8]) -> Result<Vec<u8>> {
    let mut decoder = GzDecoder::new(data);
    let mut decompressed = Vec::new();
    decoder
        .read_to_end(&mut decompressed)
        .map_err(|e| IngestError::Decompression(e.to_string()))?;
    Ok(decompressed)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::asset::DiscoveredAsset;
    use flate2::write::GzEncoder;
    use flate2::Compression;
    use std::io::Write;
    use url::Url;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn gzip(content: &[u8]) -> Vec<u8> {
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(content).unwrap();
        encoder.finish().unwrap()
    }

    fn source_for(url: &str) -> CsvSource {
        CsvSource::from_asset(&DiscoveredAsset::from_url(Url::parse(url).unwrap()))
    }

    #[test]
    fn test_decompress_gzip() {
        let original = b"a,b\n1,2\n";
        let compressed = gzip(original);
        assert_eq!(decompress_gzip(&compressed).unwrap(), original);
    }

    #[test]
    fn test_decompress_gzip_invalid() {
        assert!(matches!(
            decompress_gzip(b"not gzip data"),
            Err(IngestError::Decompression(_))
        ));
    }

    #[tokio::test]
    async fn test_fetch_plain_csv() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/data/file.csv"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"a,b\n1,2\n".to_vec()))
            .mount(&server)
            .await;

        let fetcher = AssetFetcher::new(&IngestConfig::default()).unwrap();
        let source = source_for(&format!("{}/data/file.csv", server.uri()));

        let bytes = fetcher.fetch(&source).await.unwrap();
        assert_eq!(bytes, b"a,b\n1,2\n");
    }

    #[tokio::test]
    async fn test_fetch_decompresses_gz() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/data/file.csv.gz"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(gzip(b"a,b\n1,2\n")))
            .mount(&server)
            .await;

        let fetcher = AssetFetcher::new(&IngestConfig::default()).unwrap();
        let source = source_for(&format!("{}/data/file.csv.gz", server.uri()));

        let bytes = fetcher.fetch(&source).await.unwrap();
        assert_eq!(bytes, b"a,b\n1,2\n");
    }

    #[tokio::test]
    async fn test_fetch_surfaces_http_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let fetcher = AssetFetcher::new(&IngestConfig::default()).unwrap();
        let source = source_for(&format!("{}/data/file.csv", server.uri()));

        assert!(matches!(
            fetcher.fetch(&source).await,
            Err(IngestError::HttpStatus { .. })
        ));
    }
}
