// Discovered asset paths
//
// Each release asset URL is split into a resource name (the file itself) and
// a bucket path (the remote directory holding it). Sibling assets share a
// bucket path, so a load unit is always "one glob inside one bucket".

use url::{Position, Url};

/// A single remote file discovered via the release-listing API.
///
/// Derived deterministically from its URL and immutable once created.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveredAsset {
    /// Full download URL
    pub url: Url,

    /// Final path segment, including extension
    pub resource_name: String,

    /// Parent directory URL with trailing slash
    pub bucket_path: String,
}

impl DiscoveredAsset {
    pub fn from_url(url: Url) -> Self {
        let resource_name = resource_name(&url);
        let bucket_path = bucket_path(&url);
        DiscoveredAsset {
            url,
            resource_name,
            bucket_path,
        }
    }
}

/// Final `/`-delimited segment of the URL path, including extension.
///
/// Root-level and empty paths yield an empty name.
pub fn resource_name(url: &Url) -> String {
    url.path().rsplit('/').next().unwrap_or("").to_string()
}

/// The URL with its final path segment stripped and a trailing slash
/// appended: `{scheme}://{authority}{parent}/`.
///
/// Groups sibling files living in the same remote directory so one sink can
/// glob them. Root-level files resolve to `{scheme}://{authority}/`.
pub fn bucket_path(url: &Url) -> String {
    let origin = &url[..Position::BeforePath];
    let parent = match url.path().rsplit_once('/') {
        Some((parent, _)) => parent,
        None => "",
    };
    format!("{}{}/", origin, parent)
}

/// Logical source description for one load unit: a file glob scoped to a
/// bucket path. The glob is always the exact resource name of one asset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CsvSource {
    pub bucket_url: String,
    pub file_glob: String,
}

impl CsvSource {
    pub fn from_asset(asset: &DiscoveredAsset) -> Self {
        CsvSource {
            bucket_url: asset.bucket_path.clone(),
            file_glob: asset.resource_name.clone(),
        }
    }

    /// Resolved URL of the single object this source describes.
    pub fn object_url(&self) -> String {
        format!("{}{}", self.bucket_url, self.file_glob)
    }

    /// Whether the object is gzip-compressed, by extension.
    pub fn is_gzip(&self) -> bool {
        self.file_glob.ends_with(".gz")
    }
}

// ============================================================================
// Tests
// ============================================================================
