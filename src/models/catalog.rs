use crate::error::{NaglModelsError, Result};
use semver::Version;
use serde::Deserialize;
use std::fs::File;
use std::path::Path;

/// Release feed listing the officially published model artifacts
pub const RELEASES_URL: &str =
    "https://api.github.com/repos/openforcefield/openff-nagl-models/releases";

const USER_AGENT: &str = concat!("nagl-models/", env!("CARGO_PKG_VERSION"));

/// A single published release in the feed
#[derive(Debug, Clone, Deserialize)]
pub struct Release {
    pub tag_name: String,
    #[serde(default)]
    pub assets: Vec<ReleaseAsset>,
}

/// A downloadable file attached to a release
#[derive(Debug, Clone, Deserialize)]
pub struct ReleaseAsset {
    pub name: String,
    pub browser_download_url: String,
}

/// Error from a single download attempt, before resolver policy is applied.
///
/// A remote 404 is kept apart from transport failures so the resolver can
/// turn it into a not-found error naming the attempted URL.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("remote returned 404 for {url}")]
    NotFound { url: String },

    #[error(transparent)]
    Http(#[from] reqwest::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Remote source of release metadata and artifact bytes.
///
/// The resolver only touches the network through this trait, so tests can
/// substitute a scripted source.
pub trait ModelSource: Send + Sync {
    /// Fetch the full release catalog from the feed
    fn releases(&self) -> Result<Vec<Release>>;

    /// Download `url` to `dest`, writing the body verbatim
    fn download(&self, url: &str, dest: &Path) -> std::result::Result<(), FetchError>;
}

/// Blocking HTTP implementation of [`ModelSource`].
///
/// No retries and no timeouts; callers needing bounded latency wrap the
/// resolve call themselves.
pub struct HttpSource {
    client: reqwest::blocking::Client,
    releases_url: String,
}

impl HttpSource {
    /// Source pointed at the official release feed
    pub fn new() -> Result<Self> {
        Self::with_releases_url(RELEASES_URL)
    }

    /// Source pointed at an alternate release feed
    pub fn with_releases_url(url: impl Into<String>) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .user_agent(USER_AGENT)
            .build()?;

        Ok(Self {
            client,
            releases_url: url.into(),
        })
    }
}

impl ModelSource for HttpSource {
    fn releases(&self) -> Result<Vec<Release>> {
        let response = self
            .client
            .get(&self.releases_url)
            .send()?
            .error_for_status()?;

        Ok(response.json()?)
    }

    fn download(&self, url: &str, dest: &Path) -> std::result::Result<(), FetchError> {
        let mut response = self.client.get(url).send()?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(FetchError::NotFound {
                url: url.to_string(),
            });
        }
        response = response.error_for_status()?;

        let mut file = File::create(dest)?;
        response.copy_to(&mut file)?;

        Ok(())
    }
}

/// Parse a release tag as a semantic version, tolerating a leading `v`
pub fn parse_tag(tag: &str) -> Result<Version> {
    Version::parse(tag.trim_start_matches('v')).map_err(|source| NaglModelsError::BadReleaseTag {
        tag: tag.to_string(),
        source,
    })
}

/// Order releases newest first by their parsed tags.
///
/// An unparsable tag fails the whole catalog rather than being skipped: the
/// feed is authoritative and corruption should be loud.
pub fn sort_newest_first(releases: Vec<Release>) -> Result<Vec<Release>> {
    let mut keyed = releases
        .into_iter()
        .map(|release| Ok((parse_tag(&release.tag_name)?, release)))
        .collect::<Result<Vec<_>>>()?;

    keyed.sort_by(|a, b| b.0.cmp(&a.0));

    Ok(keyed.into_iter().map(|(_, release)| release).collect())
}
