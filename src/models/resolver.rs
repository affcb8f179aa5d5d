use crate::config::Config;
use crate::error::{NaglModelsError, Result};
use crate::models::catalog::{sort_newest_first, FetchError, HttpSource, ModelSource};
use crate::models::doi::Doi;
use crate::models::hash::sha256_file;
use crate::models::locate::{self, DirProvider, ProviderRegistry};
use crate::models::registry::{self, KNOWN_MODELS};
use std::collections::HashMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

type MemoKey = (String, Option<String>, Option<String>);

/// Resolves a model filename to a verified local path.
///
/// Lookup tiers, first hit wins: installed directories, the on-disk cache,
/// the release catalog (newest release first), then a Zenodo record when a
/// DOI was supplied. Every tier that produces a file is verified against the
/// effective hash, except installed directories, which are trusted as
/// shipped. A hash mismatch is terminal: the resolver never falls through to
/// another source after a name match with wrong content.
pub struct ModelResolver {
    cache_dir: PathBuf,
    known_hashes: HashMap<String, String>,
    providers: ProviderRegistry,
    source: Box<dyn ModelSource>,
    memo: Mutex<HashMap<MemoKey, PathBuf>>,
}

impl ModelResolver {
    /// Resolver with the default cache dir, official hash registry and live feed
    pub fn new() -> Result<Self> {
        Ok(Self {
            cache_dir: default_cache_dir()?,
            known_hashes: KNOWN_MODELS
                .iter()
                .map(|m| (m.filename.to_string(), m.sha256.to_string()))
                .collect(),
            providers: ProviderRegistry::new(),
            source: Box::new(HttpSource::new()?),
            memo: Mutex::new(HashMap::new()),
        })
    }

    /// Resolver configured from a loaded [`Config`]
    pub fn from_config(config: &Config) -> Result<Self> {
        let mut resolver = Self::new()?;

        if let Some(dir) = &config.cache_dir {
            resolver.cache_dir = dir.clone();
        }
        resolver.source = Box::new(HttpSource::with_releases_url(&config.releases_url)?);

        if !config.model_paths.is_empty() {
            let dirs = config.model_paths.clone();
            resolver.register_provider(Box::new(move || dirs.clone()));
        }

        Ok(resolver)
    }

    /// Override the cache directory
    #[must_use]
    pub fn with_cache_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cache_dir = dir.into();
        self
    }

    /// Substitute the remote source (tests, mirrors)
    #[must_use]
    pub fn with_source(mut self, source: Box<dyn ModelSource>) -> Self {
        self.source = source;
        self
    }

    /// Replace the known-hash table
    #[must_use]
    pub fn with_known_hashes(mut self, hashes: HashMap<String, String>) -> Self {
        self.known_hashes = hashes;
        self
    }

    /// Start from an empty provider registry instead of the built-in providers
    #[must_use]
    pub fn with_providers(mut self, providers: ProviderRegistry) -> Self {
        self.providers = providers;
        self
    }

    /// Register an additional model-directory provider
    pub fn register_provider(&mut self, provider: DirProvider) {
        self.providers.register(provider);
    }

    /// Directory fetched artifacts are cached in
    #[must_use]
    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }

    /// Resolve `filename` to a verified local path, fetching if necessary.
    ///
    /// `expected_hash` overrides the built-in registry entry; when neither
    /// exists, verification is skipped.
    pub fn resolve(
        &self,
        filename: &str,
        doi: Option<&str>,
        expected_hash: Option<&str>,
    ) -> Result<PathBuf> {
        if !registry::has_model_suffix(filename) {
            return Err(NaglModelsError::BadFileSuffix(filename.to_string()));
        }

        let effective_hash = expected_hash
            .map(str::to_string)
            .or_else(|| self.known_hashes.get(filename).cloned());

        // speed optimization only: entries are re-checked for existence, and
        // a pruned cache falls through to a full lookup
        let memo_key: MemoKey = (
            filename.to_string(),
            doi.map(str::to_string),
            expected_hash.map(str::to_string),
        );
        if let Ok(memo) = self.memo.lock() {
            if let Some(path) = memo.get(&memo_key) {
                if path.exists() {
                    return Ok(path.clone());
                }
            }
        }

        // installed tier: returned as-is, no hash enforcement
        if let Some(path) = locate::search_file_path(filename, &self.providers.search_dirs()) {
            tracing::debug!("found '{filename}' in installed directories");
            return self.finish(memo_key, path);
        }

        if let Some(cached) = locate::find_in_cache(&self.cache_dir, filename) {
            // mismatch leaves the file in place for inspection
            self.verify(&cached, filename, effective_hash.as_deref())?;
            return self.finish(memo_key, cached);
        }

        let cached = self.cache_dir.join(filename);

        fs::create_dir_all(&self.cache_dir)?;

        let releases = sort_newest_first(self.source.releases()?)?;
        for release in &releases {
            for asset in &release.assets {
                if asset.name == filename {
                    tracing::info!(
                        "downloading '{filename}' from release {}",
                        release.tag_name
                    );
                    self.download_verified(
                        &asset.browser_download_url,
                        &cached,
                        filename,
                        effective_hash.as_deref(),
                    )?;
                    return self.finish(memo_key, cached);
                }
            }
        }

        if let Some(raw) = doi {
            let doi = Doi::parse(raw)?;
            let url = doi.file_url(filename);
            tracing::info!(
                "'{filename}' not in any release, trying Zenodo record {} on {}",
                doi.record(),
                doi.host()
            );
            self.download_verified(&url, &cached, filename, effective_hash.as_deref())?;
            return self.finish(memo_key, cached);
        }

        Err(NaglModelsError::NotFound(format!(
            "Could not find asset with name '{filename}' in any release"
        )))
    }

    /// Sorted, deduplicated model files across all provider directories
    #[must_use]
    pub fn list_available(&self) -> Vec<PathBuf> {
        locate::list_available(&self.providers)
    }

    /// Installed model files of `model_type`, oldest to newest
    #[must_use]
    pub fn models_by_type(&self, model_type: &str, production_only: bool) -> Vec<PathBuf> {
        locate::models_by_type(&self.providers, model_type, production_only)
    }

    /// Newest installed model of `model_type`, if any
    #[must_use]
    pub fn latest_model(&self, model_type: &str, production_only: bool) -> Option<PathBuf> {
        locate::latest_model(&self.providers, model_type, production_only)
    }

    /// Download to a `.part` sibling, verify, then rename into the cache slot.
    /// A failed download or verification removes the partial file; `dest` is
    /// only ever created by the final rename.
    fn download_verified(
        &self,
        url: &str,
        dest: &Path,
        filename: &str,
        expected: Option<&str>,
    ) -> Result<()> {
        let part = partial_path(dest);

        if let Err(e) = self.source.download(url, &part) {
            let _ = fs::remove_file(&part);
            return Err(match e {
                FetchError::NotFound { url } => {
                    NaglModelsError::NotFound(format!("No file named '{filename}' at {url}"))
                }
                FetchError::Http(e) => NaglModelsError::Http(e),
                FetchError::Io(e) => NaglModelsError::Io(e),
            });
        }

        if let Err(e) = self.verify(&part, filename, expected) {
            let _ = fs::remove_file(&part);
            return Err(e);
        }

        fs::rename(&part, dest)?;
        Ok(())
    }

    /// Compare a file against the effective hash, if one exists
    fn verify(&self, path: &Path, filename: &str, expected: Option<&str>) -> Result<()> {
        let Some(expected) = expected else {
            return Ok(());
        };

        let computed = sha256_file(path)?;
        if computed != expected.to_ascii_lowercase() {
            return Err(NaglModelsError::HashMismatch {
                filename: filename.to_string(),
                expected: expected.to_string(),
                computed,
            });
        }

        Ok(())
    }

    fn finish(&self, key: MemoKey, path: PathBuf) -> Result<PathBuf> {
        if let Ok(mut memo) = self.memo.lock() {
            memo.insert(key, path.clone());
        }
        Ok(path)
    }
}

/// Sibling path downloads land on before the final rename
fn partial_path(dest: &Path) -> PathBuf {
    let mut raw = dest.as_os_str().to_os_string();
    raw.push(".part");
    PathBuf::from(raw)
}

/// Default on-disk cache location for fetched artifacts
fn default_cache_dir() -> Result<PathBuf> {
    let base = if let Ok(xdg_cache) = env::var("XDG_CACHE_HOME") {
        PathBuf::from(xdg_cache)
    } else {
        dirs::cache_dir().ok_or_else(|| {
            NaglModelsError::Config("Cannot determine user cache directory".to_string())
        })?
    };

    Ok(base.join("nagl-models"))
}
