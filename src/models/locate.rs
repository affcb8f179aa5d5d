use crate::models::registry::has_model_suffix;
use semver::Version;
use std::collections::BTreeSet;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

/// A callable returning directories to search for installed model files
pub type DirProvider = Box<dyn Fn() -> Vec<PathBuf> + Send + Sync>;

/// Registry of model-directory providers.
///
/// Hosts register providers (a downstream package exposing its bundled model
/// directory, a config file listing extra paths); lookups query all of them
/// in registration order and concatenate the results.
pub struct ProviderRegistry {
    providers: Vec<DirProvider>,
}

impl Default for ProviderRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ProviderRegistry {
    /// Registry with the built-in `NAGL_MODELS_PATH` provider
    #[must_use]
    pub fn new() -> Self {
        let mut registry = Self::empty();
        registry.register(Box::new(env_dirs));
        registry
    }

    /// Registry with no providers at all
    #[must_use]
    pub fn empty() -> Self {
        Self {
            providers: Vec::new(),
        }
    }

    /// Register an additional provider, queried after existing ones
    pub fn register(&mut self, provider: DirProvider) {
        self.providers.push(provider);
    }

    /// All search directories, in registration order
    #[must_use]
    pub fn search_dirs(&self) -> Vec<PathBuf> {
        self.providers.iter().flat_map(|provider| provider()).collect()
    }
}

/// Directories listed in the `NAGL_MODELS_PATH` environment variable
fn env_dirs() -> Vec<PathBuf> {
    env::var("NAGL_MODELS_PATH")
        .map(|raw| env::split_paths(&raw).collect())
        .unwrap_or_default()
}

/// Search for a file in the working directory, then each directory in order.
/// First existing match wins; the returned path is absolute.
#[must_use]
pub fn search_file_path(filename: &str, dirs: &[PathBuf]) -> Option<PathBuf> {
    let cwd = PathBuf::from(".");
    for dir in std::iter::once(&cwd).chain(dirs.iter()) {
        let path = dir.join(filename);
        if path.exists() {
            return Some(absolute(path));
        }
    }

    None
}

/// Cache entry for a filename, by existence only; hashing is the resolver's job
#[must_use]
pub fn find_in_cache(cache_dir: &Path, filename: &str) -> Option<PathBuf> {
    let path = cache_dir.join(filename);
    path.exists().then_some(path)
}

/// All model files across every provider directory, sorted and deduplicated
#[must_use]
pub fn list_available(registry: &ProviderRegistry) -> Vec<PathBuf> {
    let mut found = BTreeSet::new();
    for dir in registry.search_dirs() {
        for path in model_files_in(&dir) {
            found.insert(absolute(path));
        }
    }

    found.into_iter().collect()
}

/// Model files of a given type, ordered oldest to newest by the version
/// embedded in the filename (`<family>-<type>-<version>.pt`).
///
/// Files without a parsable version are custom artifacts and are skipped;
/// `production_only` additionally drops pre-release versions.
#[must_use]
pub fn models_by_type(
    registry: &ProviderRegistry,
    model_type: &str,
    production_only: bool,
) -> Vec<PathBuf> {
    let infix = format!("-{model_type}-");
    let mut seen = BTreeSet::new();
    let mut versioned: Vec<(Version, PathBuf)> = Vec::new();

    for dir in registry.search_dirs() {
        for path in model_files_in(&dir) {
            let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            let Some(at) = stem.find(&infix) else {
                continue;
            };
            let Ok(version) = Version::parse(&stem[at + infix.len()..]) else {
                continue;
            };
            if production_only && !version.pre.is_empty() {
                continue;
            }

            let path = absolute(path);
            if seen.insert(path.clone()) {
                versioned.push((version, path));
            }
        }
    }

    versioned.sort_by(|a, b| a.0.cmp(&b.0));
    versioned.into_iter().map(|(_, path)| path).collect()
}

/// Newest model of a given type, if any is installed
#[must_use]
pub fn latest_model(
    registry: &ProviderRegistry,
    model_type: &str,
    production_only: bool,
) -> Option<PathBuf> {
    models_by_type(registry, model_type, production_only).pop()
}

/// `*.pt` files directly inside `dir`; missing or unreadable dirs yield nothing
fn model_files_in(dir: &Path) -> Vec<PathBuf> {
    let Ok(entries) = fs::read_dir(dir) else {
        return Vec::new();
    };

    entries
        .flatten()
        .map(|entry| entry.path())
        .filter(|path| {
            path.file_name()
                .and_then(|name| name.to_str())
                .is_some_and(has_model_suffix)
                && path.is_file()
        })
        .collect()
}

fn absolute(path: PathBuf) -> PathBuf {
    fs::canonicalize(&path).unwrap_or(path)
}
