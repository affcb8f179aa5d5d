use nagl_models::models::{
    sha256_file, FetchError, ModelSource, ProviderRegistry, Release, ReleaseAsset,
};
use nagl_models::{ModelResolver, NaglModelsError};
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tempfile::TempDir;

const NEW_BYTES: &[u8] = b"new model bytes\n";
const NEW_SHA256: &str = "c8976577fdf34474bde53a075392a76ba1a359e055e013e8bcdf74bb058693f7";

const OLD_BYTES: &[u8] = b"old model bytes\n";

const RECORD_BYTES: &[u8] = b"zenodo record bytes\n";
const RECORD_SHA256: &str = "1d992e07191c530b8ccf0302a9799c90cfe375a8c28ecb650d26c4cef8020cdf";

const CACHED_BYTES: &[u8] = b"cached bytes\n";
const CACHED_SHA256: &str = "5bf65f93e98182c72f17af13d15c1b915f43172dbb9ead801e6129e796af62cc";

/// Scripted remote source: a fixed catalog plus byte blobs served by URL.
struct FakeSource {
    releases: Vec<Release>,
    files: HashMap<String, Vec<u8>>,
    release_calls: Arc<AtomicUsize>,
    download_calls: Arc<AtomicUsize>,
}

impl FakeSource {
    fn new(releases: Vec<Release>, files: HashMap<String, Vec<u8>>) -> Self {
        Self {
            releases,
            files,
            release_calls: Arc::new(AtomicUsize::new(0)),
            download_calls: Arc::new(AtomicUsize::new(0)),
        }
    }
}

impl ModelSource for FakeSource {
    fn releases(&self) -> nagl_models::Result<Vec<Release>> {
        self.release_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.releases.clone())
    }

    fn download(&self, url: &str, dest: &Path) -> Result<(), FetchError> {
        self.download_calls.fetch_add(1, Ordering::SeqCst);
        match self.files.get(url) {
            Some(bytes) => {
                fs::write(dest, bytes)?;
                Ok(())
            }
            None => Err(FetchError::NotFound {
                url: url.to_string(),
            }),
        }
    }
}

/// Source that fails the test on any network use.
struct OfflineSource;

impl ModelSource for OfflineSource {
    fn releases(&self) -> nagl_models::Result<Vec<Release>> {
        panic!("release feed queried while offline");
    }

    fn download(&self, _url: &str, _dest: &Path) -> Result<(), FetchError> {
        panic!("download attempted while offline");
    }
}

fn release(tag: &str, assets: &[(&str, &str)]) -> Release {
    Release {
        tag_name: tag.to_string(),
        assets: assets
            .iter()
            .map(|(name, url)| ReleaseAsset {
                name: (*name).to_string(),
                browser_download_url: (*url).to_string(),
            })
            .collect(),
    }
}

/// Resolver isolated from the host: temp cache, no providers, empty registry.
fn resolver_with(source: Box<dyn ModelSource>, cache: &Path) -> ModelResolver {
    ModelResolver::new()
        .unwrap()
        .with_cache_dir(cache)
        .with_source(source)
        .with_providers(ProviderRegistry::empty())
        .with_known_hashes(HashMap::new())
}

#[test]
fn test_fetch_from_catalog_downloads_and_verifies() {
    let cache = TempDir::new().unwrap();
    let source = FakeSource::new(
        vec![release(
            "v0.2.0",
            &[("test-gnn-am1bcc-0.2.0.pt", "https://example.com/v0.2.0.pt")],
        )],
        HashMap::from([("https://example.com/v0.2.0.pt".to_string(), NEW_BYTES.to_vec())]),
    );

    let resolver = resolver_with(Box::new(source), cache.path()).with_known_hashes(
        HashMap::from([("test-gnn-am1bcc-0.2.0.pt".to_string(), NEW_SHA256.to_string())]),
    );

    let path = resolver
        .resolve("test-gnn-am1bcc-0.2.0.pt", None, None)
        .unwrap();

    assert!(path.starts_with(cache.path()));
    assert_eq!(sha256_file(&path).unwrap(), NEW_SHA256);
}

#[test]
fn test_newest_release_wins() {
    let cache = TempDir::new().unwrap();
    // the same asset name exists in two releases with different content
    let source = FakeSource::new(
        vec![
            release(
                "v0.1.0",
                &[("test-gnn-am1bcc-0.1.0.pt", "https://example.com/old.pt")],
            ),
            release(
                "v0.2.0",
                &[("test-gnn-am1bcc-0.1.0.pt", "https://example.com/new.pt")],
            ),
        ],
        HashMap::from([
            ("https://example.com/old.pt".to_string(), OLD_BYTES.to_vec()),
            ("https://example.com/new.pt".to_string(), NEW_BYTES.to_vec()),
        ]),
    );

    let resolver = resolver_with(Box::new(source), cache.path());
    let path = resolver
        .resolve("test-gnn-am1bcc-0.1.0.pt", None, None)
        .unwrap();

    assert_eq!(fs::read(&path).unwrap(), NEW_BYTES);
}

#[test]
fn test_resolve_is_idempotent() {
    let cache = TempDir::new().unwrap();
    let source = FakeSource::new(
        vec![release(
            "v0.2.0",
            &[("test-gnn-am1bcc-0.2.0.pt", "https://example.com/v0.2.0.pt")],
        )],
        HashMap::from([("https://example.com/v0.2.0.pt".to_string(), NEW_BYTES.to_vec())]),
    );
    let release_calls = Arc::clone(&source.release_calls);
    let download_calls = Arc::clone(&source.download_calls);

    let resolver = resolver_with(Box::new(source), cache.path());

    let first = resolver
        .resolve("test-gnn-am1bcc-0.2.0.pt", None, None)
        .unwrap();
    let second = resolver
        .resolve("test-gnn-am1bcc-0.2.0.pt", None, None)
        .unwrap();

    assert_eq!(first, second);
    assert_eq!(release_calls.load(Ordering::SeqCst), 1);
    assert_eq!(download_calls.load(Ordering::SeqCst), 1);
}

#[test]
fn test_cached_file_resolves_without_network() {
    let cache = TempDir::new().unwrap();
    let filename = "test-gnn-am1bcc-0.2.0.pt";
    fs::write(cache.path().join(filename), CACHED_BYTES).unwrap();

    let resolver = resolver_with(Box::new(OfflineSource), cache.path()).with_known_hashes(
        HashMap::from([(filename.to_string(), CACHED_SHA256.to_string())]),
    );

    let path = resolver.resolve(filename, None, None).unwrap();
    assert_eq!(fs::read(&path).unwrap(), CACHED_BYTES);
}

#[test]
fn test_bad_suffix_rejected_without_io() {
    let cache = TempDir::new().unwrap();
    let resolver = resolver_with(Box::new(OfflineSource), cache.path());

    let result = resolver.resolve("weights.bin", None, None);
    assert!(matches!(result, Err(NaglModelsError::BadFileSuffix(_))));
}

#[test]
fn test_user_hash_conflict_is_fatal_and_preserves_cache_file() {
    let cache = TempDir::new().unwrap();
    let filename = "test-gnn-am1bcc-0.2.0.pt";
    let cached = cache.path().join(filename);
    fs::write(&cached, CACHED_BYTES).unwrap();

    let resolver = resolver_with(Box::new(OfflineSource), cache.path());
    let result = resolver.resolve(filename, None, Some("deadbeef"));

    match result {
        Err(NaglModelsError::HashMismatch { expected, computed, .. }) => {
            assert_eq!(expected, "deadbeef");
            assert_eq!(computed, CACHED_SHA256);
        }
        other => panic!("expected HashMismatch, got {other:?}"),
    }
    // the offending file is left in place for inspection
    assert!(cached.exists());
}

#[test]
fn test_malformed_doi() {
    let cache = TempDir::new().unwrap();
    let source = FakeSource::new(vec![], HashMap::new());
    let resolver = resolver_with(Box::new(source), cache.path());

    let result = resolver.resolve("my_favorite_model.pt", Some("zenodo.278300"), None);
    assert!(matches!(result, Err(NaglModelsError::UnableToParseDoi(_))));
}

#[test]
fn test_doi_fallback_downloads_and_verifies() {
    let cache = TempDir::new().unwrap();
    let url = "https://sandbox.zenodo.org/api/records/278300/files/my_favorite_model.pt";
    let source = FakeSource::new(
        vec![],
        HashMap::from([(url.to_string(), RECORD_BYTES.to_vec())]),
    );

    let resolver = resolver_with(Box::new(source), cache.path());
    let path = resolver
        .resolve(
            "my_favorite_model.pt",
            Some("10.5072/zenodo.278300"),
            Some(RECORD_SHA256),
        )
        .unwrap();

    assert!(path.starts_with(cache.path()));
    assert_eq!(fs::read(&path).unwrap(), RECORD_BYTES);
}

#[test]
fn test_missing_file_at_doi_names_host() {
    let cache = TempDir::new().unwrap();
    let source = FakeSource::new(vec![], HashMap::new());
    let resolver = resolver_with(Box::new(source), cache.path());

    let result = resolver.resolve("file_that_doesnt_exist.pt", Some("10.5072/zenodo.278300"), None);

    match result {
        Err(NaglModelsError::NotFound(message)) => {
            assert!(message.contains("sandbox.zenodo.org"), "{message}");
            assert!(message.contains("file_that_doesnt_exist.pt"), "{message}");
        }
        other => panic!("expected NotFound, got {other:?}"),
    }
}

#[test]
fn test_unparsable_release_tag_is_fatal() {
    let cache = TempDir::new().unwrap();
    let source = FakeSource::new(
        vec![
            release("latest", &[]),
            release(
                "v0.2.0",
                &[("test-gnn-am1bcc-0.2.0.pt", "https://example.com/v0.2.0.pt")],
            ),
        ],
        HashMap::from([("https://example.com/v0.2.0.pt".to_string(), NEW_BYTES.to_vec())]),
    );

    let resolver = resolver_with(Box::new(source), cache.path());
    let result = resolver.resolve("test-gnn-am1bcc-0.2.0.pt", None, None);

    assert!(matches!(
        result,
        Err(NaglModelsError::BadReleaseTag { ref tag, .. }) if tag == "latest"
    ));
}

#[test]
fn test_failed_verification_of_download_leaves_no_file_behind() {
    let cache = TempDir::new().unwrap();
    let filename = "test-gnn-am1bcc-0.2.0.pt";
    // the catalog serves bytes that do not match the expected hash
    let source = FakeSource::new(
        vec![release(
            "v0.2.0",
            &[(filename, "https://example.com/v0.2.0.pt")],
        )],
        HashMap::from([("https://example.com/v0.2.0.pt".to_string(), OLD_BYTES.to_vec())]),
    );

    let resolver = resolver_with(Box::new(source), cache.path());
    let result = resolver.resolve(filename, None, Some(NEW_SHA256));

    assert!(matches!(result, Err(NaglModelsError::HashMismatch { .. })));
    assert!(!cache.path().join(filename).exists());
    assert!(!cache.path().join(format!("{filename}.part")).exists());
}

#[test]
fn test_installed_directories_are_trusted_without_hash_check() {
    let cache = TempDir::new().unwrap();
    let installed = TempDir::new().unwrap();
    let filename = "test-gnn-am1bcc-0.2.0.pt";
    fs::write(installed.path().join(filename), b"installed copy\n").unwrap();

    let mut registry = ProviderRegistry::empty();
    let dir = installed.path().to_path_buf();
    registry.register(Box::new(move || vec![dir.clone()]));

    let resolver =
        resolver_with(Box::new(OfflineSource), cache.path()).with_providers(registry);

    // a hash that cannot match: the installed tier is exempt from verification
    let path = resolver.resolve(filename, None, Some("deadbeef")).unwrap();
    assert!(path.is_absolute());
    assert_eq!(fs::read(&path).unwrap(), b"installed copy\n");
}

#[test]
fn test_exhausted_lookup_names_the_filename() {
    let cache = TempDir::new().unwrap();
    let source = FakeSource::new(vec![release("v0.2.0", &[])], HashMap::new());
    let resolver = resolver_with(Box::new(source), cache.path());

    let result = resolver.resolve("FOOBAR.pt", None, None);

    match result {
        Err(NaglModelsError::NotFound(message)) => {
            assert!(message.contains("FOOBAR.pt"), "{message}");
        }
        other => panic!("expected NotFound, got {other:?}"),
    }
}
