//! Test utilities and mocks for asset-bridge unit tests.
//!
//! This module provides mock implementations of the capabilities a session
//! is built from (HTTP transport, user interaction, VCS drivers) so that
//! repositories can be exercised without network access.
//!
//! # Example
//!
//! ```rust,ignore
//! use asset_bridge::test_support::{test_context, MockHttpResponse, MockTransport};
//!
//! #[test]
//! fn test_example() {
//!     let transport = MockTransport::new();
//!     transport.mock_url("https://registry.bower.io/packages/jquery", MockHttpResponse::ok("{}"));
//!
//!     let ctx = test_context(transport.clone());
//!     // Use the context in tests...
//! }
//! ```

pub mod fixtures;

use std::cell::{Cell, RefCell};
use std::collections::{HashMap, VecDeque};
use std::io;
use std::path::Path;
use std::rc::Rc;
use std::sync::{Arc, Mutex, PoisonError};

use anyhow::{bail, Result};
use indexmap::IndexMap;
use serde_json::{Map, Value};

use crate::core::{DistReference, DriverKind, SourceReference};
use crate::sources::cache::{CacheStore, MemoryCacheStore};
use crate::sources::vcs::{DriverEntry, DriverRegistry, ManifestInfo, VcsDriver};
use crate::util::config::Config;
use crate::util::context::SessionContext;
use crate::util::http::{HttpResponse, Transport, TransportError};
use crate::util::io::{Credentials, Io, NullIo};

// Re-export fixtures for convenience
pub use fixtures::*;

/// Mock HTTP response.
#[derive(Debug, Clone)]
pub struct MockHttpResponse {
    /// HTTP status code, 0 for a connection failure.
    pub status: u16,
    /// Response headers.
    pub headers: HashMap<String, String>,
    /// Response body.
    pub body: Vec<u8>,
}

impl MockHttpResponse {
    /// Create a successful response with the given body.
    pub fn ok(body: impl Into<Vec<u8>>) -> Self {
        MockHttpResponse {
            status: 200,
            headers: HashMap::new(),
            body: body.into(),
        }
    }

    /// Create a not found response.
    pub fn not_found() -> Self {
        Self::status(404)
    }

    /// Create a response with the given status and an empty body.
    pub fn status(status: u16) -> Self {
        MockHttpResponse {
            status,
            headers: HashMap::new(),
            body: Vec::new(),
        }
    }

    /// Create a connection failure.
    pub fn network_error() -> Self {
        Self::status(0)
    }

    /// Add a header to the response.
    pub fn with_header(mut self, key: &str, value: &str) -> Self {
        self.headers
            .insert(key.to_ascii_lowercase(), value.to_string());
        self
    }

    /// Check if this is a successful response.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

#[derive(Debug, Default)]
struct TransportState {
    responses: HashMap<String, VecDeque<MockHttpResponse>>,
    requests: Vec<(String, Vec<(String, String)>)>,
}

/// Mock HTTP transport answering from a table of URLs.
///
/// Clones share their table and request log, so a test can keep one clone
/// and hand another to the context.
#[derive(Debug, Clone, Default)]
pub struct MockTransport {
    state: Rc<RefCell<TransportState>>,
}

impl MockTransport {
    /// Create a new mock transport.
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer every request for `url` with `response`.
    pub fn mock_url(&self, url: &str, response: MockHttpResponse) -> &Self {
        self.mock_sequence(url, vec![response])
    }

    /// Answer successive requests for `url` in order. The last response repeats.
    pub fn mock_sequence(&self, url: &str, responses: Vec<MockHttpResponse>) -> &Self {
        self.state
            .borrow_mut()
            .responses
            .insert(url.to_string(), responses.into());
        self
    }

    /// Get all requested URLs.
    pub fn requests(&self) -> Vec<String> {
        self.state
            .borrow()
            .requests
            .iter()
            .map(|(url, _)| url.clone())
            .collect()
    }

    /// Last request with its headers.
    pub fn last_request(&self) -> Option<(String, Vec<(String, String)>)> {
        self.state.borrow().requests.last().cloned()
    }

    /// Number of requests made for `url`.
    pub fn count(&self, url: &str) -> usize {
        self.state
            .borrow()
            .requests
            .iter()
            .filter(|(requested, _)| requested == url)
            .count()
    }
}

impl Transport for MockTransport {
    fn get(&self, url: &str, headers: &[(String, String)]) -> Result<HttpResponse, TransportError> {
        let mut state = self.state.borrow_mut();
        state.requests.push((url.to_string(), headers.to_vec()));

        let response = match state.responses.get_mut(url) {
            Some(queue) if queue.len() > 1 => queue.pop_front(),
            Some(queue) => queue.front().cloned(),
            None => None,
        };

        let Some(response) = response else {
            return Err(TransportError::Network {
                url: url.to_string(),
                message: "no mock response".to_string(),
            });
        };

        if response.status == 0 {
            return Err(TransportError::Network {
                url: url.to_string(),
                message: "connection refused".to_string(),
            });
        }
        if !response.is_success() {
            return Err(TransportError::Status {
                url: url.to_string(),
                status: response.status,
            });
        }

        Ok(HttpResponse {
            status: response.status,
            headers: response.headers,
            body: response.body,
        })
    }
}

/// Interactive IO answering prompts from a script.
#[derive(Debug, Default)]
pub struct ScriptedIo {
    answer: Option<Credentials>,
    prompts: Cell<usize>,
    known: RefCell<HashMap<String, Credentials>>,
}

impl ScriptedIo {
    /// Every prompt is answered with `answer`.
    pub fn new(answer: Option<Credentials>) -> Self {
        ScriptedIo {
            answer,
            ..Self::default()
        }
    }

    /// Number of prompts shown.
    pub fn prompts(&self) -> usize {
        self.prompts.get()
    }
}

impl Io for ScriptedIo {
    fn is_interactive(&self) -> bool {
        true
    }

    fn credentials(&self, host: &str) -> Option<Credentials> {
        self.known.borrow().get(host).cloned()
    }

    fn ask_credentials(&self, _host: &str) -> Result<Option<Credentials>> {
        self.prompts.set(self.prompts.get() + 1);
        Ok(self.answer.clone())
    }

    fn store_credentials(&self, host: &str, credentials: &Credentials) -> Result<()> {
        self.known
            .borrow_mut()
            .insert(host.to_string(), credentials.clone());
        Ok(())
    }
}

/// Context over `transport` with default config and an in-memory cache.
pub fn test_context(transport: MockTransport) -> SessionContext {
    test_context_with(
        transport,
        Config::default(),
        Rc::new(MemoryCacheStore::new()),
    )
}

/// Context with explicit config and cache store.
pub fn test_context_with(
    transport: MockTransport,
    config: Config,
    store: Rc<dyn CacheStore>,
) -> SessionContext {
    SessionContext::with_parts(
        config,
        std::env::temp_dir().join("asset-bridge-tests"),
        Rc::new(transport),
        store,
        Rc::new(NullIo::new()),
    )
}

/// Context whose git mirrors live under `cache_dir`.
pub fn test_context_in(transport: MockTransport, cache_dir: &Path) -> SessionContext {
    SessionContext::with_parts(
        Config::default(),
        cache_dir.to_path_buf(),
        Rc::new(transport),
        Rc::new(MemoryCacheStore::new()),
        Rc::new(NullIo::new()),
    )
}

#[derive(Debug, Default)]
struct MockRepository {
    root: String,
    tags: IndexMap<String, String>,
    branches: IndexMap<String, String>,
    manifests: HashMap<String, Map<String, Value>>,
    fail_initialize: bool,
    initializations: Cell<usize>,
    manifest_reads: RefCell<Vec<String>>,
}

/// In-memory VCS driver.
///
/// Refs point at identifiers; identifiers without a manifest report
/// [`ManifestInfo::Missing`]. Clones share the fixture and its counters.
#[derive(Debug, Clone)]
pub struct MockVcsDriver {
    url: String,
    repository: Rc<RefCell<MockRepository>>,
}

impl MockVcsDriver {
    pub fn new(root: &str) -> Self {
        MockVcsDriver {
            url: String::new(),
            repository: Rc::new(RefCell::new(MockRepository {
                root: root.to_string(),
                ..MockRepository::default()
            })),
        }
    }

    /// Add a tag pointing at `identifier`.
    pub fn tag(self, name: &str, identifier: &str) -> Self {
        self.repository
            .borrow_mut()
            .tags
            .insert(name.to_string(), identifier.to_string());
        self
    }

    /// Add a branch pointing at `identifier`.
    pub fn branch(self, name: &str, identifier: &str) -> Self {
        self.repository
            .borrow_mut()
            .branches
            .insert(name.to_string(), identifier.to_string());
        self
    }

    /// Serve `manifest` at `identifier`.
    pub fn manifest(self, identifier: &str, manifest: Value) -> Self {
        if let Value::Object(manifest) = manifest {
            self.repository
                .borrow_mut()
                .manifests
                .insert(identifier.to_string(), manifest);
        }
        self
    }

    /// Make `initialize` fail.
    pub fn failing(self) -> Self {
        self.repository.borrow_mut().fail_initialize = true;
        self
    }

    pub fn initializations(&self) -> usize {
        self.repository.borrow().initializations.get()
    }

    /// Identifiers whose manifest was read, in order.
    pub fn manifest_reads(&self) -> Vec<String> {
        self.repository.borrow().manifest_reads.borrow().clone()
    }

    /// Driver registry serving this fixture for any URL.
    pub fn registry(&self) -> DriverRegistry {
        let fixture = self.clone();
        DriverRegistry::new(vec![DriverEntry::new(
            DriverKind::Git,
            |_, _| true,
            move |settings, _| {
                let mut driver = fixture.clone();
                driver.url = settings.url;
                Ok(Box::new(driver))
            },
        )])
    }
}

impl VcsDriver for MockVcsDriver {
    fn initialize(&mut self) -> Result<()> {
        let repository = self.repository.borrow();
        repository
            .initializations
            .set(repository.initializations.get() + 1);
        if repository.fail_initialize {
            bail!("failed to initialize {}", self.url);
        }
        Ok(())
    }

    fn root_identifier(&mut self) -> Result<String> {
        Ok(self.repository.borrow().root.clone())
    }

    fn tags(&mut self) -> Result<IndexMap<String, String>> {
        Ok(self.repository.borrow().tags.clone())
    }

    fn branches(&mut self) -> Result<IndexMap<String, String>> {
        Ok(self.repository.borrow().branches.clone())
    }

    fn manifest_info(&mut self, identifier: &str) -> Result<ManifestInfo> {
        let repository = self.repository.borrow();
        repository
            .manifest_reads
            .borrow_mut()
            .push(identifier.to_string());
        Ok(match repository.manifests.get(identifier) {
            Some(manifest) => ManifestInfo::Found(manifest.clone()),
            None => ManifestInfo::Missing,
        })
    }

    fn dist(&mut self, identifier: &str) -> Result<Option<DistReference>> {
        Ok(Some(DistReference {
            kind: "zip".to_string(),
            url: format!("{}/zipball/{}", self.url, identifier),
            reference: identifier.to_string(),
        }))
    }

    fn source(&mut self, identifier: &str) -> Result<SourceReference> {
        Ok(SourceReference {
            kind: "git".to_string(),
            url: self.url.clone(),
            reference: identifier.to_string(),
        })
    }

    fn url(&self) -> &str {
        &self.url
    }
}

/// Context whose VCS drivers are all `driver`.
pub fn mock_vcs_context(transport: MockTransport, driver: &MockVcsDriver) -> SessionContext {
    test_context(transport).with_drivers(driver.registry())
}

/// Log sink shared between a test and its subscriber.
#[derive(Clone, Default)]
struct LogBuffer(Arc<Mutex<Vec<u8>>>);

impl io::Write for LogBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Run `f` with a debug level subscriber and return what it logged.
pub fn capture_logs<T>(f: impl FnOnce() -> T) -> (T, String) {
    let buffer = LogBuffer::default();
    let writer = buffer.clone();
    let subscriber = tracing_subscriber::fmt()
        .with_writer(move || writer.clone())
        .with_max_level(tracing::Level::DEBUG)
        .with_ansi(false)
        .with_target(false)
        .without_time()
        .finish();

    let value = tracing::subscriber::with_default(subscriber, f);
    let lines = buffer.0.lock().unwrap_or_else(PoisonError::into_inner);
    let logs = String::from_utf8_lossy(&lines).into_owned();
    (value, logs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_mock_transport_sequences() {
        let transport = MockTransport::new();
        transport.mock_sequence(
            "https://example.com/a",
            vec![MockHttpResponse::not_found(), MockHttpResponse::ok("done")],
        );

        let err = transport.get("https://example.com/a", &[]).unwrap_err();
        assert_eq!(err.status(), Some(404));
        let response = transport.get("https://example.com/a", &[]).unwrap();
        assert_eq!(response.body, b"done");
        // the last response repeats
        assert!(transport.get("https://example.com/a", &[]).is_ok());

        assert!(transport.get("https://example.com/unmocked", &[]).is_err());
        assert_eq!(transport.count("https://example.com/a"), 3);
        assert_eq!(transport.requests().len(), 4);
    }

    #[test]
    fn test_mock_vcs_driver() {
        let fixture = MockVcsDriver::new("master")
            .tag("1.0.0", "abc")
            .manifest("abc", json!({"name": "foo"}));
        let ctx = mock_vcs_context(MockTransport::new(), &fixture);

        let settings = crate::sources::vcs::DriverSettings {
            url: "https://example.com/foo.git".to_string(),
            asset_type: crate::core::AssetType::BOWER,
            no_api: false,
        };
        let mut driver = ctx
            .drivers()
            .create(DriverKind::Vcs, settings, &ctx)
            .unwrap();
        driver.initialize().unwrap();

        assert_eq!(driver.url(), "https://example.com/foo.git");
        assert!(driver.has_manifest("abc").unwrap());
        assert!(!driver.has_manifest("def").unwrap());
        assert_eq!(fixture.initializations(), 1);
        assert_eq!(fixture.manifest_reads(), vec!["abc", "def"]);
    }

    #[test]
    fn test_capture_logs() {
        let (value, logs) = capture_logs(|| {
            tracing::warn!("Skipped {}", "foo");
            tracing::trace!("not captured");
            7
        });
        assert_eq!(value, 7);
        assert!(logs.contains("WARN"), "{}", logs);
        assert!(logs.contains("Skipped foo"), "{}", logs);
        assert!(!logs.contains("not captured"), "{}", logs);
    }
}
