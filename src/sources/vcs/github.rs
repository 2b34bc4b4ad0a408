//! GitHub driver - repositories read through the REST API.
//!
//! Refused metadata requests fall back to a [`GitDriver`] over SSH when the
//! session cannot prompt for credentials.

use std::collections::HashMap;
use std::rc::Rc;
use std::sync::LazyLock;

use anyhow::{bail, Context, Result};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use chrono::{DateTime, SecondsFormat, Utc};
use indexmap::IndexMap;
use regex::Regex;
use serde::Deserialize;
use serde_json::Value;

use super::{DriverSettings, GitDriver, ManifestInfo, VcsDriver};
use crate::core::{DistReference, SourceReference};
use crate::sources::cache::MetadataCache;
use crate::util::context::SessionContext;
use crate::util::http::{http_status, next_link, HttpResponse, Transport};
use crate::util::io::{Credentials, Io};

static REPOSITORY_URL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^(?:(?:https?|git)://(?:www\.)?(?P<host>[^/]+)/|git@(?P<ssh_host>[^:]+):/?)(?P<owner>[^/]+)/(?P<repo>[^/]+?)(?:\.git|/)?$",
    )
    .expect("github url pattern")
});

#[derive(Debug, Deserialize)]
struct RepositoryData {
    owner: OwnerData,
    name: String,
    #[serde(default)]
    private: bool,
    #[serde(default)]
    has_issues: bool,
    default_branch: Option<String>,
    master_branch: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OwnerData {
    login: String,
}

#[derive(Debug, Deserialize)]
struct TagData {
    name: String,
    commit: CommitRef,
}

#[derive(Debug, Deserialize)]
struct RefData {
    #[serde(rename = "ref")]
    name: String,
    object: CommitRef,
}

#[derive(Debug, Deserialize)]
struct CommitRef {
    sha: String,
}

#[derive(Debug, Deserialize)]
struct ContentData {
    #[serde(default)]
    content: String,
    #[serde(default)]
    encoding: Option<String>,
}

/// Split a GitHub URL into host, owner and repository.
pub fn parse_repository_url(url: &str) -> Option<(String, String, String)> {
    let caps = REPOSITORY_URL.captures(url)?;
    let host = caps.name("host").or_else(|| caps.name("ssh_host"))?;
    Some((
        host.as_str().to_string(),
        caps["owner"].to_string(),
        caps["repo"].to_string(),
    ))
}

/// API root of a GitHub host.
pub fn api_base(host: &str) -> String {
    if host == "github.com" {
        "https://api.github.com".to_string()
    } else {
        format!("https://{}/api/v3", host)
    }
}

/// Driver for repositories hosted on GitHub.
pub struct GitHubDriver {
    settings: DriverSettings,
    context: SessionContext,
    transport: Rc<dyn Transport>,
    io: Rc<dyn Io>,
    cache: MetadataCache,

    host: String,
    owner: String,
    repository: String,
    url: String,

    root_identifier: Option<String>,
    private: bool,
    has_issues: bool,

    tags: Option<IndexMap<String, String>>,
    branches: Option<IndexMap<String, String>>,
    infos: HashMap<String, ManifestInfo>,

    /// Set once the API is abandoned
    git: Option<GitDriver>,
}

impl GitHubDriver {
    pub fn new(settings: DriverSettings, ctx: &SessionContext) -> Result<Self> {
        let (host, owner, repository) = parse_repository_url(&settings.url)
            .with_context(|| format!("not a GitHub repository URL: {}", settings.url))?;
        let url = format!("https://{}/{}/{}.git", host, owner, repository);

        Ok(GitHubDriver {
            transport: ctx.transport(),
            io: ctx.io(),
            cache: ctx.metadata_cache(),
            context: ctx.clone(),
            settings,
            host,
            owner,
            repository,
            url,
            root_identifier: None,
            private: false,
            has_issues: false,
            tags: None,
            branches: None,
            infos: HashMap::new(),
            git: None,
        })
    }

    /// True for URLs on one of the configured GitHub hosts.
    pub fn supports(url: &str, ctx: &SessionContext) -> bool {
        match parse_repository_url(url) {
            Some((host, _, _)) => ctx.config().github.domains().contains(&host),
            None => false,
        }
    }

    pub fn is_private(&self) -> bool {
        self.private
    }

    pub fn has_issues(&self) -> bool {
        self.has_issues
    }

    /// True once requests go through plain git.
    pub fn uses_git_fallback(&self) -> bool {
        self.git.is_some()
    }

    fn repository_api_url(&self) -> String {
        format!(
            "{}/repos/{}/{}",
            api_base(&self.host),
            self.owner,
            self.repository
        )
    }

    fn ssh_url(&self) -> String {
        format!("git@{}:{}/{}.git", self.host, self.owner, self.repository)
    }

    fn credentials(&self) -> Option<Credentials> {
        self.context
            .config()
            .github
            .oauth_token
            .clone()
            .map(Credentials::oauth_token)
            .or_else(|| self.io.credentials(&self.host))
    }

    fn request_headers(&self) -> Vec<(String, String)> {
        let mut headers = vec![(
            "Accept".to_string(),
            "application/vnd.github.v3+json".to_string(),
        )];
        if let Some(credentials) = self.credentials() {
            let value = if credentials.is_oauth_token() {
                format!("token {}", credentials.username)
            } else {
                let pair = format!("{}:{}", credentials.username, credentials.password);
                format!("Basic {}", STANDARD.encode(pair))
            };
            headers.push(("Authorization".to_string(), value));
        }
        headers
    }

    fn api_get(&self, url: &str) -> Result<HttpResponse> {
        Ok(self.transport.get(url, &self.request_headers())?)
    }

    /// Ask for credentials and store them. False when none were given.
    fn authenticate(&self) -> Result<bool> {
        match self.io.ask_credentials(&self.host)? {
            Some(credentials) => {
                self.io.store_credentials(&self.host, &credentials)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn setup_git_driver(&mut self, url: String) -> Result<()> {
        tracing::info!("Falling back to git for {}", url);
        let settings = DriverSettings {
            url,
            asset_type: self.settings.asset_type.clone(),
            no_api: true,
        };
        let mut git = GitDriver::new(settings, &self.context);
        git.initialize()?;
        self.git = Some(git);
        Ok(())
    }

    fn fetch_root_data(&mut self) -> Result<()> {
        let url = self.repository_api_url();
        let mut authenticated = false;

        let response = loop {
            match self.api_get(&url) {
                Ok(response) => break response,
                Err(err) => match http_status(&err) {
                    Some(401 | 403 | 404) => {
                        if !self.io.is_interactive() {
                            return self.setup_git_driver(self.ssh_url());
                        }
                        if authenticated || !self.authenticate()? {
                            return Err(err.context(format!(
                                "could not fetch {}, authentication failed",
                                url
                            )));
                        }
                        authenticated = true;
                    }
                    _ => return Err(err),
                },
            }
        };

        let data: RepositoryData = response.json(&url)?;
        self.owner = data.owner.login;
        self.repository = data.name;
        self.private = data.private;
        self.has_issues = data.has_issues;
        self.root_identifier = Some(
            data.default_branch
                .or(data.master_branch)
                .unwrap_or_else(|| "master".to_string()),
        );
        Ok(())
    }

    /// GET every page of a listing.
    fn fetch_pages<T: serde::de::DeserializeOwned>(&self, first: String) -> Result<Vec<T>> {
        let mut items = Vec::new();
        let mut next = Some(first);
        while let Some(url) = next {
            let response = self.api_get(&url)?;
            let page: Vec<T> = response.json(&url)?;
            items.extend(page);
            next = next_link(&response);
        }
        Ok(items)
    }

    /// Contents request, a 404 is retried once.
    fn fetch_contents(&self, url: &str) -> Result<Option<HttpResponse>> {
        match self.api_get(url) {
            Ok(response) => return Ok(Some(response)),
            Err(err) if http_status(&err) == Some(404) => {
                if self.io.is_interactive() && self.credentials().is_none() {
                    self.authenticate()?;
                }
            }
            Err(err) => return Err(err),
        }

        match self.api_get(url) {
            Ok(response) => Ok(Some(response)),
            Err(err) if http_status(&err) == Some(404) => Ok(None),
            Err(err) => Err(err),
        }
    }

    fn fetch_manifest(&self, identifier: &str) -> Result<ManifestInfo> {
        let filename = self.settings.asset_type.filename();
        let encoded: String = url::form_urlencoded::byte_serialize(identifier.as_bytes()).collect();
        let url = format!(
            "{}/contents/{}?ref={}",
            self.repository_api_url(),
            filename,
            encoded
        );

        let Some(response) = self.fetch_contents(&url)? else {
            return Ok(ManifestInfo::Missing);
        };

        let resource: ContentData = response.json(&url)?;
        let encoded: String = resource.content.split_whitespace().collect();
        let decoded = match resource.encoding.as_deref() {
            Some("base64") => STANDARD
                .decode(&encoded)
                .with_context(|| format!("invalid base64 content of {} from {}", filename, url))?,
            _ => Vec::new(),
        };
        if decoded.is_empty() {
            bail!("could not retrieve {} from {}", filename, url);
        }

        let mut manifest = match serde_json::from_slice(&decoded)
            .with_context(|| format!("failed to parse {} at {}", filename, identifier))?
        {
            Value::Object(manifest) => manifest,
            _ => bail!("{} at {} is not a JSON object", filename, identifier),
        };

        if !manifest.contains_key("time") {
            if let Some(time) = self.commit_time(identifier)? {
                manifest.insert("time".into(), time.into());
            }
        }

        Ok(ManifestInfo::Found(manifest))
    }

    fn commit_time(&self, identifier: &str) -> Result<Option<String>> {
        let encoded: String = url::form_urlencoded::byte_serialize(identifier.as_bytes()).collect();
        let url = format!("{}/commits/{}", self.repository_api_url(), encoded);
        let commit: Value = self.api_get(&url)?.json(&url)?;
        let date = commit
            .pointer("/commit/committer/date")
            .and_then(Value::as_str);

        Ok(date.map(|date| match DateTime::parse_from_rfc3339(date) {
            Ok(parsed) => parsed
                .with_timezone(&Utc)
                .to_rfc3339_opts(SecondsFormat::Secs, true),
            Err(_) => date.to_string(),
        }))
    }
}

impl VcsDriver for GitHubDriver {
    fn initialize(&mut self) -> Result<()> {
        if self.settings.no_api || self.context.config().github.no_api() {
            let url = self.url.clone();
            return self.setup_git_driver(url);
        }
        self.fetch_root_data()
    }

    fn root_identifier(&mut self) -> Result<String> {
        if let Some(git) = &mut self.git {
            return git.root_identifier();
        }
        self.root_identifier
            .clone()
            .context("GitHub driver used before initialize")
    }

    fn tags(&mut self) -> Result<IndexMap<String, String>> {
        if let Some(git) = &mut self.git {
            return git.tags();
        }
        if let Some(tags) = &self.tags {
            return Ok(tags.clone());
        }

        let url = format!("{}/tags?per_page=100", self.repository_api_url());
        let tags: IndexMap<String, String> = self
            .fetch_pages::<TagData>(url)?
            .into_iter()
            .map(|tag| (tag.name, tag.commit.sha))
            .collect();

        self.tags = Some(tags.clone());
        Ok(tags)
    }

    fn branches(&mut self) -> Result<IndexMap<String, String>> {
        if let Some(git) = &mut self.git {
            return git.branches();
        }
        if let Some(branches) = &self.branches {
            return Ok(branches.clone());
        }

        let url = format!("{}/git/refs/heads?per_page=100", self.repository_api_url());
        let branches: IndexMap<String, String> = self
            .fetch_pages::<RefData>(url)?
            .into_iter()
            .filter_map(|r| {
                let name = r.name.strip_prefix("refs/heads/")?.to_string();
                (name != "gh-pages").then_some((name, r.object.sha))
            })
            .collect();

        self.branches = Some(branches.clone());
        Ok(branches)
    }

    fn manifest_info(&mut self, identifier: &str) -> Result<ManifestInfo> {
        if let Some(git) = &mut self.git {
            return git.manifest_info(identifier);
        }
        if let Some(info) = self.infos.get(identifier) {
            return Ok(info.clone());
        }

        let asset = self.settings.asset_type.name();
        let info = match self.cache.read(asset, identifier) {
            Some(manifest) => ManifestInfo::Found(manifest),
            None => {
                let info = self.fetch_manifest(identifier)?;
                if let ManifestInfo::Found(manifest) = &info {
                    self.cache.write(asset, identifier, manifest)?;
                }
                info
            }
        };

        self.infos.insert(identifier.to_string(), info.clone());
        Ok(info)
    }

    fn dist(&mut self, identifier: &str) -> Result<Option<DistReference>> {
        if let Some(git) = &mut self.git {
            return git.dist(identifier);
        }
        Ok(Some(DistReference {
            kind: "zip".to_string(),
            url: format!("{}/zipball/{}", self.repository_api_url(), identifier),
            reference: identifier.to_string(),
        }))
    }

    fn source(&mut self, identifier: &str) -> Result<SourceReference> {
        if let Some(git) = &mut self.git {
            return git.source(identifier);
        }
        let url = if self.private {
            self.ssh_url()
        } else {
            format!("https://{}/{}/{}.git", self.host, self.owner, self.repository)
        };
        Ok(SourceReference {
            kind: "git".to_string(),
            url,
            reference: identifier.to_string(),
        })
    }

    fn url(&self) -> &str {
        match &self.git {
            Some(git) => git.url(),
            None => &self.url,
        }
    }

    fn cleanup(&mut self) -> Result<()> {
        match &mut self.git {
            Some(git) => git.cleanup(),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::AssetType;
    use crate::sources::cache::MemoryCacheStore;
    use crate::test_support::{
        github_contents, test_context, test_context_with, MockHttpResponse, MockTransport,
        ScriptedIo,
    };
    use crate::util::config::Config;
    use crate::util::io::NullIo;

    const REPO_API: &str = "https://api.github.com/repos/composer-test/repo-name";
    const SHA: &str = "SOMESHA";

    fn settings(url: &str) -> DriverSettings {
        DriverSettings {
            url: url.to_string(),
            asset_type: AssetType::BOWER,
            no_api: false,
        }
    }

    fn repository_json(private: bool) -> String {
        format!(
            r#"{{"master_branch": "test_master", "private": {}, "owner": {{"login": "composer-test"}}, "name": "repo-name"}}"#,
            private
        )
    }

    #[test]
    fn test_parse_repository_url() {
        assert_eq!(
            parse_repository_url("https://github.com/acme/widget.git"),
            Some(("github.com".into(), "acme".into(), "widget".into()))
        );
        assert_eq!(
            parse_repository_url("git@github.com:acme/widget.git"),
            Some(("github.com".into(), "acme".into(), "widget".into()))
        );
        assert_eq!(
            parse_repository_url("git://github.com/acme/widget"),
            Some(("github.com".into(), "acme".into(), "widget".into()))
        );
        assert!(parse_repository_url("https://github.com/acme").is_none());
        assert_eq!(api_base("git.acme.dev"), "https://git.acme.dev/api/v3");
    }

    #[test]
    fn test_public_repository() {
        let transport = MockTransport::new();
        transport.mock_url(REPO_API, MockHttpResponse::ok(repository_json(false)));
        let ctx = test_context(transport);

        let mut driver =
            GitHubDriver::new(settings("https://github.com/composer-test/repo-name"), &ctx).unwrap();
        driver.initialize().unwrap();

        assert_eq!(driver.root_identifier().unwrap(), "test_master");
        assert!(!driver.is_private());

        let dist = driver.dist(SHA).unwrap().unwrap();
        assert_eq!(dist.kind, "zip");
        assert_eq!(dist.url, format!("{}/zipball/{}", REPO_API, SHA));
        assert_eq!(dist.reference, SHA);

        let source = driver.source(SHA).unwrap();
        assert_eq!(source.kind, "git");
        assert_eq!(source.url, "https://github.com/composer-test/repo-name.git");
        assert_eq!(source.reference, SHA);
    }

    #[test]
    fn test_private_repository_uses_ssh_source() {
        let transport = MockTransport::new();
        transport.mock_url(REPO_API, MockHttpResponse::ok(repository_json(true)));
        let ctx = test_context(transport);

        let mut driver =
            GitHubDriver::new(settings("https://github.com/composer-test/repo-name"), &ctx).unwrap();
        driver.initialize().unwrap();

        assert!(driver.is_private());
        let source = driver.source(SHA).unwrap();
        assert_eq!(source.url, "git@github.com:composer-test/repo-name.git");
    }

    #[test]
    fn test_interactive_credentials_retry() {
        let transport = MockTransport::new();
        transport.mock_sequence(
            REPO_API,
            vec![MockHttpResponse::status(404), MockHttpResponse::ok(repository_json(true))],
        );
        let io = Rc::new(ScriptedIo::new(Some(Credentials::new("jane", "secret"))));
        let ctx = test_context(transport.clone()).with_io(io.clone());

        let mut driver =
            GitHubDriver::new(settings("https://github.com/composer-test/repo-name"), &ctx).unwrap();
        driver.initialize().unwrap();

        assert_eq!(io.prompts(), 1);
        assert_eq!(
            io.credentials("github.com"),
            Some(Credentials::new("jane", "secret"))
        );
        // the retry carries basic auth
        let (_, headers) = transport.last_request().unwrap();
        assert!(headers
            .iter()
            .any(|(k, v)| k == "Authorization" && v.starts_with("Basic ")));
    }

    #[test]
    fn test_manifest_content_and_commit_time() {
        let manifest = r#"{"name": "repo-name", "version": "1.0.0"}"#;
        let transport = MockTransport::new();
        transport.mock_url(REPO_API, MockHttpResponse::ok(repository_json(false)));
        transport.mock_url(
            &format!("{}/contents/bower.json?ref=feature%2F3.2-foo", REPO_API),
            MockHttpResponse::ok(github_contents(manifest)),
        );
        transport.mock_url(
            &format!("{}/commits/feature%2F3.2-foo", REPO_API),
            MockHttpResponse::ok(r#"{"commit": {"committer": {"date": "2012-09-10T12:00:00+02:00"}}}"#),
        );
        let ctx = test_context(transport);

        let mut driver =
            GitHubDriver::new(settings("https://github.com/composer-test/repo-name"), &ctx).unwrap();
        driver.initialize().unwrap();

        let info = driver.manifest_info("feature/3.2-foo").unwrap();
        let manifest = info.into_manifest().unwrap();
        assert_eq!(manifest["name"], "repo-name");
        assert_eq!(manifest["time"], "2012-09-10T10:00:00Z");
    }

    #[test]
    fn test_tags_and_branches_follow_pagination() {
        let transport = MockTransport::new();
        transport.mock_url(REPO_API, MockHttpResponse::ok(repository_json(false)));
        transport.mock_url(
            &format!("{}/tags?per_page=100", REPO_API),
            MockHttpResponse::ok(r#"[{"name": "v1.0.0", "commit": {"sha": "aaa"}}]"#).with_header(
                "Link",
                &format!(r#"<{}/tags?per_page=100&page=2>; rel="next""#, REPO_API),
            ),
        );
        transport.mock_url(
            &format!("{}/tags?per_page=100&page=2", REPO_API),
            MockHttpResponse::ok(r#"[{"name": "v0.9.0", "commit": {"sha": "bbb"}}]"#),
        );
        transport.mock_url(
            &format!("{}/git/refs/heads?per_page=100", REPO_API),
            MockHttpResponse::ok(
                r#"[{"ref": "refs/heads/master", "object": {"sha": "ccc"}},
                    {"ref": "refs/heads/gh-pages", "object": {"sha": "ddd"}}]"#,
            ),
        );
        let ctx = test_context(transport.clone());

        let mut driver =
            GitHubDriver::new(settings("https://github.com/composer-test/repo-name"), &ctx).unwrap();
        driver.initialize().unwrap();

        let tags = driver.tags().unwrap();
        assert_eq!(
            tags.into_iter().collect::<Vec<_>>(),
            vec![("v1.0.0".into(), "aaa".into()), ("v0.9.0".into(), "bbb".into())]
        );
        let branches = driver.branches().unwrap();
        assert_eq!(branches.keys().collect::<Vec<_>>(), vec!["master"]);

        // listings are fetched once
        let before = transport.requests().len();
        driver.tags().unwrap();
        assert_eq!(transport.requests().len(), before);
    }

    #[test]
    fn test_two_not_found_mean_no_manifest() {
        let transport = MockTransport::new();
        transport.mock_url(REPO_API, MockHttpResponse::ok(repository_json(false)));
        transport.mock_sequence(
            &format!("{}/contents/bower.json?ref={}", REPO_API, SHA),
            vec![MockHttpResponse::status(404), MockHttpResponse::status(404)],
        );
        let ctx = test_context(transport);

        let mut driver =
            GitHubDriver::new(settings("https://github.com/composer-test/repo-name"), &ctx).unwrap();
        driver.initialize().unwrap();

        assert_eq!(driver.manifest_info(SHA).unwrap(), ManifestInfo::Missing);
        assert!(!driver.has_manifest(SHA).unwrap());
    }

    #[test]
    fn test_other_status_after_not_found_is_fatal() {
        let transport = MockTransport::new();
        transport.mock_url(REPO_API, MockHttpResponse::ok(repository_json(false)));
        transport.mock_sequence(
            &format!("{}/contents/bower.json?ref={}", REPO_API, SHA),
            vec![MockHttpResponse::status(404), MockHttpResponse::status(400)],
        );
        let ctx = test_context(transport);

        let mut driver =
            GitHubDriver::new(settings("https://github.com/composer-test/repo-name"), &ctx).unwrap();
        driver.initialize().unwrap();

        let err = driver.manifest_info(SHA).unwrap_err();
        assert_eq!(http_status(&err), Some(400));
    }

    #[test]
    fn test_empty_content_is_fatal() {
        let transport = MockTransport::new();
        transport.mock_url(REPO_API, MockHttpResponse::ok(repository_json(false)));
        transport.mock_url(
            &format!("{}/contents/bower.json?ref={}", REPO_API, SHA),
            MockHttpResponse::ok(r#"{"encoding": "base64", "content": ""}"#),
        );
        let ctx = test_context(transport);

        let mut driver =
            GitHubDriver::new(settings("https://github.com/composer-test/repo-name"), &ctx).unwrap();
        driver.initialize().unwrap();

        let err = driver.manifest_info(SHA).unwrap_err();
        assert!(err.to_string().contains("could not retrieve bower.json"));
    }

    #[test]
    fn test_malformed_base64_content_is_reported() {
        let transport = MockTransport::new();
        transport.mock_url(REPO_API, MockHttpResponse::ok(repository_json(false)));
        transport.mock_url(
            &format!("{}/contents/bower.json?ref={}", REPO_API, SHA),
            MockHttpResponse::ok(r#"{"encoding": "base64", "content": "!!!not base64"}"#),
        );
        let ctx = test_context(transport);

        let mut driver =
            GitHubDriver::new(settings("https://github.com/composer-test/repo-name"), &ctx).unwrap();
        driver.initialize().unwrap();

        let err = format!("{:#}", driver.manifest_info(SHA).unwrap_err());
        assert!(err.contains("invalid base64 content of bower.json"), "{}", err);
        assert!(!err.contains("could not retrieve"), "{}", err);
    }

    #[test]
    fn test_manifest_served_from_memory_then_persistent_cache() {
        let sha = "92bebbfdcde75ef2368317830e54b605bc938123";
        let manifest = r#"{"name": "repo-name", "version": "1.0.0", "time": "2012-09-10"}"#;
        let contents_url = format!("{}/contents/bower.json?ref={}", REPO_API, sha);
        let store = Rc::new(MemoryCacheStore::new());

        let transport = MockTransport::new();
        transport.mock_url(REPO_API, MockHttpResponse::ok(repository_json(false)));
        transport.mock_url(&contents_url, MockHttpResponse::ok(github_contents(manifest)));
        let ctx = test_context_with(transport.clone(), Config::default(), store.clone());

        let mut driver =
            GitHubDriver::new(settings("https://github.com/composer-test/repo-name"), &ctx).unwrap();
        driver.initialize().unwrap();
        let first = driver.manifest_info(sha).unwrap();
        let second = driver.manifest_info(sha).unwrap();
        assert_eq!(first, second);
        assert_eq!(transport.count(&contents_url), 1);

        // a fresh driver reads the persistent cache instead of the API
        let mut driver =
            GitHubDriver::new(settings("https://github.com/composer-test/repo-name"), &ctx).unwrap();
        driver.initialize().unwrap();
        assert_eq!(driver.manifest_info(sha).unwrap(), first);
        assert_eq!(transport.count(&contents_url), 1);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_non_interactive_refusal_falls_back_to_git_over_ssh() {
        let mut config = Config::default();
        config.github.domains = Some(vec!["github.invalid".to_string()]);
        let transport = MockTransport::new();
        transport.mock_url(
            "https://github.invalid/api/v3/repos/composer-test/repo-name",
            MockHttpResponse::status(404),
        );
        let ctx = test_context_with(transport, config, Rc::new(MemoryCacheStore::new()))
            .with_io(Rc::new(NullIo::new()));

        let mut driver =
            GitHubDriver::new(settings("https://github.invalid/composer-test/repo-name"), &ctx)
                .unwrap();

        // no network: the mirror cannot be created, but it was attempted over SSH
        let err = driver.initialize().unwrap_err();
        assert!(format!("{:#}", err).contains("git@github.invalid:composer-test/repo-name.git"));
    }
}
