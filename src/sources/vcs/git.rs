//! Git driver - any repository git can reach.
//!
//! Remote repositories are mirrored into the session cache directory and
//! read from there. Local repository paths are read in place.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use chrono::{DateTime, SecondsFormat};
use git2::{BranchType, ErrorCode, Repository};
use indexmap::IndexMap;
use serde_json::Value;

use super::{DriverSettings, ManifestInfo, VcsDriver};
use crate::core::{DistReference, SourceReference};
use crate::sources::cache::MetadataCache;
use crate::util::context::SessionContext;
use crate::util::hash::short_hash;

/// Driver over a git mirror or a local repository.
pub struct GitDriver {
    settings: DriverSettings,
    cache: MetadataCache,

    /// Where the repository is read from
    repo_dir: PathBuf,

    /// The repository is a local path, not a mirror
    local: bool,

    repo: Option<Repository>,
    infos: HashMap<String, ManifestInfo>,
}

impl GitDriver {
    pub fn new(settings: DriverSettings, ctx: &SessionContext) -> Self {
        let local = Path::new(&settings.url).is_dir();
        let repo_dir = if local {
            PathBuf::from(&settings.url)
        } else {
            ctx.git_cache_dir().join(mirror_dir_name(&settings.url))
        };

        GitDriver {
            settings,
            cache: ctx.metadata_cache(),
            repo_dir,
            local,
            repo: None,
            infos: HashMap::new(),
        }
    }

    /// Local repositories and URLs git can fetch from.
    pub fn supports(url: &str, _ctx: &SessionContext) -> bool {
        if Path::new(url).is_dir() {
            return true;
        }
        ["git@", "git://", "ssh://", "file://"]
            .iter()
            .any(|prefix| url.starts_with(prefix))
            || url.trim_end_matches('/').ends_with(".git")
    }

    /// Directory the repository is read from.
    pub fn repo_dir(&self) -> &Path {
        &self.repo_dir
    }

    fn repo(&self) -> Result<&Repository> {
        self.repo
            .as_ref()
            .context("git driver used before initialize")
    }

    fn mirror(&self) -> Result<Repository> {
        let url = &self.settings.url;
        let dir = &self.repo_dir;
        tracing::info!("Mirroring {}", url);

        std::fs::create_dir_all(dir)
            .with_context(|| format!("failed to create directory: {}", dir.display()))?;

        let repo = if dir.join("HEAD").exists() {
            Repository::open_bare(dir)
                .with_context(|| format!("failed to open mirror: {}", dir.display()))?
        } else {
            Repository::init_bare(dir)
                .with_context(|| format!("failed to create mirror: {}", dir.display()))?
        };

        {
            let mut remote = match repo.find_remote("origin") {
                Ok(remote) => remote,
                Err(_) => repo.remote_with_fetch("origin", url, "+refs/*:refs/*")?,
            };
            remote
                .fetch(
                    &["+refs/heads/*:refs/heads/*", "+refs/tags/*:refs/tags/*"],
                    None,
                    None,
                )
                .with_context(|| format!("failed to mirror {} into {}", url, dir.display()))?;

            // Point HEAD at the remote default branch when it is advertised
            if let Ok(head) = remote.default_branch() {
                if let Some(name) = head.as_str() {
                    point_head(&repo, dir, name);
                }
            }
        }

        Ok(repo)
    }
}

impl VcsDriver for GitDriver {
    fn initialize(&mut self) -> Result<()> {
        let repo = if self.local {
            Repository::open(&self.repo_dir).with_context(|| {
                format!("failed to open git repository: {}", self.repo_dir.display())
            })?
        } else {
            self.mirror()?
        };
        self.repo = Some(repo);
        Ok(())
    }

    fn root_identifier(&mut self) -> Result<String> {
        let repo = self.repo()?;

        if let Ok(head) = repo.find_reference("HEAD") {
            if let Some(branch) = head
                .symbolic_target()
                .and_then(|target| target.strip_prefix("refs/heads/"))
            {
                if repo.find_branch(branch, BranchType::Local).is_ok() {
                    return Ok(branch.to_string());
                }
            }
        }

        let branches = list_branches(repo)?;
        if branches.contains_key("master") {
            return Ok("master".to_string());
        }
        Ok(branches
            .keys()
            .next()
            .cloned()
            .unwrap_or_else(|| "master".to_string()))
    }

    fn tags(&mut self) -> Result<IndexMap<String, String>> {
        let repo = self.repo()?;
        let names = repo.tag_names(None)?;
        let mut names: Vec<&str> = names.iter().flatten().collect();
        names.sort_unstable();

        let mut tags = IndexMap::new();
        for name in names {
            let reference = repo.find_reference(&format!("refs/tags/{}", name))?;
            match reference.peel_to_commit() {
                Ok(commit) => {
                    tags.insert(name.to_string(), commit.id().to_string());
                }
                Err(_) => tracing::debug!("Skipping tag {}, not a commit", name),
            }
        }
        Ok(tags)
    }

    fn branches(&mut self) -> Result<IndexMap<String, String>> {
        list_branches(self.repo()?)
    }

    fn manifest_info(&mut self, identifier: &str) -> Result<ManifestInfo> {
        if let Some(info) = self.infos.get(identifier) {
            return Ok(info.clone());
        }

        let asset = self.settings.asset_type.name();
        let info = match self.cache.read(asset, identifier) {
            Some(manifest) => ManifestInfo::Found(manifest),
            None => {
                let filename = self.settings.asset_type.filename();
                let info = read_manifest(self.repo()?, identifier, filename)?;
                if let ManifestInfo::Found(manifest) = &info {
                    self.cache.write(asset, identifier, manifest)?;
                }
                info
            }
        };

        self.infos.insert(identifier.to_string(), info.clone());
        Ok(info)
    }

    fn dist(&mut self, _identifier: &str) -> Result<Option<DistReference>> {
        Ok(None)
    }

    fn source(&mut self, identifier: &str) -> Result<SourceReference> {
        Ok(SourceReference {
            kind: "git".to_string(),
            url: self.settings.url.clone(),
            reference: identifier.to_string(),
        })
    }

    fn url(&self) -> &str {
        &self.settings.url
    }
}

fn list_branches(repo: &Repository) -> Result<IndexMap<String, String>> {
    let mut branches = Vec::new();
    for entry in repo.branches(Some(BranchType::Local))? {
        let (branch, _) = entry?;
        let Some(name) = branch.name()? else {
            continue;
        };
        let commit = branch.get().peel_to_commit()?;
        branches.push((name.to_string(), commit.id().to_string()));
    }
    branches.sort();
    Ok(branches.into_iter().collect())
}

fn read_manifest(repo: &Repository, identifier: &str, filename: &str) -> Result<ManifestInfo> {
    let object = match repo.revparse_single(&format!("{}:{}", identifier, filename)) {
        Ok(object) => object,
        Err(e) if e.code() == ErrorCode::NotFound => return Ok(ManifestInfo::Missing),
        Err(e) => {
            return Err(e).with_context(|| format!("failed to read {} at {}", filename, identifier))
        }
    };
    let blob = object.peel_to_blob()?;

    let mut manifest = match serde_json::from_slice(blob.content())
        .with_context(|| format!("failed to parse {} at {}", filename, identifier))?
    {
        Value::Object(manifest) => manifest,
        _ => bail!("{} at {} is not a JSON object", filename, identifier),
    };

    if !manifest.contains_key("time") {
        let commit = repo.revparse_single(identifier)?.peel_to_commit()?;
        if let Some(time) = DateTime::from_timestamp(commit.time().seconds(), 0) {
            manifest.insert(
                "time".into(),
                time.to_rfc3339_opts(SecondsFormat::Secs, true).into(),
            );
        }
    }

    Ok(ManifestInfo::Found(manifest))
}

/// Directory name of the mirror of `url`.
/// Failures leave HEAD as it was.
fn point_head(repo: &Repository, dir: &Path, branch: &str) {
    if let Err(err) = repo.set_head(branch) {
        tracing::debug!("Could not point HEAD of {} at {}: {}", dir.display(), branch, err);
    }
}

fn mirror_dir_name(url: &str) -> String {
    let trimmed = url.split_once("://").map_or(url, |(_, rest)| rest);
    let trimmed = trimmed.trim_end_matches('/');
    let trimmed = trimmed.strip_suffix(".git").unwrap_or(trimmed);

    let name: String = trimmed
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '.' { c } else { '-' })
        .collect();

    format!("{}-{}", name.trim_matches('-'), short_hash(url))
}
