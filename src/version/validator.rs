//! Tag and branch validation.
//!
//! Tags are the release versions of a repository and may be rejected;
//! branches always produce a dev version.

use std::cmp::Ordering;
use std::sync::LazyLock;

use regex::Regex;

use crate::core::AssetType;
use crate::version::parser::{is_master_like, normalize, normalize_branch, DEFAULT_BRANCH_VERSION};

static DEV_SUFFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)[.-]?dev$").expect("dev suffix pattern"));

static BRANCH_NINES: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\.9{7})+").expect("branch wildcard pattern"));

/// A validated version of a ref.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NormalizedVersion {
    /// Version shown to users (`v1.0.0`, `dev-master`, `1.x-dev`)
    pub pretty: String,

    /// Comparable form (`1.0.0.0`, `9999999-dev`)
    pub normalized: String,

    pub is_dev: bool,
}

impl Ord for NormalizedVersion {
    fn cmp(&self, other: &Self) -> Ordering {
        compare_normalized(&self.normalized, &other.normalized)
            .then_with(|| self.pretty.cmp(&other.pretty))
    }
}

impl PartialOrd for NormalizedVersion {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Strip the `release-` noise prefix of a tag.
pub fn strip_release_prefix(tag: &str) -> &str {
    tag.strip_prefix("release-").unwrap_or(tag)
}

/// Validate a tag. `None` when the tag is not a release version.
pub fn validate_tag(tag: &str, asset: &AssetType) -> Option<NormalizedVersion> {
    let tag = strip_release_prefix(tag.trim());
    if tag.is_empty() || is_master_like(tag) {
        return None;
    }

    let converted = asset.version_converter().convert_version(tag);
    let normalized = match normalize(&converted) {
        Ok(normalized) => normalized,
        Err(err) => {
            tracing::debug!("tag {}: {}", tag, err);
            return None;
        }
    };

    // branch style labels are not releases
    if normalized.starts_with("dev-") || normalized.contains(".9999999") {
        return None;
    }

    // tag versions never carry a dev flag
    Some(NormalizedVersion {
        pretty: DEV_SUFFIX.replace(&converted, "").into_owned(),
        normalized: DEV_SUFFIX.replace(&normalized, "").into_owned(),
        is_dev: false,
    })
}

/// The dev version of a branch.
pub fn branch_version(branch: &str) -> NormalizedVersion {
    let normalized = normalize_branch(branch);
    let pretty = if normalized.starts_with("dev-") || normalized == DEFAULT_BRANCH_VERSION {
        format!("dev-{}", branch)
    } else {
        BRANCH_NINES.replace_all(&normalized, ".x").into_owned()
    };

    NormalizedVersion {
        pretty,
        normalized,
        is_dev: true,
    }
}

fn compare_normalized(a: &str, b: &str) -> Ordering {
    let (a_num, a_stab) = split_normalized(a);
    let (b_num, b_stab) = split_normalized(b);
    a_num
        .cmp(&b_num)
        .then_with(|| stability_rank(a_stab).cmp(&stability_rank(b_stab)))
        .then_with(|| a_stab.cmp(b_stab))
}

fn split_normalized(v: &str) -> (Vec<u64>, &str) {
    if v.starts_with("dev-") {
        return (Vec::new(), v);
    }
    let (numbers, stability) = v.split_once('-').unwrap_or((v, ""));
    let numbers = numbers
        .split('.')
        .map(|n| n.parse().unwrap_or(0))
        .collect();
    (numbers, stability)
}

fn stability_rank(stability: &str) -> u8 {
    let lower = stability.to_ascii_lowercase();
    if lower.ends_with("dev") {
        0
    } else if lower.starts_with("alpha") {
        1
    } else if lower.starts_with("beta") {
        2
    } else if lower.starts_with("rc") {
        3
    } else if lower.is_empty() {
        4
    } else {
        5
    }
}
