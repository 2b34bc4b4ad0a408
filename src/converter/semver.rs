//! Semver labels and ranges to host constraint syntax.
//!
//! Bower and npm both use node-semver. The host understands most of it, but
//! spells pre-releases without a dot (`beta1`), separates conjunctions with
//! commas and pads npm tildes so that they keep their node meaning.

use std::sync::LazyLock;

use regex::Regex;
use ::semver::Version;

static LABEL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?P<base>[^-+]+)(?:-(?P<pre>[^+]*))?(?:\+.*)?$").expect("version label pattern")
});

static HYPHEN_RANGE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*(\S+)\s+-\s+(\S+)\s*$").expect("hyphen range pattern"));

static OPERATOR_SPACE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(<=|>=|<|>|=|~|\^)\s+").expect("operator spacing pattern"));

static OPERATOR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?P<op><=|>=|<|>|=|~>|~|\^)?(?P<version>.*)$").expect("operator pattern")
});

static NUMERIC_PREFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^v?\d+(\.\d+)?$").expect("short version pattern"));

/// Converter shared by the node style ecosystems.
#[derive(Debug, Clone, Copy, Default)]
pub struct SemverConverter;

impl SemverConverter {
    /// Convert a single version label (a tag or a `version` field).
    pub fn convert_version(&self, version: &str) -> String {
        let version = version.trim();
        match version {
            "" | "*" => return "*".to_string(),
            "latest" => return "default || *".to_string(),
            _ => {}
        }

        // keep a single letter prefix such as `v`
        let (prefix, rest) = match version.char_indices().nth(1) {
            Some((idx, c))
                if c.is_ascii_digit() && version[..idx].chars().all(|p| p.is_ascii_alphabetic()) =>
            {
                version.split_at(idx)
            }
            _ => ("", version),
        };

        if let Ok(parsed) = Version::parse(rest) {
            let mut out = format!("{}{}.{}.{}", prefix, parsed.major, parsed.minor, parsed.patch);
            if !parsed.pre.is_empty() {
                out.push('-');
                out.push_str(&convert_stability(parsed.pre.as_str()));
            }
            return out;
        }

        match LABEL.captures(version) {
            Some(caps) => {
                let mut out = caps["base"].to_string();
                if let Some(pre) = caps.name("pre").filter(|m| !m.as_str().is_empty()) {
                    out.push('-');
                    out.push_str(&convert_stability(pre.as_str()));
                }
                out
            }
            None => version.to_string(),
        }
    }

    /// Convert a dependency range.
    pub fn convert_range(&self, range: &str) -> String {
        let range = range.trim();
        if matches!(range, "" | "*" | "latest" | "x" | "X") {
            return "*".to_string();
        }

        range
            .split("||")
            .map(|part| self.convert_conjunction(part))
            .collect::<Vec<_>>()
            .join(" || ")
    }

    fn convert_conjunction(&self, part: &str) -> String {
        if let Some(caps) = HYPHEN_RANGE.captures(part) {
            return format!(
                ">={},<={}",
                self.convert_version(&caps[1]),
                self.convert_version(&caps[2])
            );
        }

        let joined = OPERATOR_SPACE.replace_all(part.trim(), "$1");
        let constraints: Vec<String> = joined
            .split_whitespace()
            .map(|token| self.convert_constraint(token))
            .collect();
        if constraints.is_empty() {
            "*".to_string()
        } else {
            constraints.join(",")
        }
    }

    fn convert_constraint(&self, token: &str) -> String {
        let Some(caps) = OPERATOR.captures(token) else {
            return self.convert_version(token);
        };
        let op = caps.name("op").map_or("", |m| m.as_str());
        let version = caps.name("version").map_or("", |m| m.as_str());

        if matches!(version, "" | "*" | "x" | "X") {
            return "*".to_string();
        }

        let wildcard = version
            .split('.')
            .any(|c| matches!(c, "x" | "X" | "*"));
        if wildcard {
            let mut parts = Vec::new();
            for component in version.split('.') {
                if matches!(component, "x" | "X" | "*") {
                    parts.push("*");
                    break;
                }
                parts.push(component);
            }
            return parts.join(".");
        }

        match op {
            "~" | "~>" if NUMERIC_PREFIX.is_match(version) => {
                // npm tilde allows patch updates only, pad to get the same on the host
                format!("~{}.0", version)
            }
            "~>" => format!("~{}", self.convert_version(version)),
            "=" => self.convert_version(version),
            _ => format!("{}{}", op, self.convert_version(version)),
        }
    }
}

/// `beta.1` -> `beta1`, `rc.2` -> `RC2`, `pre` -> `alpha`.
fn convert_stability(pre: &str) -> String {
    let mut identifiers = pre.split('.');
    let first = identifiers.next().unwrap_or_default();

    let (label, number) = split_trailing_digits(first);
    let mut out = match label.to_ascii_lowercase().as_str() {
        "rc" => "RC".to_string(),
        "pre" | "preview" => "alpha".to_string(),
        "alpha" | "beta" | "patch" | "dev" => label.to_ascii_lowercase(),
        _ => label.to_string(),
    };
    out.push_str(number);

    let rest: Vec<&str> = identifiers.collect();
    if !rest.is_empty() {
        let numeric = rest.iter().all(|r| r.chars().all(|c| c.is_ascii_digit()));
        if numeric && number.is_empty() {
            out.push_str(&rest.join("."));
        } else {
            out.push('.');
            out.push_str(&rest.join("."));
        }
    }
    out
}

fn split_trailing_digits(s: &str) -> (&str, &str) {
    let idx = s
        .char_indices()
        .rev()
        .take_while(|(_, c)| c.is_ascii_digit())
        .last()
        .map_or(s.len(), |(i, _)| i);
    s.split_at(idx)
}
