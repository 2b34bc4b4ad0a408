//! Test fixtures for common test scenarios.
//!
//! Pre-built manifests and registry documents in the shapes the Bower and
//! npm registries and the GitHub API return them.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde_json::{json, Value};

/// Bower manifest with a name and a version.
pub fn bower_manifest(name: &str, version: &str) -> Value {
    json!({
        "name": name,
        "version": version,
    })
}

/// npm manifest with a name, a version and dependencies.
pub fn npm_manifest(name: &str, version: &str, deps: &[(&str, &str)]) -> Value {
    let dependencies: serde_json::Map<String, Value> = deps
        .iter()
        .map(|(name, constraint)| (name.to_string(), Value::from(*constraint)))
        .collect();
    json!({
        "name": name,
        "version": version,
        "dependencies": dependencies,
    })
}

/// Bower registry lookup document.
pub fn bower_registry_document(name: &str, url: &str) -> String {
    json!({"name": name, "url": url}).to_string()
}

/// npm registry document whose repository is a `{type, url}` object.
pub fn npm_registry_document(name: &str, url: &str) -> String {
    json!({
        "name": name,
        "repository": {"type": "git", "url": url},
    })
    .to_string()
}

/// GitHub contents API body for `content`, base64 wrapped at 60 columns.
pub fn github_contents(content: &str) -> String {
    let encoded = STANDARD.encode(content);
    let wrapped: Vec<String> = encoded
        .as_bytes()
        .chunks(60)
        .map(|line| String::from_utf8_lossy(line).into_owned())
        .collect();
    json!({
        "encoding": "base64",
        "content": wrapped.join("\n"),
    })
    .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_github_contents_is_wrapped() {
        let body: Value = serde_json::from_str(&github_contents(&"x".repeat(100))).unwrap();
        let content = body["content"].as_str().unwrap();
        assert!(content.contains('\n'));
        let joined: String = content.split_whitespace().collect();
        assert_eq!(STANDARD.decode(joined).unwrap(), "x".repeat(100).as_bytes());
    }
}
