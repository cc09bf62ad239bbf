//! Catalog record types
//!
//! Feed payloads are untrusted, so records are decoded from
//! `serde_json::Value` field by field instead of through a fixed schema.
//! Absent or mistyped fields fall back to empty strings, `false` or `None`.

use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;
use serde_json::{Map, Value};

/// Display names carry this prefix in the upstream feeds
static NAME_PREFIX_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^tachiyomi:\s*").unwrap());

/// Origin of a record, attached by the aggregator
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RepoOrigin {
    /// Human readable feed label (e.g., "Official")
    pub repo_name: String,
    /// Source repository link of the feed
    pub repo_github: String,
}

impl RepoOrigin {
    pub fn new(repo_name: &str, repo_github: &str) -> Self {
        Self {
            repo_name: repo_name.to_string(),
            repo_github: repo_github.to_string(),
        }
    }
}

/// One content endpoint bundled within an extension
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Source {
    pub id: String,
    pub name: String,
    pub base_url: String,
    pub lang: String,
}

impl Source {
    fn from_object(obj: &Map<String, Value>) -> Self {
        Self {
            id: string_field(obj, "id"),
            name: string_field(obj, "name"),
            base_url: string_field(obj, "baseUrl"),
            lang: string_field(obj, "lang"),
        }
    }
}

/// One catalog entry for an installable extension package
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Extension {
    pub pkg: String,
    pub name: String,
    pub lang: String,
    pub version: String,
    pub nsfw: bool,
    pub sources: Vec<Source>,
    pub repo_origin: RepoOrigin,
    pub apk: String,
    /// Numeric version code, when the feed provides one
    pub code: Option<i64>,
}

impl Extension {
    /// Decode a feed record and stamp it with its origin.
    ///
    /// Returns `None` when the record is not an object or has no usable `pkg`.
    pub fn from_value(value: &Value, origin: &RepoOrigin) -> Option<Self> {
        let obj = value.as_object()?;

        let pkg = string_field(obj, "pkg");
        if pkg.trim().is_empty() {
            return None;
        }

        let sources = obj
            .get("sources")
            .and_then(Value::as_array)
            .map(|items| {
                items
                    .iter()
                    .filter_map(Value::as_object)
                    .map(Source::from_object)
                    .collect()
            })
            .unwrap_or_default();

        Some(Self {
            pkg,
            name: string_field(obj, "name"),
            lang: string_field(obj, "lang"),
            version: string_field(obj, "version"),
            nsfw: flag_field(obj, "nsfw"),
            sources,
            repo_origin: origin.clone(),
            apk: string_field(obj, "apk"),
            code: obj.get("code").and_then(Value::as_i64),
        })
    }

    /// Link to the extension's source directory in its feed's repository
    ///
    /// e.g. `https://github.com/org/repo/tree/master/src/vi/truyenqq`
    pub fn source_code_url(&self) -> String {
        let module = self.pkg.rsplit('.').next().unwrap_or(&self.pkg);
        format!(
            "{}/tree/master/src/{}/{}",
            self.repo_origin.repo_github.trim_end_matches('/'),
            self.lang,
            module
        )
    }

    /// Display name without the upstream `Tachiyomi:` prefix
    pub fn short_name(&self) -> &str {
        match NAME_PREFIX_RE.find(&self.name) {
            Some(m) => &self.name[m.end()..],
            None => &self.name,
        }
    }

    /// Two upper-cased leading characters of the short name, or `?`
    pub fn initials(&self) -> String {
        let initials: String = self.short_name().chars().take(2).collect();
        if initials.is_empty() {
            "?".to_string()
        } else {
            initials.to_uppercase()
        }
    }
}

/// Read a field as a string; numbers are rendered in decimal, anything else is empty
fn string_field(obj: &Map<String, Value>, key: &str) -> String {
    match obj.get(key) {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        _ => String::new(),
    }
}

/// Read a boolean-like field; feeds use both `0`/`1` and `true`/`false`
fn flag_field(obj: &Map<String, Value>, key: &str) -> bool {
    match obj.get(key) {
        Some(Value::Bool(b)) => *b,
        Some(Value::Number(n)) => n.as_f64().is_some_and(|n| n != 0.0),
        Some(Value::String(s)) => matches!(s.as_str(), "1" | "true"),
        _ => false,
    }
}
