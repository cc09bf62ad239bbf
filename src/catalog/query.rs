//! Filter and sort engine deriving the view from the canonical set

use std::str::FromStr;

use crate::catalog::types::Extension;

/// Tri-state NSFW filter
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum NsfwFilter {
    /// Match every record
    #[default]
    Any,
    /// Match records whose flag equals the value
    Only(bool),
}

impl NsfwFilter {
    fn matches(self, nsfw: bool) -> bool {
        match self {
            NsfwFilter::Any => true,
            NsfwFilter::Only(expected) => nsfw == expected,
        }
    }
}

impl FromStr for NsfwFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "" | "any" | "all" => Ok(NsfwFilter::Any),
            "1" | "true" | "yes" | "nsfw" => Ok(NsfwFilter::Only(true)),
            "0" | "false" | "no" | "sfw" => Ok(NsfwFilter::Only(false)),
            other => Err(format!("invalid nsfw filter: {other}")),
        }
    }
}

/// Filter criteria; empty fields match everything
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Query {
    pub text: String,
    pub language: Option<String>,
    pub nsfw: NsfwFilter,
}

/// Column the view is ordered by
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum SortField {
    #[default]
    Name,
    Pkg,
    Lang,
    Version,
    Nsfw,
    Sources,
    Repo,
}

impl SortField {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortField::Name => "name",
            SortField::Pkg => "pkg",
            SortField::Lang => "lang",
            SortField::Version => "version",
            SortField::Nsfw => "nsfw",
            SortField::Sources => "sources",
            SortField::Repo => "repo",
        }
    }
}

impl FromStr for SortField {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "name" => Ok(SortField::Name),
            "pkg" => Ok(SortField::Pkg),
            "lang" => Ok(SortField::Lang),
            "version" => Ok(SortField::Version),
            "nsfw" => Ok(SortField::Nsfw),
            "sources" => Ok(SortField::Sources),
            "repo" => Ok(SortField::Repo),
            other => Err(format!("invalid sort field: {other}")),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl SortDirection {
    pub fn toggled(self) -> Self {
        match self {
            SortDirection::Asc => SortDirection::Desc,
            SortDirection::Desc => SortDirection::Asc,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SortState {
    pub field: SortField,
    pub direction: SortDirection,
}

impl SortState {
    pub fn new(field: SortField, direction: SortDirection) -> Self {
        Self { field, direction }
    }

    /// Selecting the active field flips the direction; another field starts ascending
    pub fn select(self, field: SortField) -> Self {
        if self.field == field {
            Self::new(field, self.direction.toggled())
        } else {
            Self::new(field, SortDirection::Asc)
        }
    }
}

/// Sort key extracted from one record
#[derive(Debug, PartialEq, Eq, PartialOrd, Ord)]
enum SortKey {
    Text(String),
    Number(usize),
}

fn sort_key(ext: &Extension, field: SortField) -> SortKey {
    match field {
        SortField::Name => SortKey::Text(ext.name.to_lowercase()),
        SortField::Pkg => SortKey::Text(ext.pkg.to_lowercase()),
        SortField::Lang => SortKey::Text(ext.lang.to_lowercase()),
        // Raw string comparison, matching the table header behaviour
        SortField::Version => SortKey::Text(ext.version.clone()),
        SortField::Nsfw => SortKey::Number(usize::from(ext.nsfw)),
        SortField::Sources => SortKey::Number(ext.sources.len()),
        SortField::Repo => SortKey::Text(ext.repo_origin.repo_name.to_lowercase()),
    }
}

/// Lower-cased text that free-text queries are matched against
fn search_haystack(ext: &Extension) -> String {
    let mut fields = vec![
        ext.name.as_str(),
        ext.pkg.as_str(),
        ext.lang.as_str(),
        ext.version.as_str(),
    ];
    fields.extend(ext.sources.iter().map(|s| s.name.as_str()));
    fields.extend(ext.sources.iter().map(|s| s.base_url.as_str()));
    fields.join(" ").to_lowercase()
}

/// Returns true when the record satisfies every criterion of the query
pub fn matches(ext: &Extension, query: &Query) -> bool {
    let needle = query.text.trim().to_lowercase();
    if !needle.is_empty() && !search_haystack(ext).contains(&needle) {
        return false;
    }

    if let Some(language) = query.language.as_deref()
        && !language.is_empty()
        && ext.lang != language
    {
        return false;
    }

    query.nsfw.matches(ext.nsfw)
}

/// Derive the filtered and sorted view from the canonical set
///
/// The sort is stable in both directions: records with equal keys keep their
/// canonical order.
pub fn apply<'a>(canonical: &'a [Extension], query: &Query, sort: SortState) -> Vec<&'a Extension> {
    let mut keyed: Vec<(SortKey, &Extension)> = canonical
        .iter()
        .filter(|ext| matches(ext, query))
        .map(|ext| (sort_key(ext, sort.field), ext))
        .collect();

    keyed.sort_by(|(a, _), (b, _)| {
        let ordering = a.cmp(b);
        match sort.direction {
            SortDirection::Asc => ordering,
            SortDirection::Desc => ordering.reverse(),
        }
    });

    keyed.into_iter().map(|(_, ext)| ext).collect()
}
