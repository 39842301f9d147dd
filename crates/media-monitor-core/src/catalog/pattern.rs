use super::record::{MediaRecord, Probed};
use crate::error::Error;
use regex::Regex;
use std::collections::BTreeSet;

/// Literal used on the query surface for an unknown field value.
const UNKNOWN_LITERAL: &str = "unknown";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MatchFlags {
    pub use_regex: bool,
}

impl MatchFlags {
    /// Exact equality on every field.
    pub fn exact() -> Self {
        Self { use_regex: false }
    }
}

impl Default for MatchFlags {
    fn default() -> Self {
        Self { use_regex: true }
    }
}

/// Expected values per record field. Absent fields are not constrained.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Pattern {
    pub file: Option<String>,
    pub dir: Option<String>,
    pub size: Option<Probed<u64>>,
    pub created: Option<Probed<i64>>,
    pub hash: Option<Probed<String>>,
    pub tags: Option<BTreeSet<String>>,
    pub url: Option<Probed<String>>,
    pub google: Option<Probed<String>>,
}

impl Pattern {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pattern naming a single cataloged path.
    pub fn path(file: impl Into<String>, dir: impl Into<String>) -> Self {
        Self::new().file(file).dir(dir)
    }

    pub fn file(mut self, file: impl Into<String>) -> Self {
        self.file = Some(file.into());
        self
    }

    pub fn dir(mut self, dir: impl Into<String>) -> Self {
        self.dir = Some(dir.into());
        self
    }

    pub fn size(mut self, size: impl Into<Probed<u64>>) -> Self {
        self.size = Some(size.into());
        self
    }

    pub fn created(mut self, created: impl Into<Probed<i64>>) -> Self {
        self.created = Some(created.into());
        self
    }

    pub fn hash(mut self, hash: impl Into<Probed<String>>) -> Self {
        self.hash = Some(hash.into());
        self
    }

    pub fn tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = Some(tags.into_iter().map(Into::into).collect());
        self
    }

    pub fn url(mut self, url: impl Into<Probed<String>>) -> Self {
        self.url = Some(url.into());
        self
    }

    pub fn google(mut self, google: impl Into<Probed<String>>) -> Self {
        self.google = Some(google.into());
        self
    }

    /// Build a pattern from `field=value` terms, e.g. `dir=holiday`,
    /// `tags=cats,dogs`, `size=1024`, `hash=unknown`.
    pub fn parse_terms<S: AsRef<str>>(terms: &[S]) -> Result<Self, Error> {
        let mut pattern = Pattern::new();
        for term in terms {
            let term = term.as_ref();
            let (field, value) = term
                .split_once('=')
                .ok_or_else(|| Error::MalformedQuery(term.to_string()))?;
            match field.trim() {
                "file" => pattern.file = Some(value.to_string()),
                "dir" => pattern.dir = Some(value.to_string()),
                "size" => pattern.size = Some(parse_probed(term, value)?),
                "created" => pattern.created = Some(parse_probed(term, value)?),
                "hash" => pattern.hash = Some(text_probed(value)),
                "url" => pattern.url = Some(text_probed(value)),
                "google" => pattern.google = Some(text_probed(value)),
                "tags" => {
                    pattern.tags = Some(
                        value
                            .split(',')
                            .map(str::trim)
                            .filter(|tag| !tag.is_empty())
                            .map(String::from)
                            .collect(),
                    )
                }
                _ => return Err(Error::MalformedQuery(term.to_string())),
            }
        }
        Ok(pattern)
    }

    pub(crate) fn compile(&self, flags: MatchFlags) -> Result<CompiledPattern<'_>, Error> {
        let compile_text = |value: Option<&String>| -> Result<Option<Regex>, Error> {
            match value {
                Some(value) if flags.use_regex => Ok(Some(Regex::new(value)?)),
                _ => Ok(None),
            }
        };
        let compile_probed = |value: &Option<Probed<String>>| {
            compile_text(value.as_ref().and_then(Probed::known))
        };

        Ok(CompiledPattern {
            pattern: self,
            file: compile_text(self.file.as_ref())?,
            dir: compile_text(self.dir.as_ref())?,
            hash: compile_probed(&self.hash)?,
            url: compile_probed(&self.url)?,
            google: compile_probed(&self.google)?,
        })
    }
}

fn parse_probed<T: std::str::FromStr>(term: &str, value: &str) -> Result<Probed<T>, Error> {
    if value == UNKNOWN_LITERAL {
        return Ok(Probed::Unknown);
    }
    value
        .parse()
        .map(Probed::Known)
        .map_err(|_| Error::MalformedQuery(term.to_string()))
}

fn text_probed(value: &str) -> Probed<String> {
    if value == UNKNOWN_LITERAL {
        Probed::Unknown
    } else {
        Probed::Known(value.to_string())
    }
}

/// A pattern with its regexes built once per query.
pub(crate) struct CompiledPattern<'a> {
    pattern: &'a Pattern,
    file: Option<Regex>,
    dir: Option<Regex>,
    hash: Option<Regex>,
    url: Option<Regex>,
    google: Option<Regex>,
}

impl CompiledPattern<'_> {
    pub(crate) fn matches(&self, record: &MediaRecord) -> bool {
        let p = self.pattern;

        if let Some(tags) = &p.tags {
            if !tags.is_subset(&record.tags) {
                return false;
            }
        }
        if let Some(file) = &p.file {
            if !text_matches(file, self.file.as_ref(), &record.file) {
                return false;
            }
        }
        if let Some(dir) = &p.dir {
            if !text_matches(dir, self.dir.as_ref(), &record.dir) {
                return false;
            }
        }
        if p.size.as_ref().is_some_and(|size| *size != record.size) {
            return false;
        }
        if p.created.as_ref().is_some_and(|created| *created != record.created) {
            return false;
        }
        probed_matches(&p.hash, self.hash.as_ref(), &record.hash)
            && probed_matches(&p.url, self.url.as_ref(), &record.url)
            && probed_matches(&p.google, self.google.as_ref(), &record.google)
    }
}

// A regex hit anywhere in the value counts, as does plain equality.
fn text_matches(expected: &str, regex: Option<&Regex>, actual: &str) -> bool {
    regex.is_some_and(|re| re.is_match(actual)) || expected == actual
}

fn probed_matches(
    expected: &Option<Probed<String>>,
    regex: Option<&Regex>,
    actual: &Probed<String>,
) -> bool {
    match (expected, actual) {
        (None, _) => true,
        (Some(Probed::Known(expected)), Probed::Known(actual)) => {
            text_matches(expected, regex, actual)
        }
        (Some(expected), actual) => expected == actual,
    }
}
