use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// Tag given to every record added without explicit tags.
pub const DEFAULT_TAG: &str = "Unsorted";

/// A value read from the filesystem (or supplied by the user) that may be
/// unavailable. Probe failures are recorded as `Unknown`, never as errors.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Probed<T> {
    Known(T),
    Unknown,
}

impl<T> Default for Probed<T> {
    fn default() -> Self {
        Probed::Unknown
    }
}

impl<T> Probed<T> {
    pub fn known(&self) -> Option<&T> {
        match self {
            Probed::Known(value) => Some(value),
            Probed::Unknown => None,
        }
    }

    pub fn is_known(&self) -> bool {
        matches!(self, Probed::Known(_))
    }
}

impl<T> From<Option<T>> for Probed<T> {
    fn from(value: Option<T>) -> Self {
        match value {
            Some(value) => Probed::Known(value),
            None => Probed::Unknown,
        }
    }
}

impl From<&str> for Probed<String> {
    fn from(value: &str) -> Self {
        Probed::Known(value.to_string())
    }
}

impl From<String> for Probed<String> {
    fn from(value: String) -> Self {
        Probed::Known(value)
    }
}

impl From<u64> for Probed<u64> {
    fn from(value: u64) -> Self {
        Probed::Known(value)
    }
}

impl From<i64> for Probed<i64> {
    fn from(value: i64) -> Self {
        Probed::Known(value)
    }
}

impl<T: fmt::Display> fmt::Display for Probed<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Probed::Known(value) => value.fmt(f),
            Probed::Unknown => f.write_str("unknown"),
        }
    }
}

/// One cataloged file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaRecord {
    pub file: String,
    pub dir: String,
    pub size: Probed<u64>,
    pub created: Probed<i64>,
    pub hash: Probed<String>,
    pub tags: BTreeSet<String>,
    pub url: Probed<String>,
    pub google: Probed<String>,
}

impl fmt::Display for MediaRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tags: Vec<&str> = self.tags.iter().map(String::as_str).collect();
        write!(
            f,
            "{}/{} size={} created={} hash={} tags=[{}] url={} google={}",
            self.dir,
            self.file,
            self.size,
            self.created,
            self.hash,
            tags.join(", "),
            self.url,
            self.google,
        )
    }
}

/// Input to `Catalog::add`. Fields left as `None` are probed or defaulted.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MediaDraft {
    pub file: Option<String>,
    pub dir: Option<String>,
    pub size: Option<Probed<u64>>,
    pub created: Option<Probed<i64>>,
    pub hash: Option<Probed<String>>,
    pub tags: Option<BTreeSet<String>>,
    pub url: Option<Probed<String>>,
    pub google: Option<Probed<String>>,
}

impl MediaDraft {
    pub fn new(file: impl Into<String>) -> Self {
        Self {
            file: Some(file.into()),
            ..Self::default()
        }
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
}

impl From<MediaRecord> for MediaDraft {
    fn from(record: MediaRecord) -> Self {
        Self {
            file: Some(record.file),
            dir: Some(record.dir),
            size: Some(record.size),
            created: Some(record.created),
            hash: Some(record.hash),
            tags: Some(record.tags),
            url: Some(record.url),
            google: Some(record.google),
        }
    }
}

/// Field-by-field overwrite applied by `Catalog::update`. Tags are not
/// patchable because the tag index is not rebalanced on update.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Patch {
    pub file: Option<String>,
    pub dir: Option<String>,
    pub size: Option<Probed<u64>>,
    pub created: Option<Probed<i64>>,
    pub hash: Option<Probed<String>>,
    pub url: Option<Probed<String>>,
    pub google: Option<Probed<String>>,
}

impl Patch {
    pub fn new() -> Self {
        Self::default()
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

    pub fn url(mut self, url: impl Into<Probed<String>>) -> Self {
        self.url = Some(url.into());
        self
    }

    pub fn google(mut self, google: impl Into<Probed<String>>) -> Self {
        self.google = Some(google.into());
        self
    }

    pub fn apply(&self, record: &mut MediaRecord) {
        if let Some(file) = &self.file {
            record.file = file.clone();
        }
        if let Some(dir) = &self.dir {
            record.dir = dir.clone();
        }
        if let Some(size) = &self.size {
            record.size = size.clone();
        }
        if let Some(created) = &self.created {
            record.created = created.clone();
        }
        if let Some(hash) = &self.hash {
            record.hash = hash.clone();
        }
        if let Some(url) = &self.url {
            record.url = url.clone();
        }
        if let Some(google) = &self.google {
            record.google = google.clone();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_patch_overwrites_only_given_fields() {
        let mut record = MediaRecord {
            file: "a.jpg".to_string(),
            dir: "pics".to_string(),
            size: Probed::Known(10),
            created: Probed::Unknown,
            hash: Probed::Known("old".to_string()),
            tags: [DEFAULT_TAG.to_string()].into_iter().collect(),
            url: Probed::Unknown,
            google: Probed::Unknown,
        };

        Patch::new().hash("new").dir("moved").apply(&mut record);

        assert_eq!(record.hash, Probed::Known("new".to_string()));
        assert_eq!(record.dir, "moved");
        assert_eq!(record.file, "a.jpg");
        assert_eq!(record.size, Probed::Known(10));
    }

    #[test]
    fn test_probed_display() {
        assert_eq!(Probed::Known(42u64).to_string(), "42");
        assert_eq!(Probed::<u64>::Unknown.to_string(), "unknown");
    }
}
