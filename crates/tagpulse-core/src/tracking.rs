use std::collections::HashSet;
use std::path::Path;

use indexmap::IndexMap;
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use serde::{Deserialize, Serialize};

use crate::ConfigError;

/// RFC 3986 unreserved characters pass through; everything else is escaped.
const QUERY_ENCODE_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

const TEMPLATE_SLOT: &str = "{}";

/// Which adapter a platform's URL feeds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlatformKind {
    Posts,
    Forum,
    Video,
}

impl PlatformKind {
    /// Infer the kind from a well-known platform name (case-insensitive).
    ///
    /// Returns `None` for platforms that are only shown as links.
    #[must_use]
    pub fn infer(platform_name: &str) -> Option<Self> {
        match platform_name.trim().to_lowercase().as_str() {
            "bluesky" | "posts" | "social" => Some(Self::Posts),
            "reddit" | "forum" => Some(Self::Forum),
            "youtube" | "video" => Some(Self::Video),
            _ => None,
        }
    }
}

impl std::fmt::Display for PlatformKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PlatformKind::Posts => write!(f, "posts"),
            PlatformKind::Forum => write!(f, "forum"),
            PlatformKind::Video => write!(f, "video"),
        }
    }
}

/// Strip surrounding whitespace and any leading `#` from a tag.
#[must_use]
pub fn clean_tag(raw: &str) -> &str {
    raw.trim().trim_start_matches('#').trim()
}

/// Substitute the percent-encoded tag into every `{}` slot of a URL template.
#[must_use]
pub fn render_url(template: &str, tag: &str) -> String {
    let encoded = utf8_percent_encode(clean_tag(tag), QUERY_ENCODE_SET).to_string();
    template.replace(TEMPLATE_SLOT, &encoded)
}

/// The tracking file: which tags to follow and where each platform searches them.
///
/// Unknown top-level keys are carried through `extra` so rewriting the file
/// (e.g. after adding a tag) does not drop fields owned by other tools.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TrackingConfig {
    #[serde(default)]
    pub hashtags: Vec<String>,
    #[serde(default)]
    pub platform_url_templates: IndexMap<String, String>,
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub platform_kinds: IndexMap<String, PlatformKind>,
    #[serde(flatten)]
    pub extra: IndexMap<String, serde_json::Value>,
}

/// One configured tag with its fully-formed per-platform query URLs.
#[derive(Debug, Clone, PartialEq)]
pub struct TrackedTag {
    pub tag: String,
    pub platform_urls: IndexMap<String, String>,
    pub platform_kinds: IndexMap<String, PlatformKind>,
}

impl TrackedTag {
    /// URL of the first platform of the given kind, if one is configured.
    #[must_use]
    pub fn url_for(&self, kind: PlatformKind) -> Option<&str> {
        self.platform_kinds
            .iter()
            .find(|(_, k)| **k == kind)
            .and_then(|(name, _)| self.platform_urls.get(name))
            .map(String::as_str)
    }
}

impl TrackingConfig {
    /// Load and validate the tracking configuration.
    ///
    /// `.yaml`/`.yml` files are parsed as YAML; anything else as JSON.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the file cannot be read, parsed, or fails validation.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::TrackingFileIo {
            path: path.display().to_string(),
            source: e,
        })?;

        let parse_err = |reason: String| ConfigError::TrackingFileParse {
            path: path.display().to_string(),
            reason,
        };

        let config: TrackingConfig = if is_yaml(path) {
            serde_yaml::from_str(&content).map_err(|e| parse_err(e.to_string()))?
        } else {
            serde_json::from_str(&content).map_err(|e| parse_err(e.to_string()))?
        };

        config.validate()?;
        Ok(config)
    }

    /// Atomically rewrite the tracking file in the format implied by its extension.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if serialization or the write fails.
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let write_err = |source: std::io::Error| ConfigError::TrackingFileWrite {
            path: path.display().to_string(),
            source,
        };

        let body = if is_yaml(path) {
            serde_yaml::to_string(self).map_err(|e| write_err(std::io::Error::other(e)))?
        } else {
            let mut json = serde_json::to_string_pretty(self)
                .map_err(|e| write_err(std::io::Error::other(e)))?;
            json.push('\n');
            json
        };

        crate::fs::atomic_write(path, body.as_bytes()).map_err(write_err)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let mut seen = HashSet::new();
        for raw in &self.hashtags {
            let tag = clean_tag(raw);
            if tag.is_empty() {
                return Err(ConfigError::Validation(
                    "hashtag entries must be non-empty".to_string(),
                ));
            }
            if !seen.insert(tag.to_lowercase()) {
                return Err(ConfigError::Validation(format!(
                    "duplicate hashtag: '{tag}'"
                )));
            }
        }

        for (platform, template) in &self.platform_url_templates {
            if !template.contains(TEMPLATE_SLOT) {
                return Err(ConfigError::Validation(format!(
                    "URL template for platform '{platform}' has no '{TEMPLATE_SLOT}' slot"
                )));
            }
        }

        for platform in self.platform_kinds.keys() {
            if !self.platform_url_templates.contains_key(platform) {
                return Err(ConfigError::Validation(format!(
                    "platform_kinds names unknown platform '{platform}'"
                )));
            }
        }

        Ok(())
    }

    /// Kind of a configured platform: explicit override first, then name inference.
    #[must_use]
    pub fn kind_of(&self, platform: &str) -> Option<PlatformKind> {
        self.platform_kinds
            .get(platform)
            .copied()
            .or_else(|| PlatformKind::infer(platform))
    }

    fn build_tag(&self, tag: &str) -> TrackedTag {
        let platform_urls = self
            .platform_url_templates
            .iter()
            .map(|(name, template)| (name.clone(), render_url(template, tag)))
            .collect();
        let platform_kinds = self
            .platform_url_templates
            .keys()
            .filter_map(|name| self.kind_of(name).map(|kind| (name.clone(), kind)))
            .collect();
        TrackedTag {
            tag: tag.to_string(),
            platform_urls,
            platform_kinds,
        }
    }

    /// All configured tags, in configuration order.
    #[must_use]
    pub fn tracked_tags(&self) -> Vec<TrackedTag> {
        self.hashtags
            .iter()
            .map(|raw| self.build_tag(clean_tag(raw)))
            .collect()
    }

    /// Look up one configured tag (case-insensitive, leading `#` ignored).
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::UnknownTag`] if the tag is not configured.
    pub fn tracked_tag(&self, name: &str) -> Result<TrackedTag, ConfigError> {
        let wanted = clean_tag(name).to_lowercase();
        self.hashtags
            .iter()
            .map(|raw| clean_tag(raw))
            .find(|tag| tag.to_lowercase() == wanted)
            .map(|tag| self.build_tag(tag))
            .ok_or_else(|| ConfigError::UnknownTag(clean_tag(name).to_string()))
    }

    /// Add a tag unless it is already tracked (case-insensitive).
    ///
    /// Returns `Ok(true)` when the tag was added, `Ok(false)` when it was
    /// already present.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Validation`] if the tag is blank.
    pub fn add_tag(&mut self, name: &str) -> Result<bool, ConfigError> {
        let tag = clean_tag(name);
        if tag.is_empty() {
            return Err(ConfigError::Validation("tag must be non-empty".to_string()));
        }
        let lower = tag.to_lowercase();
        if self
            .hashtags
            .iter()
            .any(|existing| clean_tag(existing).to_lowercase() == lower)
        {
            return Ok(false);
        }
        self.hashtags.push(tag.to_string());
        Ok(true)
    }
}

fn is_yaml(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("yaml") || ext.eq_ignore_ascii_case("yml"))
}
