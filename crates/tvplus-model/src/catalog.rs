// SPDX-License-Identifier: Apache-2.0

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt::{Display, Formatter};

pub const CHANNEL_ID_PREFIX: &str = "samsung-";
pub const REGION_CODE_MAX_LEN: usize = 32;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError(pub String);

impl Display for ValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::error::Error for ValidationError {}

/// The upstream `.app.json` document.
///
/// Region and channel maps keep document order: playlists built from the
/// catalog rely on it for region precedence and for stable sort ties.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AppCatalog {
    pub regions: IndexMap<String, Region>,
}

impl AppCatalog {
    #[must_use]
    pub fn new(regions: IndexMap<String, Region>) -> Self {
        Self { regions }
    }

    pub fn from_slice(bytes: &[u8]) -> Result<Self, ValidationError> {
        let catalog: Self = serde_json::from_slice(bytes)
            .map_err(|e| ValidationError(format!("catalog parse failed: {e}")))?;
        catalog.validate()?;
        Ok(catalog)
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        for (code, region) in &self.regions {
            if code.trim().is_empty() {
                return Err(ValidationError("region code must not be empty".to_string()));
            }
            if code.len() > REGION_CODE_MAX_LEN {
                return Err(ValidationError(format!(
                    "region code exceeds max length {REGION_CODE_MAX_LEN}: {code}"
                )));
            }
            for (key, channel) in &region.channels {
                if key.trim().is_empty() {
                    return Err(ValidationError(format!(
                        "region {code} contains a channel with an empty key"
                    )));
                }
                if channel.name.trim().is_empty() {
                    return Err(ValidationError(format!(
                        "channel {key} in region {code} has an empty name"
                    )));
                }
            }
        }
        Ok(())
    }

    pub fn region_codes(&self) -> impl Iterator<Item = &str> {
        self.regions.keys().map(String::as_str)
    }

    #[must_use]
    pub fn channel_count(&self) -> usize {
        self.regions.values().map(|r| r.channels.len()).sum()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Region {
    pub name: String,
    #[serde(default)]
    pub channels: IndexMap<String, Channel>,
}

impl Region {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            channels: IndexMap::new(),
        }
    }

    #[must_use]
    pub fn with_channel(mut self, key: impl Into<String>, channel: Channel) -> Self {
        self.channels.insert(key.into(), channel);
        self
    }

    /// Distinct non-empty group titles, sorted.
    #[must_use]
    pub fn group_titles(&self) -> Vec<&str> {
        self.channels
            .values()
            .map(|c| c.group.as_str())
            .filter(|g| !g.is_empty())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Channel {
    #[serde(default)]
    pub chno: Option<i64>,
    pub name: String,
    #[serde(default)]
    pub logo: String,
    #[serde(default)]
    pub group: String,
    #[serde(default)]
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub license_url: Option<String>,
}

impl Channel {
    #[must_use]
    pub fn new(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_group(mut self, group: impl Into<String>) -> Self {
        self.group = group.into();
        self
    }

    #[must_use]
    pub fn with_logo(mut self, logo: impl Into<String>) -> Self {
        self.logo = logo.into();
        self
    }

    #[must_use]
    pub fn with_chno(mut self, chno: i64) -> Self {
        self.chno = Some(chno);
        self
    }

    #[must_use]
    pub fn with_license_url(mut self, license_url: impl Into<String>) -> Self {
        self.license_url = Some(license_url.into());
        self
    }

    #[must_use]
    pub fn channel_id(key: &str) -> String {
        format!("{CHANNEL_ID_PREFIX}{key}")
    }

    /// DRM-protected channels and channels without a stream are never listed.
    #[must_use]
    pub fn is_playable(&self) -> bool {
        !self.url.is_empty() && self.license_url.as_deref().is_none_or(str::is_empty)
    }

    #[must_use]
    pub fn sort_name(&self) -> String {
        self.name.trim().to_lowercase()
    }
}
