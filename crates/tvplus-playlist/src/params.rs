// SPDX-License-Identifier: Apache-2.0

use crate::PlaylistError;
use percent_encoding::percent_decode_str;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

pub const REGION_ALL: &str = "all";

/// Fallbacks applied when a request does not carry `regions` / `groups`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaylistDefaults {
    pub regions: Option<String>,
    pub groups: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SortOrder {
    #[default]
    ChannelNumber,
    Name,
}

impl SortOrder {
    #[must_use]
    pub fn parse(input: Option<&str>) -> Self {
        match input {
            None | Some("chno") => Self::ChannelNumber,
            Some(_) => Self::Name,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum RegionSelection {
    All,
    Only(Vec<String>),
}

impl RegionSelection {
    /// Comma list, trimmed and lowercased; any `all` token selects every region.
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        let tokens: Vec<String> = raw
            .split(',')
            .map(|t| t.trim().to_lowercase())
            .collect();
        if tokens.iter().any(|t| t == REGION_ALL) {
            Self::All
        } else {
            Self::Only(tokens)
        }
    }

    #[must_use]
    pub fn matches(&self, region_code: &str) -> bool {
        match self {
            Self::All => true,
            Self::Only(codes) => {
                let lowered = region_code.to_lowercase();
                codes.iter().any(|c| *c == lowered)
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaylistRequest {
    pub regions: RegionSelection,
    pub groups: Vec<String>,
    pub start_chno: Option<i64>,
    pub sort: SortOrder,
    pub include: Vec<String>,
    pub exclude: Vec<String>,
}

impl Default for PlaylistRequest {
    fn default() -> Self {
        Self {
            regions: RegionSelection::All,
            groups: Vec::new(),
            start_chno: None,
            sort: SortOrder::ChannelNumber,
            include: Vec::new(),
            exclude: Vec::new(),
        }
    }
}

impl PlaylistRequest {
    pub fn from_params(
        params: &HashMap<String, String>,
        defaults: &PlaylistDefaults,
    ) -> Result<Self, PlaylistError> {
        let regions_raw = non_empty(params.get("regions"))
            .or(defaults.regions.as_deref())
            .unwrap_or(REGION_ALL);
        let groups_raw = non_empty(params.get("groups"))
            .or(defaults.groups.as_deref())
            .unwrap_or("");
        let start_chno = params
            .get("start_chno")
            .map(|raw| {
                raw.trim().parse::<i64>().map_err(|_| {
                    PlaylistError::invalid("start_chno", format!("expected an integer, got {raw:?}"))
                })
            })
            .transpose()?;

        Ok(Self {
            regions: RegionSelection::parse(regions_raw),
            groups: parse_groups(groups_raw),
            start_chno,
            sort: SortOrder::parse(params.get("sort").map(String::as_str)),
            include: parse_id_list(params.get("include").map(String::as_str)),
            exclude: parse_id_list(params.get("exclude").map(String::as_str)),
        })
    }
}

fn non_empty(value: Option<&String>) -> Option<&str> {
    value.map(String::as_str).filter(|v| !v.is_empty())
}

/// Group names may arrive percent-encoded a second time (links on the status
/// page encode them before the query string is built), so each token is
/// decoded once more here.
#[must_use]
pub fn parse_groups(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|g| percent_decode_str(g).decode_utf8_lossy().to_lowercase())
        .filter(|g| !g.is_empty())
        .collect()
}

#[must_use]
pub fn parse_id_list(raw: Option<&str>) -> Vec<String> {
    raw.unwrap_or_default()
        .split(',')
        .filter(|x| !x.is_empty())
        .map(ToString::to_string)
        .collect()
}
