// SPDX-License-Identifier: Apache-2.0

use crate::{PlaylistRequest, SortOrder};
use indexmap::IndexMap;
use tvplus_model::{AppCatalog, Channel};

/// Channels of the selected regions, merged and ordered for rendering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelSelection<'a> {
    pub regions: Vec<&'a str>,
    pub channels: Vec<(&'a str, &'a Channel)>,
}

#[must_use]
pub fn selected_regions<'a>(catalog: &'a AppCatalog, request: &PlaylistRequest) -> Vec<&'a str> {
    catalog
        .region_codes()
        .filter(|code| request.regions.matches(code))
        .collect()
}

/// Later regions win on duplicate channel keys, but the key keeps the
/// position of its first occurrence.
#[must_use]
pub fn merge_channels<'a>(
    catalog: &'a AppCatalog,
    regions: &[&'a str],
) -> IndexMap<&'a str, &'a Channel> {
    let mut merged: IndexMap<&str, &Channel> = IndexMap::new();
    for code in regions {
        if let Some(region) = catalog.regions.get(*code) {
            for (key, channel) in &region.channels {
                merged.insert(key.as_str(), channel);
            }
        }
    }
    merged
}

pub fn order_channels(channels: &mut [(&str, &Channel)], sort: SortOrder) {
    match sort {
        SortOrder::ChannelNumber => {
            channels.sort_by_key(|(_, c)| (c.chno.is_none(), c.chno));
        }
        SortOrder::Name => {
            channels.sort_by_cached_key(|(_, c)| c.sort_name());
        }
    }
}

#[must_use]
pub fn select_channels<'a>(
    catalog: &'a AppCatalog,
    request: &PlaylistRequest,
) -> ChannelSelection<'a> {
    let regions = selected_regions(catalog, request);
    let mut channels: Vec<(&str, &Channel)> = merge_channels(catalog, &regions).into_iter().collect();
    order_channels(&mut channels, request.sort);
    ChannelSelection { regions, channels }
}
