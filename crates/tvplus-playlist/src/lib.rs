// SPDX-License-Identifier: Apache-2.0

#![forbid(unsafe_code)]
//! Playlist generation for the Samsung TV Plus catalog.
//!
//! Pure functions only: callers fetch the catalog, build a
//! [`PlaylistRequest`] from query parameters and render it.

mod error;
mod m3u;
mod params;
mod select;

pub use error::PlaylistError;
pub use m3u::{render_entry, render_playlist, Playlist, PlaylistSummary, M3U_HEADER};
pub use params::{
    parse_groups, parse_id_list, PlaylistDefaults, PlaylistRequest, RegionSelection, SortOrder,
    REGION_ALL,
};
pub use select::{merge_channels, order_channels, select_channels, selected_regions, ChannelSelection};

pub const CRATE_NAME: &str = "tvplus-playlist";
