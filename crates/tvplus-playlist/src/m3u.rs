// SPDX-License-Identifier: Apache-2.0

use crate::select::select_channels;
use crate::PlaylistRequest;
use serde::Serialize;
use std::fmt::Write as _;
use tracing::{debug, info};
use tvplus_model::{AppCatalog, Channel};

pub const M3U_HEADER: &str = "#EXTM3U\n";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PlaylistSummary {
    pub regions: Vec<String>,
    pub emitted: usize,
    pub skipped_unplayable: usize,
    pub skipped_include_exclude: usize,
    pub skipped_group: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Playlist {
    pub body: String,
    pub summary: PlaylistSummary,
}

/// Hands out `tvg-chno` values in emission order.
struct ChannelNumbering {
    next: Option<i64>,
}

impl ChannelNumbering {
    fn new(start_chno: Option<i64>) -> Self {
        Self { next: start_chno }
    }

    fn assign(&mut self, channel: &Channel) -> Option<i64> {
        match self.next.as_mut() {
            Some(n) if *n > 0 => {
                let current = *n;
                *n += 1;
                Some(current)
            }
            // Explicit non-positive start disables numbering entirely.
            Some(_) => None,
            None => channel.chno,
        }
    }
}

#[must_use]
pub fn render_entry(key: &str, channel: &Channel, chno: Option<i64>) -> String {
    let mut line = format!(
        "#EXTINF:-1 channel-id=\"{}\" tvg-id=\"{key}\" tvg-logo=\"{}\" group-title=\"{}\"",
        Channel::channel_id(key),
        channel.logo,
        channel.group
    );
    if let Some(n) = chno {
        let _ = write!(line, " tvg-chno=\"{n}\"");
    }
    let _ = write!(line, ",{}\n{}\n", channel.name, channel.url);
    line
}

#[must_use]
pub fn render_playlist(catalog: &AppCatalog, request: &PlaylistRequest) -> Playlist {
    let selection = select_channels(catalog, request);
    info!(regions = ?selection.regions, "including channels from regions");

    let mut summary = PlaylistSummary {
        regions: selection.regions.iter().map(ToString::to_string).collect(),
        ..PlaylistSummary::default()
    };
    let mut numbering = ChannelNumbering::new(request.start_chno);
    let mut body = String::from(M3U_HEADER);

    for (key, channel) in selection.channels {
        if !channel.is_playable() {
            summary.skipped_unplayable += 1;
            continue;
        }

        let channel_id = Channel::channel_id(key);
        if (!request.include.is_empty() && !request.include.contains(&channel_id))
            || request.exclude.contains(&channel_id)
        {
            debug!(channel_id = %channel_id, "skipping channel due to include / exclude");
            summary.skipped_include_exclude += 1;
            continue;
        }

        if !request.groups.is_empty() && !request.groups.contains(&channel.group.to_lowercase()) {
            debug!(channel_id = %channel_id, "skipping channel due to group filter");
            summary.skipped_group += 1;
            continue;
        }

        let chno = numbering.assign(channel);
        body.push_str(&render_entry(key, channel, chno));
        summary.emitted += 1;
    }

    Playlist { body, summary }
}
