// SPDX-License-Identifier: Apache-2.0

//! HTML landing page listing the playlist and guide URLs plus one playlist
//! link per region and per region/group pair.

use crate::http::handlers::{EPG_PATH, PLAYLIST_PATH};
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use std::fmt::Write as _;
use tvplus_model::AppCatalog;

pub const PAGE_TITLE: &str = "Samsung TV Plus for Channels";

/// Unreserved characters plus `/` stay literal, as URL path quoting does.
const QUERY_VALUE: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'_')
    .remove(b'.')
    .remove(b'-')
    .remove(b'~')
    .remove(b'/');

#[must_use]
pub fn quote(value: &str) -> String {
    utf8_percent_encode(value, QUERY_VALUE).to_string()
}

#[must_use]
pub fn escape_html(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

#[must_use]
pub fn render_status_page(catalog: &AppCatalog, host: &str) -> String {
    let host = escape_html(host);
    let playlist_url = format!("http://{host}{PLAYLIST_PATH}");
    let epg_url = format!("http://{host}{EPG_PATH}");

    let mut html = format!(
        "<!doctype html><html><head><meta charset=\"utf-8\"><title>{PAGE_TITLE}</title>\
<link rel=\"icon\" href=\"/favicon.ico\" type=\"image/x-icon\"></head><body>\
<h1>{PAGE_TITLE}</h1>\
<p>Playlist URL: <b><a href=\"{playlist_url}\">{playlist_url}</a></b></p>\
<p>EPG URL (Set to refresh every 1 hour): <b><a href=\"{epg_url}\">{epg_url}</a></b></p>\
<h2>Available regions &amp; groups</h2>"
    );

    for (code, region) in &catalog.regions {
        let region_q = quote(code);
        let _ = write!(
            html,
            "<h3><a href=\"{playlist_url}?regions={region_q}\">{}</a> ({})</h3><ul>",
            escape_html(&region.name),
            escape_html(code)
        );
        for group in region.group_titles() {
            let _ = write!(
                html,
                "<li><a href=\"{playlist_url}?regions={region_q}&amp;groups={}\">{}</a></li>",
                quote(group),
                escape_html(group)
            );
        }
        html.push_str("</ul>");
    }

    html.push_str("</body></html>");
    html
}

#[cfg(test)]
mod tests {
    use super::*;
    use tvplus_model::{Channel, Region};

    #[test]
    fn quote_encodes_spaces_and_reserved_characters() {
        assert_eq!(quote("Kids & Family"), "Kids%20%26%20Family");
        assert_eq!(quote("us"), "us");
        assert_eq!(quote("a/b_c.d-e~f"), "a/b_c.d-e~f");
        assert_eq!(quote("Télé"), "T%C3%A9l%C3%A9");
    }

    #[test]
    fn page_lists_regions_in_order_with_sorted_groups() {
        let mut regions = indexmap::IndexMap::new();
        regions.insert(
            "us".to_string(),
            Region::new("United States")
                .with_channel("a", Channel::new("A", "http://a").with_group("News"))
                .with_channel("b", Channel::new("B", "http://b").with_group("Kids & Family")),
        );
        regions.insert("gb".to_string(), Region::new("United <Kingdom>"));
        let html = render_status_page(&AppCatalog::new(regions), "tv.local:8080");

        assert!(html.contains("<title>Samsung TV Plus for Channels</title>"));
        assert!(html.contains("href=\"http://tv.local:8080/playlist.m3u8\""));
        assert!(html.contains("href=\"http://tv.local:8080/epg.xml.gz\""));
        let us = html.find("(us)").expect("us region");
        let gb = html.find("(gb)").expect("gb region");
        assert!(us < gb);
        let kids = html
            .find("?regions=us&amp;groups=Kids%20%26%20Family\">Kids &amp; Family</a>")
            .expect("kids link");
        let news = html.find("groups=News\">News</a>").expect("news link");
        assert!(kids < news);
        assert!(html.contains("United &lt;Kingdom&gt;"));
    }
}
