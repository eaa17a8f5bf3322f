// SPDX-License-Identifier: Apache-2.0

mod support;

use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;
use support::{fixture_catalog, header, send_raw, send_raw_bytes, spawn_app};
use tvplus_server::{FakeChannelSource, ServerConfig, PAGE_TITLE};

fn fake_source() -> Arc<FakeChannelSource> {
    Arc::new(FakeChannelSource::with_catalog(fixture_catalog()))
}

#[tokio::test]
async fn playlist_defaults_to_all_regions_in_channel_number_order() {
    let (addr, _) = spawn_app(fake_source(), ServerConfig::default()).await;
    let (status, head, body) = send_raw(addr, "/playlist.m3u8", &[]).await;
    assert_eq!(status, 200);
    assert_eq!(
        header(&head, "content-type"),
        Some("application/vnd.apple.mpegurl")
    );
    assert!(body.starts_with("#EXTM3U\n"));
    let ids: Vec<&str> = body
        .lines()
        .filter_map(|l| l.split("tvg-id=\"").nth(1))
        .filter_map(|rest| rest.split('"').next())
        .collect();
    assert_eq!(ids, vec!["US200", "GB100", "US100"]);
    assert!(!body.contains("US300"), "drm channels are never emitted");
    assert!(header(&head, "x-request-id").is_some_and(|v| v.starts_with("req-")));
}

#[tokio::test]
async fn playlist_query_filters_and_renumbers() {
    let (addr, _) = spawn_app(fake_source(), ServerConfig::default()).await;
    let (status, _, body) = send_raw(
        addr,
        "/playlist.m3u8?regions=us&groups=news,movies&start_chno=500&sort=name",
        &[],
    )
    .await;
    assert_eq!(status, 200);
    let entries: Vec<&str> = body.lines().filter(|l| l.starts_with("#EXTINF")).collect();
    assert_eq!(entries.len(), 2);
    assert!(entries[0].contains("tvg-id=\"US200\"") && entries[0].contains("tvg-chno=\"500\""));
    assert!(entries[1].contains("tvg-id=\"US100\"") && entries[1].contains("tvg-chno=\"501\""));

    let (_, _, body) = send_raw(
        addr,
        "/playlist.m3u8?groups=Kids%2520%2526%2520Family",
        &[],
    )
    .await;
    let entries: Vec<&str> = body.lines().filter(|l| l.starts_with("#EXTINF")).collect();
    assert_eq!(entries.len(), 1);
    assert!(entries[0].ends_with(",Charlie Kids"));

    let (_, _, body) = send_raw(
        addr,
        "/playlist.m3u8?include=samsung-US100,samsung-GB100&exclude=samsung-GB100",
        &[],
    )
    .await;
    let entries: Vec<&str> = body.lines().filter(|l| l.starts_with("#EXTINF")).collect();
    assert_eq!(entries.len(), 1);
    assert!(entries[0].contains("channel-id=\"samsung-US100\""));
}

#[tokio::test]
async fn playlist_environment_defaults_apply_when_query_is_empty() {
    let mut cfg = ServerConfig::default();
    cfg.playlist_defaults.regions = Some("gb".to_string());
    let (addr, _) = spawn_app(fake_source(), cfg).await;

    let (_, _, body) = send_raw(addr, "/playlist.m3u8?regions=", &[]).await;
    assert!(body.contains("tvg-id=\"GB100\""));
    assert!(!body.contains("tvg-id=\"US100\""));

    let (_, _, body) = send_raw(addr, "/playlist.m3u8?regions=us", &[]).await;
    assert!(!body.contains("tvg-id=\"GB100\""));
}

#[tokio::test]
async fn playlist_suffix_paths_are_served_as_playlists() {
    let (addr, _) = spawn_app(fake_source(), ServerConfig::default()).await;
    let (status, head, body) = send_raw(addr, "/playlist.m3u8/channels.m3u8", &[]).await;
    assert_eq!(status, 200);
    assert_eq!(
        header(&head, "content-type"),
        Some("application/vnd.apple.mpegurl")
    );
    assert!(body.starts_with("#EXTM3U"));

    let (status, _, body) = send_raw(addr, "/playlist.m3u8/?regions=gb", &[]).await;
    assert_eq!(status, 200);
    assert!(body.contains("tvg-id=\"GB100\""));
    assert!(!body.contains("tvg-id=\"US100\""));

    let (status, _, _) = send_raw(addr, "/favicon.ico/extra", &[]).await;
    assert_eq!(status, 404);
}

#[tokio::test]
async fn invalid_start_number_is_rejected() {
    let (addr, _) = spawn_app(fake_source(), ServerConfig::default()).await;
    let (status, head, body) = send_raw(addr, "/playlist.m3u8?start_chno=abc", &[]).await;
    assert_eq!(status, 400);
    assert!(header(&head, "content-type").is_some_and(|v| v.starts_with("text/plain")));
    assert!(body.starts_with("Error: invalid query parameter start_chno"));
}

#[tokio::test]
async fn upstream_failure_without_cached_catalog_returns_error_body() {
    let source = fake_source();
    source.set_failing(true);
    let (addr, _) = spawn_app(source, ServerConfig::default()).await;

    let (status, _, body) = send_raw(addr, "/playlist.m3u8", &[]).await;
    assert_eq!(status, 500);
    assert!(body.starts_with("Error: "), "body: {body}");
    assert!(body.contains("503"));

    let (status, _, body) = send_raw(addr, "/", &[]).await;
    assert_eq!(status, 500);
    assert!(body.starts_with("Error: "));
}

#[tokio::test]
async fn stale_catalog_is_served_when_refresh_fails() {
    let source = fake_source();
    let cfg = ServerConfig {
        catalog_ttl: Duration::ZERO,
        ..ServerConfig::default()
    };
    let (addr, _) = spawn_app(source.clone(), cfg).await;

    let (status, _, _) = send_raw(addr, "/playlist.m3u8", &[]).await;
    assert_eq!(status, 200);
    source.set_failing(true);
    let (status, _, body) = send_raw(addr, "/playlist.m3u8", &[]).await;
    assert_eq!(status, 200);
    assert!(body.contains("tvg-id=\"US100\""));
    assert!(source.catalog_calls.load(Ordering::Relaxed) >= 2);
}

#[tokio::test]
async fn epg_passes_upstream_status_and_bytes_through() {
    let source = FakeChannelSource {
        epg_status: 200,
        ..FakeChannelSource::default()
    };
    *source.epg_chunks.lock().await = vec![vec![0x1f, 0x8b, 0x08], b"guide-bytes".to_vec()];
    let source = Arc::new(source);
    let (addr, _) = spawn_app(source.clone(), ServerConfig::default()).await;

    let (status, head, body) = send_raw_bytes(addr, "/epg.xml.gz", &[]).await;
    assert_eq!(status, 200);
    assert_eq!(header(&head, "content-type"), Some("application/gzip"));
    let mut expected = vec![0x1f, 0x8b, 0x08];
    expected.extend_from_slice(b"guide-bytes");
    assert_eq!(body, expected);

    let (status, _, _) = send_raw_bytes(addr, "/epg.xml.gz/guide.xml.gz", &[]).await;
    assert_eq!(status, 200);
    let (status, _, body) = send_raw_bytes(addr, "/epg.xml.gz/", &[]).await;
    assert_eq!(status, 200);
    assert_eq!(body, expected);
    assert_eq!(source.epg_calls.load(Ordering::Relaxed), 3);
}

#[tokio::test]
async fn epg_forwards_non_success_status() {
    let source = Arc::new(FakeChannelSource {
        epg_status: 404,
        ..FakeChannelSource::default()
    });
    let (addr, _) = spawn_app(source, ServerConfig::default()).await;
    let (status, _, _) = send_raw_bytes(addr, "/epg.xml.gz", &[]).await;
    assert_eq!(status, 404);
}

#[tokio::test]
async fn status_page_links_use_request_host() {
    let (addr, _) = spawn_app(fake_source(), ServerConfig::default()).await;
    let (status, head, body) = send_raw(addr, "/", &[("Host", "tv.lan:8080")]).await;
    assert_eq!(status, 200);
    assert!(header(&head, "content-type").is_some_and(|v| v.starts_with("text/html")));
    assert!(body.contains(PAGE_TITLE));
    assert!(body.contains("http://tv.lan:8080/playlist.m3u8"));
    assert!(body.contains("http://tv.lan:8080/epg.xml.gz"));
    assert!(body.contains("?regions=us&amp;groups=News"));
    assert!(body.contains("?regions=gb&amp;groups=Kids%20%26%20Family"));
    assert!(body.find("United States") < body.find("United Kingdom"));
}

#[tokio::test]
async fn status_page_falls_back_to_localhost_for_blank_host() {
    let (addr, _) = spawn_app(fake_source(), ServerConfig::default()).await;
    let (status, _, body) = send_raw(addr, "/", &[("Host", "")]).await;
    assert_eq!(status, 200);
    assert!(body.contains("href=\"http://localhost/playlist.m3u8\""));
    assert!(body.contains("http://localhost/epg.xml.gz"));
}

#[tokio::test]
async fn favicon_is_read_from_configured_path() {
    let dir = tempfile::tempdir().expect("tempdir");
    let icon = dir.path().join("favicon.ico");
    std::fs::write(&icon, [0u8, 0, 1, 0]).expect("write icon");
    let cfg = ServerConfig {
        favicon_path: icon,
        ..ServerConfig::default()
    };
    let (addr, _) = spawn_app(fake_source(), cfg).await;
    let (status, head, body) = send_raw_bytes(addr, "/favicon.ico", &[]).await;
    assert_eq!(status, 200);
    assert_eq!(header(&head, "content-type"), Some("image/x-icon"));
    assert_eq!(body, vec![0u8, 0, 1, 0]);

    let cfg = ServerConfig {
        favicon_path: dir.path().join("missing.ico"),
        ..ServerConfig::default()
    };
    let (addr, _) = spawn_app(fake_source(), cfg).await;
    let (status, _, _) = send_raw_bytes(addr, "/favicon.ico", &[]).await;
    assert_eq!(status, 404);
}

#[tokio::test]
async fn unknown_paths_return_not_found() {
    let (addr, _) = spawn_app(fake_source(), ServerConfig::default()).await;
    let (status, head, _) = send_raw(addr, "/channels.json", &[]).await;
    assert_eq!(status, 404);
    assert!(header(&head, "x-request-id").is_some());
}

#[tokio::test]
async fn readiness_follows_catalog_and_drain_state() {
    let source = fake_source();
    source.set_failing(true);
    let (addr, state) = spawn_app(source.clone(), ServerConfig::default()).await;

    let (status, _, body) = send_raw(addr, "/healthz", &[]).await;
    assert_eq!((status, body.as_str()), (200, "ok"));

    let (status, head, body) = send_raw(addr, "/readyz", &[]).await;
    assert_eq!((status, body.as_str()), (503, "not-ready"));
    assert_eq!(header(&head, "retry-after"), Some("3"));

    source.set_failing(false);
    state.catalog.refresh().await.expect("refresh");
    let (status, _, body) = send_raw(addr, "/readyz", &[]).await;
    assert_eq!((status, body.as_str()), (200, "ready"));

    state.begin_shutdown_drain();
    let (status, _, _) = send_raw(addr, "/readyz", &[]).await;
    assert_eq!(status, 503);
}

#[tokio::test]
async fn readiness_can_ignore_catalog_state() {
    let source = fake_source();
    source.set_failing(true);
    let cfg = ServerConfig {
        readiness_requires_catalog: false,
        ..ServerConfig::default()
    };
    let (addr, _) = spawn_app(source, cfg).await;
    let (status, _, _) = send_raw(addr, "/readyz", &[]).await;
    assert_eq!(status, 200);
}

#[tokio::test]
async fn metrics_report_catalog_and_request_counters() {
    let (addr, _) = spawn_app(fake_source(), ServerConfig::default()).await;
    let _ = send_raw(addr, "/playlist.m3u8", &[]).await;
    let _ = send_raw(addr, "/playlist.m3u8", &[]).await;

    let (status, head, body) = send_raw(addr, "/metrics", &[]).await;
    assert_eq!(status, 200);
    assert!(header(&head, "content-type").is_some_and(|v| v.starts_with("text/plain")));
    assert!(body.contains("tvplus_build_info{version="));
    assert!(body.contains("tvplus_catalog_refresh_total 1"));
    assert!(body.contains("tvplus_catalog_cache_hits_total 1"));
    assert!(body.contains("tvplus_catalog_channels 4"));
    assert!(body.contains("tvplus_catalog_loaded 1"));
    assert!(body.contains(
        "tvplus_http_requests_total{route=\"/playlist.m3u8\",status=\"200\"} 2"
    ));
}

#[tokio::test]
async fn correlation_id_header_is_accepted() {
    let (addr, _) = spawn_app(fake_source(), ServerConfig::default()).await;
    let (status, head, _) = send_raw(addr, "/healthz", &[("x-correlation-id", "abc-123")]).await;
    assert_eq!(status, 200);
    assert!(header(&head, "x-request-id").is_some());
}
