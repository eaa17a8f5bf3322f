// SPDX-License-Identifier: Apache-2.0

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::Arc;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tvplus_model::AppCatalog;
use tvplus_server::{build_router, AppState, ChannelSource, ServerConfig};

pub const FIXTURE_APP_JSON: &str = r#"{
  "regions": {
    "us": {
      "name": "United States",
      "channels": {
        "US100": {"chno": 20, "name": "Bravo News", "logo": "https://logo/us100.png", "group": "News", "url": "https://stream/us100.m3u8"},
        "US200": {"chno": 10, "name": "alpha Movies", "logo": "https://logo/us200.png", "group": "Movies", "url": "https://stream/us200.m3u8"},
        "US300": {"chno": 30, "name": "Locked", "logo": "https://logo/us300.png", "group": "Movies", "url": "https://stream/us300.mpd", "license_url": "https://drm/us300"}
      }
    },
    "gb": {
      "name": "United Kingdom",
      "channels": {
        "GB100": {"chno": 15, "name": "Charlie Kids", "logo": "https://logo/gb100.png", "group": "Kids & Family", "url": "https://stream/gb100.m3u8"}
      }
    }
  }
}"#;

pub fn fixture_catalog() -> AppCatalog {
    AppCatalog::from_slice(FIXTURE_APP_JSON.as_bytes()).expect("fixture catalog")
}

pub async fn spawn_app(source: Arc<dyn ChannelSource>, config: ServerConfig) -> (SocketAddr, AppState) {
    let state = AppState::new(source, config);
    let app = build_router(state.clone());
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind listener");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(async move { axum::serve(listener, app).await.expect("serve app") });
    (addr, state)
}

pub async fn send_raw_bytes(
    addr: SocketAddr,
    path: &str,
    headers: &[(&str, &str)],
) -> (u16, String, Vec<u8>) {
    let mut stream = tokio::net::TcpStream::connect(addr)
        .await
        .expect("connect server");
    let mut req = format!("GET {path} HTTP/1.1\r\n");
    if !headers.iter().any(|(k, _)| k.eq_ignore_ascii_case("host")) {
        req.push_str(&format!("Host: {addr}\r\n"));
    }
    req.push_str("Connection: close\r\n");
    for (k, v) in headers {
        req.push_str(&format!("{k}: {v}\r\n"));
    }
    req.push_str("\r\n");
    stream
        .write_all(req.as_bytes())
        .await
        .expect("write request");
    let mut response = Vec::new();
    stream
        .read_to_end(&mut response)
        .await
        .expect("read response");
    let split = response
        .windows(4)
        .position(|w| w == b"\r\n\r\n")
        .expect("http response must have separator");
    let head = String::from_utf8_lossy(&response[..split]).to_string();
    let body = response[split + 4..].to_vec();
    let status = head
        .lines()
        .next()
        .and_then(|line| line.split_whitespace().nth(1))
        .and_then(|s| s.parse::<u16>().ok())
        .expect("http status");
    let head_lower = head.to_ascii_lowercase();
    let body = if head_lower.contains("transfer-encoding: chunked") {
        dechunk(&body)
    } else {
        body
    };
    (status, head, body)
}

pub async fn send_raw(addr: SocketAddr, path: &str, headers: &[(&str, &str)]) -> (u16, String, String) {
    let (status, head, body) = send_raw_bytes(addr, path, headers).await;
    (status, head, String::from_utf8(body).expect("utf8 body"))
}

pub fn header<'a>(head: &'a str, name: &str) -> Option<&'a str> {
    head.lines().find_map(|line| {
        let (k, v) = line.split_once(':')?;
        k.trim().eq_ignore_ascii_case(name).then(|| v.trim())
    })
}

fn dechunk(mut body: &[u8]) -> Vec<u8> {
    let mut out = Vec::new();
    loop {
        let Some(line_end) = body.windows(2).position(|w| w == b"\r\n") else {
            return out;
        };
        let size_str = String::from_utf8_lossy(&body[..line_end]).to_string();
        let size = usize::from_str_radix(size_str.split(';').next().unwrap_or("0").trim(), 16)
            .expect("chunk size");
        body = &body[line_end + 2..];
        if size == 0 {
            return out;
        }
        out.extend_from_slice(&body[..size]);
        body = &body[size + 2..];
    }
}
