// SPDX-License-Identifier: Apache-2.0

pub(crate) mod logging;
pub(crate) mod metrics_endpoint;

use axum::http::StatusCode;
use std::collections::{HashMap, VecDeque};
use std::time::Duration;
use tokio::sync::Mutex;

const LATENCY_WINDOW: usize = 1024;

#[derive(Default)]
pub struct RequestMetrics {
    counts: Mutex<HashMap<(String, u16), u64>>,
    latency_ns: Mutex<HashMap<String, VecDeque<u64>>>,
}

impl RequestMetrics {
    pub(crate) async fn observe_request(&self, route: &str, status: StatusCode, latency: Duration) {
        let mut counts = self.counts.lock().await;
        *counts
            .entry((route.to_string(), status.as_u16()))
            .or_insert(0) += 1;
        drop(counts);
        let mut latency_map = self.latency_ns.lock().await;
        let window = latency_map.entry(route.to_string()).or_default();
        window.push_back(latency.as_nanos() as u64);
        while window.len() > LATENCY_WINDOW {
            window.pop_front();
        }
    }

    pub(crate) async fn request_counts(&self) -> Vec<((String, u16), u64)> {
        let counts = self.counts.lock().await;
        let mut out: Vec<_> = counts.iter().map(|(k, v)| (k.clone(), *v)).collect();
        out.sort();
        out
    }

    pub(crate) async fn latency_p95_ns(&self) -> Vec<(String, u64)> {
        let latency = self.latency_ns.lock().await;
        let mut out: Vec<(String, u64)> = latency
            .iter()
            .map(|(route, values)| (route.clone(), percentile_ns(values, 0.95)))
            .collect();
        out.sort();
        out
    }
}

fn percentile_ns(values: &VecDeque<u64>, pct: f64) -> u64 {
    if values.is_empty() {
        return 0;
    }
    let mut v: Vec<u64> = values.iter().copied().collect();
    v.sort_unstable();
    let idx = ((v.len() as f64 - 1.0) * pct).round() as usize;
    v[idx.min(v.len() - 1)]
}
