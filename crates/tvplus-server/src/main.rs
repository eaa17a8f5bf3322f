// SPDX-License-Identifier: Apache-2.0

#![forbid(unsafe_code)]

use std::net::SocketAddr;
use tokio::net::TcpListener;
use tracing::{error, info, warn};
use tvplus_server::{
    build_router, init_tracing, validate_startup_config_contract, AppState, ServerConfig,
};

async fn wait_for_shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        match (
            signal(SignalKind::terminate()),
            signal(SignalKind::interrupt()),
        ) {
            (Ok(mut sigterm), Ok(mut sigint)) => {
                tokio::select! {
                    _ = sigterm.recv() => {}
                    _ = sigint.recv() => {}
                }
            }
            _ => {
                warn!("signal handlers unavailable, falling back to ctrl-c");
                let _ = tokio::signal::ctrl_c().await;
            }
        }
    }
    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}

#[tokio::main]
async fn main() -> Result<(), String> {
    let cfg = ServerConfig::from_env();
    init_tracing(cfg.log_json);
    validate_startup_config_contract(&cfg)?;
    info!(
        bind = %cfg.bind_addr,
        app_url = %cfg.upstream.app_url,
        epg_url = %cfg.upstream.epg_url,
        in_container = cfg.in_container,
        "starting tvplus-server"
    );

    let bind_addr = cfg.bind_addr.clone();
    let refresh_every = cfg.catalog_refresh_interval;
    let state = AppState::from_config(cfg);

    // Not fatal: readiness stays red and requests retry the fetch.
    if let Err(e) = state.catalog.refresh().await {
        error!("initial catalog refresh failed: {e}");
    }
    state.catalog.spawn_refresh_loop(refresh_every);

    let app = build_router(state.clone());

    let addr: SocketAddr = bind_addr
        .parse()
        .map_err(|e| format!("invalid bind addr {bind_addr}: {e}"))?;
    let socket = if addr.is_ipv4() {
        tokio::net::TcpSocket::new_v4().map_err(|e| format!("socket v4 failed: {e}"))?
    } else {
        tokio::net::TcpSocket::new_v6().map_err(|e| format!("socket v6 failed: {e}"))?
    };
    socket
        .set_reuseaddr(true)
        .map_err(|e| format!("set_reuseaddr failed: {e}"))?;
    socket.bind(addr).map_err(|e| format!("bind failed: {e}"))?;
    let listener: TcpListener = socket
        .listen(1024)
        .map_err(|e| format!("listen failed: {e}"))?;
    info!("tvplus-server listening on {bind_addr}");

    let state_for_shutdown = state.clone();
    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            wait_for_shutdown_signal().await;
            state_for_shutdown.begin_shutdown_drain();
            info!("shutdown requested, draining");
            tokio::time::sleep(state_for_shutdown.shutdown_drain()).await;
        })
        .await
        .map_err(|e| format!("server failed: {e}"))
}
