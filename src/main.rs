//! File upload server binary.
//!
//! Serves a liveness check, a multipart upload endpoint that writes into
//! `<upload root>/<proj>/<dir>/<filename>`, and a "latest activity" endpoint
//! reporting how long ago the files of a directory were last modified.

mod alive;
mod auth;
mod config;
mod error;
mod http;
mod latest;
mod logging;
mod sanitize;
mod storage;
mod upload;

use axum_server::Handle;
use clap::Parser;
use std::io::{Error, ErrorKind};
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use std::time::Duration;
use tokio::signal;
use tracing::{error, info};

use crate::auth::SharedKey;
use crate::config::{Args, SHUTDOWN_GRACE_SECS, UPLOAD_DIR_ENV};
use crate::http::build_router;
use crate::storage::UploadRoot;

/// Starts the upload server and blocks until shutdown.
#[tokio::main]
async fn main() -> Result<(), Error> {
    logging::init_logging();

    let args = Args::parse();
    let upload_root = UploadRoot::from_process(args.upload_dir_override()).inspect_err(|err| {
        error!(error = %err, "failed to get executable path");
    })?;
    match args.upload_dir_override() {
        Some(dir) => info!(dir, "using custom upload directory from {}", UPLOAD_DIR_ENV),
        None => info!("{} not set, using 'uploads' next to the executable", UPLOAD_DIR_ENV),
    }
    upload_root.ensure_root().await.inspect_err(|err| {
        error!(
            path = ?upload_root.root_path(),
            error = %err,
            "failed to create root upload directory"
        );
    })?;
    info!(path = ?upload_root.root_path(), "root upload directory ready");

    let shared_key = SharedKey::new(&args.key_header, args.shared_key.clone(), args.require_key)
        .map_err(|err| Error::new(ErrorKind::InvalidInput, err))?;
    let app = build_router(Arc::new(upload_root), Arc::new(shared_key));

    let host = args
        .host
        .parse::<IpAddr>()
        .map_err(|err| Error::new(ErrorKind::InvalidInput, err.to_string()))?;
    let addr = SocketAddr::new(host, args.port);
    let handle = Handle::new();

    info!("Starting server on {}", addr);

    let server = axum_server::bind(addr)
        .handle(handle.clone())
        .serve(app.into_make_service_with_connect_info::<SocketAddr>());

    tokio::select! {
        result = server => result.inspect_err(|err| error!(error = %err, "server failed"))?,
        _ = shutdown_signal(handle) => {}
    }

    Ok(())
}

async fn shutdown_signal(handle: Handle) {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Received termination signal shutting down");
    handle.graceful_shutdown(Some(Duration::from_secs(SHUTDOWN_GRACE_SECS)));
}
