//! HTTP 路由组装与通用处理器。

use axum::extract::{DefaultBodyLimit, Extension, connect_info::ConnectInfo};
use axum::http::Request;
use axum::routing::{get, post};
use axum::Router;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::trace::{DefaultOnRequest, DefaultOnResponse, TraceLayer};
use tracing::{Level, info_span};

use crate::alive::{alive, alive_fallback};
use crate::auth::SharedKey;
use crate::error::ApiError;
use crate::latest::latest_activity;
use crate::storage::UploadRoot;
use crate::upload::upload_file;

/// 取查询参数的第一次出现，空值视为缺失。
///
/// 查询串以 `Query<Vec<(String, String)>>` 提取，重复参数不会在处理器运行前被拒绝。
pub fn required_param<'a>(params: &'a [(String, String)], name: &str) -> Option<&'a str> {
    params
        .iter()
        .find(|(key, _)| key == name)
        .map(|(_, value)| value.as_str())
        .filter(|value| !value.is_empty())
}

/// 方法不匹配时的统一响应。
pub async fn method_not_allowed() -> ApiError {
    ApiError::MethodNotAllowed
}

/// 构建完整路由：存活检查、上传与活跃度查询。
pub fn build_router(root: Arc<UploadRoot>, key: Arc<SharedKey>) -> Router {
    Router::new()
        .route("/", get(alive).fallback(method_not_allowed))
        .route(
            "/upload",
            post(upload_file)
                .fallback(method_not_allowed)
                .layer(DefaultBodyLimit::disable()),
        )
        .route(
            "/latest",
            get(latest_activity).fallback(method_not_allowed),
        )
        .fallback(alive_fallback)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|request: &Request<_>| {
                    let forwarded_ip = request
                        .headers()
                        .get("x-forwarded-for")
                        .and_then(|v| v.to_str().ok())
                        .map(|s| s.split(',').next().unwrap_or("").trim().to_string());
                    let connect_ip = request
                        .extensions()
                        .get::<ConnectInfo<SocketAddr>>()
                        .map(|ConnectInfo(addr)| addr.to_string());
                    let client_ip = forwarded_ip
                        .or(connect_ip)
                        .unwrap_or_else(|| "unknown".to_string());

                    info_span!(
                        env!("CARGO_CRATE_NAME"),
                        client_ip,
                        method = ?request.method(),
                        path = ?request.uri().path(),
                    )
                })
                .on_request(DefaultOnRequest::new().level(Level::DEBUG))
                .on_response(DefaultOnResponse::new().level(Level::DEBUG)),
        )
        .layer(Extension(root))
        .layer(Extension(key))
}
