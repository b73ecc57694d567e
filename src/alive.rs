//! 存活检查。

use axum::http::Method;

use crate::config::ALIVE_BODY;
use crate::error::ApiError;

/// 返回固定的服务标识。
pub async fn alive() -> &'static str {
    ALIVE_BODY
}

/// 未匹配任何路由的请求按存活检查处理，仅接受 GET。
pub async fn alive_fallback(method: Method) -> Result<&'static str, ApiError> {
    if method != Method::GET {
        return Err(ApiError::MethodNotAllowed);
    }
    Ok(alive().await)
}
