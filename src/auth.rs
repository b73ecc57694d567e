//! 上传接口的共享密钥校验。

use axum::http::{HeaderMap, HeaderName};
use tracing::warn;

use crate::error::ApiError;

#[derive(Debug)]
pub struct SharedKey {
    pub header: HeaderName,
    pub secret: String,
    /// 为 true 时缺少密钥头同样拒绝；默认只在请求携带密钥头时校验。
    pub required: bool,
}

impl SharedKey {
    pub fn new(header: &str, secret: impl Into<String>, required: bool) -> Result<Self, String> {
        let header = HeaderName::from_bytes(header.as_bytes())
            .map_err(|err| format!("invalid key header {header:?}: {err}"))?;
        Ok(Self {
            header,
            secret: secret.into(),
            required,
        })
    }
}

/// 校验请求头中的共享密钥。
pub fn check_shared_key(headers: &HeaderMap, key: &SharedKey) -> Result<(), ApiError> {
    let supplied = headers
        .get(&key.header)
        .map(|value| String::from_utf8_lossy(value.as_bytes()).into_owned())
        .unwrap_or_default();

    if supplied.is_empty() {
        if key.required {
            warn!(header = %key.header, "upload rejected: key header missing");
            return Err(ApiError::Unauthorized);
        }
        return Ok(());
    }

    if supplied != key.secret {
        warn!(key = %supplied, "unauthorized upload attempt");
        return Err(ApiError::Unauthorized);
    }
    Ok(())
}
