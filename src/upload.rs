//! 多部分上传处理器：将每个 part 写入项目目录下的目标文件。

use axum::extract::multipart::{Field, MultipartRejection};
use axum::extract::{Extension, Multipart, Query};
use axum::http::HeaderMap;
use std::path::Path;
use std::sync::Arc;
use tokio::fs::File;
use tokio::io::AsyncWriteExt;
use tracing::{error, info, warn};

use crate::auth::{SharedKey, check_shared_key};
use crate::config::{MAX_CONSECUTIVE_PART_ERRORS, UPLOAD_OK_BODY};
use crate::error::ApiError;
use crate::http::required_param;
use crate::sanitize::sanitize;
use crate::storage::{UploadRoot, create_dir_tree};

/// 接收上传：校验密钥与参数，创建目录后逐个 part 写盘。
pub async fn upload_file(
    Query(params): Query<Vec<(String, String)>>,
    headers: HeaderMap,
    Extension(root): Extension<Arc<UploadRoot>>,
    Extension(key): Extension<Arc<SharedKey>>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<&'static str, ApiError> {
    check_shared_key(&headers, &key)?;

    let (Some(filename), Some(proj), Some(dir)) = (
        required_param(&params, "filename"),
        required_param(&params, "proj"),
        required_param(&params, "dir"),
    ) else {
        return Err(ApiError::BadRequest(
            "Missing query parameters: filename, proj, dir",
        ));
    };

    let target_dir = root.project_dir(proj, dir);
    if let Err(err) = create_dir_tree(&target_dir).await {
        error!(path = ?target_dir, error = %err, "failed to create upload directory");
        return Err(ApiError::Internal);
    }

    let mut multipart = multipart.map_err(|err| {
        warn!(error = %err, "request body is not multipart");
        ApiError::BadRequest("Error processing multipart form")
    })?;

    let file_path = target_dir.join(sanitize(filename));
    info!(filename, target_dir = ?target_dir, "upload started");

    let mut consecutive_errors = 0;
    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(err) => {
                warn!(error = %err, "skipping unreadable multipart part");
                consecutive_errors += 1;
                if consecutive_errors >= MAX_CONSECUTIVE_PART_ERRORS {
                    error!(
                        path = ?file_path,
                        errors = consecutive_errors,
                        "multipart stream unrecoverable, remaining parts dropped"
                    );
                    return Err(ApiError::BadRequest("Error processing multipart form"));
                }
                continue;
            }
        };
        consecutive_errors = 0;
        let written = write_part(field, &file_path).await?;
        info!(path = ?file_path, bytes = written, "upload part saved");
    }

    Ok(UPLOAD_OK_BODY)
}

/// 将单个 part 完整写入 `path`（存在则截断覆盖）。
///
/// 文件句柄与 part 在函数返回时释放；写入中途失败不会回滚已写内容。
async fn write_part(mut field: Field<'_>, path: &Path) -> Result<u64, ApiError> {
    let mut dst = File::create(path).await.map_err(|err| {
        error!(path = ?path, error = %err, "failed to create upload file");
        ApiError::Internal
    })?;

    let mut written: u64 = 0;
    let copy_result: Result<(), String> = async {
        while let Some(chunk) = field.chunk().await.map_err(|err| err.to_string())? {
            dst.write_all(&chunk).await.map_err(|err| err.to_string())?;
            written += chunk.len() as u64;
        }
        dst.flush().await.map_err(|err| err.to_string())
    }
    .await;

    if let Err(err) = copy_result {
        error!(path = ?path, bytes = written, error = %err, "failed to write upload file");
        return Err(ApiError::Internal);
    }
    Ok(written)
}
