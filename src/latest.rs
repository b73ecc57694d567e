//! 目录活跃度查询：返回目录内文件距最后修改的最大秒数。

use axum::extract::{Extension, Query};
use std::io::ErrorKind;
use std::sync::Arc;
use std::time::SystemTime;
use tokio::fs;
use tracing::{debug, error, warn};

use crate::error::ApiError;
use crate::http::required_param;
use crate::storage::UploadRoot;

/// 列出目录的直接子项（不递归），跳过子目录与读取元数据失败的条目。
pub async fn latest_activity(
    Query(params): Query<Vec<(String, String)>>,
    Extension(root): Extension<Arc<UploadRoot>>,
) -> Result<String, ApiError> {
    let Some(path) = required_param(&params, "path") else {
        return Err(ApiError::BadRequest("Missing query parameter: path"));
    };

    let target = root.query_dir(path);
    let mut dir = match fs::read_dir(&target).await {
        Ok(dir) => dir,
        Err(err) if err.kind() == ErrorKind::NotFound => {
            warn!(path = ?target, error = %err, "directory not found");
            return Err(ApiError::NotFound("Directory not found"));
        }
        Err(err) => {
            error!(path = ?target, error = %err, "failed to read directory");
            return Err(ApiError::Internal);
        }
    };

    let now = SystemTime::now();
    let mut max_elapsed: u64 = 0;
    loop {
        let entry = match dir.next_entry().await {
            Ok(Some(entry)) => entry,
            Ok(None) => break,
            Err(err) => {
                error!(path = ?target, error = %err, "failed to read directory entry");
                return Err(ApiError::Internal);
            }
        };
        let metadata = match entry.metadata().await {
            Ok(metadata) => metadata,
            Err(err) => {
                warn!(name = ?entry.file_name(), error = %err, "could not get file info");
                continue;
            }
        };
        if metadata.is_dir() {
            continue;
        }
        let modified = match metadata.modified() {
            Ok(modified) => modified,
            Err(err) => {
                warn!(name = ?entry.file_name(), error = %err, "modification time unavailable");
                continue;
            }
        };
        max_elapsed = max_elapsed.max(elapsed_secs(now, modified));
    }

    debug!(path = ?target, max_elapsed, "latest activity");
    Ok(max_elapsed.to_string())
}

/// 整秒截断；修改时间在未来时记为 0。
fn elapsed_secs(now: SystemTime, modified: SystemTime) -> u64 {
    now.duration_since(modified)
        .map(|elapsed| elapsed.as_secs())
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tempfile::tempdir;

    fn make_root() -> (tempfile::TempDir, Arc<UploadRoot>) {
        let temp = tempdir().expect("tempdir");
        let root = temp.path().join("uploads");
        std::fs::create_dir_all(&root).expect("create upload root");
        (temp, Arc::new(UploadRoot::new(root)))
    }

    async fn query(root: &Arc<UploadRoot>, path: Option<&str>) -> Result<String, ApiError> {
        latest_activity(
            Query(
                path.map(|path| vec![("path".to_string(), path.to_string())])
                    .unwrap_or_default(),
            ),
            Extension(root.clone()),
        )
        .await
    }

    fn age_file(path: &std::path::Path, age: Duration) {
        let file = std::fs::File::options()
            .write(true)
            .open(path)
            .expect("open file");
        file.set_modified(SystemTime::now() - age)
            .expect("set mtime");
    }

    #[test]
    fn elapsed_truncates_and_floors_at_zero() {
        let now = SystemTime::now();
        assert_eq!(elapsed_secs(now, now - Duration::from_millis(2900)), 2);
        assert_eq!(elapsed_secs(now, now + Duration::from_secs(60)), 0);
    }

    #[tokio::test]
    async fn missing_path_is_bad_request() {
        let (_temp, root) = make_root();
        assert!(matches!(query(&root, None).await, Err(ApiError::BadRequest(_))));
        assert!(matches!(
            query(&root, Some("")).await,
            Err(ApiError::BadRequest(_))
        ));
    }

    #[tokio::test]
    async fn missing_directory_is_not_found() {
        let (_temp, root) = make_root();
        assert!(matches!(
            query(&root, Some("nope")).await,
            Err(ApiError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn file_instead_of_directory_is_internal_error() {
        let (_temp, root) = make_root();
        std::fs::write(root.root_path().join("plain"), b"x").expect("write file");
        assert!(matches!(
            query(&root, Some("plain")).await,
            Err(ApiError::Internal)
        ));
    }

    #[tokio::test]
    async fn empty_directory_reports_zero() {
        let (_temp, root) = make_root();
        std::fs::create_dir_all(root.root_path().join("empty")).expect("mkdir");
        assert_eq!(query(&root, Some("empty")).await.ok().as_deref(), Some("0"));
    }

    #[tokio::test]
    async fn subdirectories_are_ignored() {
        let (_temp, root) = make_root();
        let dir = root.root_path().join("proj");
        std::fs::create_dir_all(dir.join("child")).expect("mkdir");
        assert_eq!(query(&root, Some("proj")).await.ok().as_deref(), Some("0"));
    }

    #[tokio::test]
    async fn reports_largest_elapsed_time() {
        let (_temp, root) = make_root();
        let dir = root.root_path().join("proj").join("dir");
        std::fs::create_dir_all(&dir).expect("mkdir");
        for (name, age) in [("fresh", 0), ("older", 120), ("old", 30)] {
            let path = dir.join(name);
            std::fs::write(&path, b"x").expect("write file");
            age_file(&path, Duration::from_secs(age));
        }

        let body = query(&root, Some("proj/dir"))
            .await
            .unwrap_or_else(|_| panic!("latest failed"));
        let secs: u64 = body.parse().expect("decimal body");
        assert!((120..130).contains(&secs), "unexpected elapsed {secs}");
    }

    #[tokio::test]
    async fn traversal_in_path_stays_inside_root() {
        let (temp, root) = make_root();
        std::fs::create_dir_all(temp.path().join("outside")).expect("mkdir");
        assert!(matches!(
            query(&root, Some("../outside")).await,
            Err(ApiError::NotFound(_))
        ));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn entries_without_metadata_are_skipped() {
        use std::os::unix::fs::PermissionsExt;

        let (_temp, root) = make_root();
        let dir = root.root_path().join("locked");
        std::fs::create_dir_all(&dir).expect("mkdir");
        let file = dir.join("old");
        std::fs::write(&file, b"x").expect("write file");
        age_file(&file, Duration::from_secs(300));

        // read but no search permission: listing works, per-entry stat fails
        std::fs::set_permissions(&dir, std::fs::Permissions::from_mode(0o444))
            .expect("chmod dir");
        let stat_blocked = std::fs::symlink_metadata(&file).is_err();
        let result = query(&root, Some("locked")).await;
        std::fs::set_permissions(&dir, std::fs::Permissions::from_mode(0o755))
            .expect("restore dir");

        if !stat_blocked {
            // permission checks are bypassed (e.g. running as root)
            return;
        }
        assert_eq!(result.ok().as_deref(), Some("0"));
    }
}
