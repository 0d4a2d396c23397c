use anyhow::Result;
use ingest::Notification;

use crate::commands::run_notification;
use crate::common::{GlobalArgs, build_handler};

/// Ingest one object as if its creation had just been notified
pub async fn object_command(args: &GlobalArgs, bucket: &str, key: &str) -> Result<()> {
    let handler = build_handler(args)?;
    diagnostics::log_info!("Ingesting {bucket}/{key}", bucket, key);
    let notification = Notification::for_object(bucket, key);
    run_notification(&handler, &notification).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_object_command_with_local_root() -> Result<()> {
        let tmp = tempdir()?;
        let bucket_dir = tmp.path().join("buckets").join("landing");
        std::fs::create_dir_all(&bucket_dir)?;
        std::fs::write(bucket_dir.join("rows.csv"), "id,name\n1,a\n2,b\n")?;

        let table = tmp.path().join("table");
        let args = GlobalArgs {
            destination: Some(table.to_string_lossy().to_string()),
            local_root: Some(tmp.path().join("buckets")),
            ..GlobalArgs::default()
        };

        object_command(&args, "landing", "rows.csv").await?;
        assert!(table.join("_delta_log").exists());
        Ok(())
    }

    #[tokio::test]
    async fn test_object_command_unsupported_format_fails() -> Result<()> {
        let tmp = tempdir()?;
        std::fs::create_dir_all(tmp.path().join("landing"))?;

        let args = GlobalArgs {
            destination: Some(tmp.path().join("table").to_string_lossy().to_string()),
            local_root: Some(tmp.path().to_path_buf()),
            ..GlobalArgs::default()
        };

        let err = object_command(&args, "landing", "notes.txt")
            .await
            .unwrap_err();
        assert!(err.to_string().contains("Unsupported format: 'txt'"));
        Ok(())
    }
}
