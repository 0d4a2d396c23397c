use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Result;
use clap::Args;
use ingest::{IngestConfig, IngestHandler, IngestResponse, LocalSourceStores, Notification};

use crate::error_utils::ErrorContext;

/// Options shared by every command
#[derive(Args, Debug, Clone, Default)]
pub struct GlobalArgs {
    /// YAML configuration file
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Destination Delta table URI (overrides config and INGEST_DESTINATION)
    #[arg(long, global = true)]
    pub destination: Option<String>,

    /// Maximum rows read from each object
    #[arg(long, global = true)]
    pub row_limit: Option<usize>,

    /// Let appends add new columns to the destination schema
    #[arg(long, global = true)]
    pub merge_schema: bool,

    /// Serve buckets from `<DIR>/<bucket>` instead of S3
    #[arg(long, global = true, value_name = "DIR")]
    pub local_root: Option<PathBuf>,
}

/// Resolve configuration: file, then environment, then flags
pub fn build_config(args: &GlobalArgs) -> Result<IngestConfig> {
    let mut config = IngestConfig::load(args.config.as_deref())
        .with_context_msg("Failed to load configuration")?;

    if let Some(destination) = &args.destination {
        config.destination = destination.clone();
    }
    if let Some(limit) = args.row_limit {
        config.row_limit = limit;
    }
    if args.merge_schema {
        config.merge_schema = true;
    }

    config
        .validate()
        .with_context_msg("Invalid configuration")?;
    Ok(config)
}

pub fn build_handler(args: &GlobalArgs) -> Result<IngestHandler> {
    let config = build_config(args)?;
    let handler = match &args.local_root {
        Some(root) => {
            IngestHandler::with_sources(config, Arc::new(LocalSourceStores::new(root.clone())))?
        }
        None => IngestHandler::new(config)?,
    };
    Ok(handler)
}

/// Read a notification from a file, or stdin for `-` / no path
pub fn read_event(source: Option<&Path>) -> Result<Notification> {
    let payload = match source {
        Some(path) if path != Path::new("-") => std::fs::read_to_string(path)
            .file_context("read event", &path.display().to_string())?,
        _ => {
            let mut payload = String::new();
            let _ = std::io::stdin()
                .read_to_string(&mut payload)
                .with_context_msg("Failed to read event from stdin")?;
            payload
        }
    };

    Notification::from_json(&payload).with_context_msg("Failed to parse event")
}

/// Write the response as one JSON line on stdout
pub fn write_response(response: &IngestResponse) -> Result<()> {
    let mut stdout = std::io::stdout().lock();
    serde_json::to_writer(&mut stdout, response)?;
    writeln!(stdout)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_flags_override_config_file() -> Result<()> {
        let tmp = tempdir()?;
        let config_path = tmp.path().join("ingest.yaml");
        std::fs::write(&config_path, "destination: /data/table\nrow_limit: 10\n")?;

        let args = GlobalArgs {
            config: Some(config_path),
            row_limit: Some(3),
            merge_schema: true,
            ..GlobalArgs::default()
        };
        let config = build_config(&args)?;

        assert_eq!(config.row_limit, 3);
        assert!(config.merge_schema);
        Ok(())
    }

    #[test]
    fn test_zero_row_limit_rejected() {
        let args = GlobalArgs {
            destination: Some("/data/table".to_string()),
            row_limit: Some(0),
            ..GlobalArgs::default()
        };
        let err = build_config(&args).unwrap_err();
        assert!(err.to_string().contains("Invalid configuration"));
    }

    #[test]
    fn test_read_event_from_file() -> Result<()> {
        let tmp = tempdir()?;
        let event_path = tmp.path().join("event.json");
        std::fs::write(
            &event_path,
            r#"{"Records":[{"s3":{"bucket":{"name":"landing"},"object":{"key":"a/b.csv"}}}]}"#,
        )?;

        let notification = read_event(Some(&event_path))?;
        let object = notification.first_object()?;
        assert_eq!(object.bucket, "landing");
        assert_eq!(object.key, "a/b.csv");
        Ok(())
    }

    #[test]
    fn test_read_event_missing_file() {
        let err = read_event(Some(Path::new("/nonexistent/event.json"))).unwrap_err();
        assert!(err.to_string().contains("Failed to read event"));
    }
}
