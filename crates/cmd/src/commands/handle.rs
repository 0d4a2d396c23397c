use std::path::Path;

use anyhow::Result;

use crate::commands::run_notification;
use crate::common::{GlobalArgs, build_handler, read_event};

/// Handle a storage event payload read from `event` (stdin when absent or `-`)
pub async fn handle_command(args: &GlobalArgs, event: Option<&Path>) -> Result<()> {
    let handler = build_handler(args)?;
    let notification = read_event(event)?;
    run_notification(&handler, &notification).await
}
