pub mod handle;
pub mod object;

pub use handle::handle_command;
pub use object::object_command;

use anyhow::{Result, anyhow};
use ingest::{IngestHandler, IngestResponse, Notification};

use crate::common::write_response;

/// Run one notification and report the response on stdout
///
/// A failed invocation still writes its error response before returning
/// the error, so the process exits non-zero.
pub async fn run_notification(handler: &IngestHandler, notification: &Notification) -> Result<()> {
    match handler.process(notification).await {
        Ok(response) => write_response(&response),
        Err(e) => {
            diagnostics::error!("Ingest failed: {err}", err: e);
            write_response(&IngestResponse::failure(&e))?;
            Err(anyhow!(e))
        }
    }
}
