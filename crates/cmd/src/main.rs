// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};

use cmd::commands::{handle_command, object_command};
use cmd::common::GlobalArgs;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
#[command(name = "ingest")]
struct Cli {
    #[command(flatten)]
    global: GlobalArgs,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Handle an object-created event payload (JSON)
    Handle {
        /// Event file; reads stdin when omitted or `-`
        #[arg(long)]
        event: Option<PathBuf>,
    },
    /// Ingest one object by bucket and key
    Object {
        #[arg(long)]
        bucket: String,
        #[arg(long)]
        key: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    diagnostics::init();

    let cli = Cli::parse();

    match &cli.command {
        Commands::Handle { event } => handle_command(&cli.global, event.as_deref()).await,
        Commands::Object { bucket, key } => object_command(&cli.global, bucket, key).await,
    }
}
