//! Command-line interface of `nrvna`, based on clap.
//!
//! Defines [`Cli`] with the [`Command`] subcommands (serve, submit, retrieve,
//! process) and the global `--verbose` flag.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// nrvna: filesystem job queue for local inference.
#[derive(Debug, Parser)]
#[command(name = "nrvna", version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Log debug output (default logs errors only).
    #[arg(long, short, global = true, default_value_t = false)]
    pub verbose: bool,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Runs the scheduler until interrupted.
    Serve {
        /// Workspace directory holding the queue.
        workspace: PathBuf,

        /// Number of parallel workers.
        #[arg(long)]
        workers: Option<usize>,

        /// Base URL of the completion server.
        #[arg(long)]
        endpoint: Option<String>,
    },

    /// Queues content and prints the new job ID.
    Submit {
        workspace: PathBuf,

        /// Content to process; multiple words are joined with spaces.
        #[arg(required = true, num_args = 1..)]
        content: Vec<String>,

        /// Address that receives the result when the job completes.
        #[arg(long)]
        email: Option<String>,
    },

    /// Prints a completed result; the most recent one if no ID is given.
    Retrieve {
        workspace: PathBuf,

        job_id: Option<String>,
    },

    /// Processes everything currently queued once, then exits.
    Process {
        workspace: PathBuf,

        #[arg(long)]
        endpoint: Option<String>,
    },
}
