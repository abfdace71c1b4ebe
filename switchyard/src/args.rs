use std::path::PathBuf;

use clap::{Parser, Subcommand};
use switchyard_llm::{EventShape, ResponseShape};

/// Switchyard LLM request router
#[derive(Debug, Parser)]
#[command(name = "switchyard", about = "Route, adapt and normalize LLM requests across provider dialects")]
pub struct Args {
    /// Path to configuration file
    #[arg(short, long, default_value = "switchyard.toml", env = "SWITCHYARD_CONFIG")]
    pub config: PathBuf,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Resolve a model alias and print the route
    Route {
        /// Model alias as a client would send it
        alias: String,
    },

    /// Adapt a canonical request and print the upstream payload
    Adapt {
        /// Canonical request JSON file, `-` for stdin
        #[arg(default_value = "-")]
        input: PathBuf,

        /// Adapt for a streamed call
        #[arg(long)]
        stream: bool,
    },

    /// Translate a provider response body into a canonical response
    Translate {
        /// Wire shape of the body
        #[arg(long)]
        shape: ResponseShape,

        /// Response JSON file, `-` for stdin
        #[arg(default_value = "-")]
        input: PathBuf,
    },

    /// Normalize stream events into canonical chunks, one per line
    ///
    /// Input is one event per line, either raw JSON or an SSE `data:` line.
    Normalize {
        /// Wire shape of the events
        #[arg(long)]
        shape: EventShape,

        /// Event file, `-` for stdin
        #[arg(default_value = "-")]
        input: PathBuf,
    },

    /// Send a canonical request upstream and print the result
    Complete {
        /// Canonical request JSON file, `-` for stdin
        #[arg(default_value = "-")]
        input: PathBuf,

        /// Stream the response as canonical chunks
        #[arg(long)]
        stream: bool,
    },
}
