//! hostmux
//!
//! A host-filtering HTTPS muxer built with Tokio and Axum.
//!
//! # Architecture Overview
//!
//! ```text
//!                    ┌───────────────────────────────────────────────────────┐
//!                    │                        HOSTMUX                         │
//!                    │                                                        │
//!  :80  ─────────────┼─▶ net::redirect ──▶ 301 https://host/... (or 403)      │
//!                    │        └─▶ /.well-known/acme-challenge/* (webroot)     │
//!                    │                                                        │
//!  :443 ─────────────┼─▶ http::server ──▶ security::hosts (403 if unknown)    │
//!                    │                         │                              │
//!                    │                         ▼                              │
//!                    │                  routing::router                       │
//!                    │          ┌──────────┬───┴───────┬──────────┐           │
//!                    │          ▼          ▼           ▼          ▼           │
//!                    │     files (+hotlink)  file   redirect  http::upstream  │
//!                    │                         │                              │
//!                    │                         ▼                              │
//!  response ◀────────┼──────────── security::headers (HSTS, caching)          │
//!                    │                                                        │
//!                    │  config (TOML, watch) · observability · lifecycle      │
//!                    └───────────────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;

#[derive(Parser)]
#[command(name = "hostmux", version, about = "Host-filtering HTTPS muxer")]
struct Cli {
    /// Path to the TOML configuration file.
    #[arg(short, long, default_value = "hostmux.toml")]
    config: PathBuf,

    /// Reload routes and host lists when the config file changes.
    #[arg(short, long)]
    watch: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    match hostmux::lifecycle::run(&cli.config, cli.watch).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "Fatal error");
            eprintln!("hostmux: {e}");
            ExitCode::FAILURE
        }
    }
}
