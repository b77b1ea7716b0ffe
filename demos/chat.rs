//! Terminal chat against a relay.
//!
//! Demonstrates:
//! - Building a manager with a custom endpoint
//! - Printing every message the relay broadcasts
//! - Sending stdin lines as user messages
//! - Reconnecting after the relay drops the connection
//!
//! Usage:
//!   cargo run --example chat
//!   cargo run --example chat -- --name P1
//!   cargo run --example chat -- --url ws://localhost:12345/ws --debug

// ============================================================================
// Imports
// ============================================================================

use std::sync::Arc;

use relay_chat_client::{ConnectionManager, Message, ReconnectPolicy, Reconnector, Result};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::broadcast::error::RecvError;
use tracing_subscriber::EnvFilter;

// ============================================================================
// Args
// ============================================================================

struct Args {
    url: Option<String>,
    name: String,
    debug: bool,
}

impl Args {
    fn parse() -> Self {
        let args: Vec<String> = std::env::args().collect();
        let value_of = |flag: &str| {
            args.iter()
                .position(|a| a == flag)
                .and_then(|i| args.get(i + 1))
                .cloned()
        };

        Self {
            url: value_of("--url"),
            name: value_of("--name").unwrap_or_else(|| "Anonymous".to_owned()),
            debug: args.iter().any(|a| a == "--debug"),
        }
    }
}

fn init_logging(debug: bool) {
    let filter = if debug {
        "relay_chat_client=trace"
    } else {
        "relay_chat_client=info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .with_target(false)
        .init();
}

// ============================================================================
// Main
// ============================================================================

#[tokio::main]
async fn main() {
    let args = Args::parse();
    init_logging(args.debug);

    if let Err(e) = run(args).await {
        eprintln!("\n[ERROR] {e}");
        std::process::exit(1);
    }
}

async fn run(args: Args) -> Result<()> {
    let mut builder = ConnectionManager::builder();
    if let Some(url) = args.url {
        builder = builder.endpoint(url);
    }
    let manager = Arc::new(builder.build()?);

    println!("=== Chat as {} @ {} ===\n", args.name, manager.options().endpoint);

    let _reconnector = Reconnector::spawn(&manager, ReconnectPolicy::default());
    let mut messages = manager.subscribe();
    manager.start();

    let printer = tokio::spawn(async move {
        loop {
            match messages.recv().await {
                Ok(message) => println!("{message}"),
                Err(RecvError::Lagged(skipped)) => println!("[skipped {skipped} messages]"),
                Err(RecvError::Closed) => break,
            }
        }
    });

    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else {
                    break;
                };
                if line.trim().is_empty() {
                    continue;
                }
                if !manager.is_ready() {
                    println!("[not connected, message dropped]");
                    continue;
                }
                manager.send(&Message::user(&args.name, line)?);
            }
            _ = tokio::signal::ctrl_c() => break,
        }
    }

    manager.stop();
    printer.abort();

    println!("\n{} messages received", manager.message_count());
    Ok(())
}
