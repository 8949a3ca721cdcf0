//! TCP line ingester.
//!
//! Accepts plain-text connections carrying `\n`-framed metric lines, hands
//! each line to the [`MetricMatcher`], and emits match hits into the batcher
//! channel. One reader task per connection; a cancelled token stops the
//! accept loop, after which in-flight connections drain to EOF before the
//! output channel closes.

use std::sync::Arc;

use graphwatch_store::MatchedMetric;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::error::Result;
use crate::matcher::MetricMatcher;

/// Binds `listen_address` and serves until `shutdown` is cancelled.
///
/// The output channel closes once the accept loop has stopped and every
/// in-flight connection has drained; the batcher uses that close as its own
/// shutdown signal.
///
/// # Errors
///
/// Returns [`crate::FilterError::Io`] if the listener cannot be bound; this
/// is fatal at startup. Per-connection errors are logged and non-fatal.
pub async fn run_ingester(
    listen_address: String,
    matcher: Arc<MetricMatcher>,
    output: mpsc::Sender<MatchedMetric>,
    shutdown: CancellationToken,
) -> Result<()> {
    let listener = TcpListener::bind(&listen_address).await?;
    info!(addr = %listen_address, "metric ingester listening");
    serve(listener, matcher, output, shutdown).await;
    Ok(())
}

/// Accept loop over an already-bound listener.
///
/// Split from [`run_ingester`] so a caller can bind first and treat a bind
/// failure as fatal before spawning the loop.
pub async fn serve(
    listener: TcpListener,
    matcher: Arc<MetricMatcher>,
    output: mpsc::Sender<MatchedMetric>,
    shutdown: CancellationToken,
) {
    let mut connections = JoinSet::new();
    loop {
        tokio::select! {
            () = shutdown.cancelled() => {
                info!("ingester shutdown requested, draining connections");
                break;
            }
            accepted = listener.accept() => match accepted {
                Ok((stream, peer)) => {
                    let matcher = Arc::clone(&matcher);
                    let output = output.clone();
                    connections.spawn(async move {
                        handle_connection(stream, peer.to_string(), matcher, output).await;
                    });
                }
                Err(err) => {
                    warn!(error = %err, "failed to accept connection");
                }
            },
        }
    }

    drop(listener);
    while connections.join_next().await.is_some() {}
}

/// Reads one connection to EOF, feeding every line to the matcher.
async fn handle_connection(
    stream: TcpStream,
    peer: String,
    matcher: Arc<MetricMatcher>,
    output: mpsc::Sender<MatchedMetric>,
) {
    let mut reader = BufReader::new(stream);
    let mut line = Vec::new();
    let mut total: u64 = 0;

    loop {
        line.clear();
        match reader.read_until(b'\n', &mut line).await {
            Ok(0) => break,
            Ok(_) => {}
            Err(err) => {
                warn!(peer = %peer, error = %err, "connection read failed");
                break;
            }
        }

        if line.last() == Some(&b'\n') {
            line.pop();
        }
        if line.last() == Some(&b'\r') {
            line.pop();
        }
        total += 1;

        let now = chrono::Utc::now().timestamp();
        if let Some(matched) = matcher.process_line(&line, now) {
            if output.send(matched).await.is_err() {
                // Batcher is gone; nothing left to do for this connection.
                break;
            }
        }
    }

    debug!(peer = %peer, lines = total, "connection closed");
}
