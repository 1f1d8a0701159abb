//! Signal handling for interrupted runs
//!
//! The process stops on the first CTRL-C or SIGTERM. Partial page files are
//! only ever `.part` files, so stopping mid-download leaves the workspace
//! resumable.

use tokio::signal;
use tracing::{info, warn};

/// Which signal ended the run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownSignal {
    Interrupt,
    Terminate,
}

impl ShutdownSignal {
    /// Conventional exit status for a signal-terminated run
    pub fn exit_code(&self) -> i32 {
        130
    }
}

/// Resolve once CTRL-C or SIGTERM arrives
///
/// A handler that cannot be installed is logged and never fires.
pub async fn wait_for_shutdown() -> ShutdownSignal {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                warn!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, stopping");
            ShutdownSignal::Interrupt
        },
        _ = terminate => {
            info!("Received terminate signal, stopping");
            ShutdownSignal::Terminate
        },
    }
}
