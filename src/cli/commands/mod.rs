//! CLI command dispatch and handlers
//!
//! Routes parsed CLI arguments to the appropriate command handler.

pub mod config;
pub mod run;
pub mod validate;

use std::sync::{Arc, Mutex};

use tokio_util::sync::CancellationToken;

use crate::cli::args::{Cli, Commands};
use crate::error::CollapseError;
use crate::observability::StopReason;

/// Cooperative shutdown handle shared between the signal handler and the
/// running command.
///
/// The first trigger wins; its reason is what the run reports.
#[derive(Debug, Clone, Default)]
pub struct Shutdown {
    token: CancellationToken,
    reason: Arc<Mutex<Option<StopReason>>>,
}

impl Shutdown {
    /// Creates an untriggered handle.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests shutdown for `reason`.
    pub fn trigger(&self, reason: StopReason) {
        if let Ok(mut slot) = self.reason.lock() {
            slot.get_or_insert(reason);
        }
        self.token.cancel();
    }

    /// Whether shutdown was requested.
    #[must_use]
    pub fn is_triggered(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Reason of the first trigger, if any.
    #[must_use]
    pub fn reason(&self) -> Option<StopReason> {
        self.reason.lock().ok().and_then(|slot| *slot)
    }

    /// Cancellation token fired on trigger.
    #[must_use]
    pub const fn token(&self) -> &CancellationToken {
        &self.token
    }
}

/// Dispatch a parsed CLI invocation to the appropriate command handler.
///
/// # Errors
///
/// Returns an error if the dispatched command handler fails.
pub async fn dispatch(cli: Cli, shutdown: Shutdown) -> Result<(), CollapseError> {
    match cli.command {
        Commands::Run(args) => run::run(&args, cli.quiet, &shutdown).await.map(|_| ()),
        Commands::Validate(args) => validate::run(&args, cli.quiet),
        Commands::Config => config::run(),
    }
}
