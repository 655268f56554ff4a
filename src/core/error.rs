//=========================================================================
// Engine Errors
//=========================================================================
//
// Error taxonomy for configuration, tick dispatch, and engine lifecycle.
//
// Subscriber faults are NOT represented here as propagating errors: the
// tick bus captures them per handler and reports them in a `FireReport`.
//
//=========================================================================

//=== External Dependencies ===============================================

use thiserror::Error;

//=== Internal Dependencies ===============================================

use crate::core::tick_bus::TickName;

//=== HandlerError ========================================================

/// Error type returned by tick subscribers.
///
/// Boxed so handlers can bubble up any error with `?`.
pub type HandlerError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Result type returned by tick subscribers.
pub type HandlerResult = Result<(), HandlerError>;

//=== ConfigError =========================================================

/// Invalid loop or engine configuration.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    /// Target update rate is not a finite, strictly positive number.
    #[error("target updates per second must be finite and positive, got {0}")]
    InvalidRate(f64),

    /// Target update rate is so high that a tick is shorter than 1ps.
    #[error("target updates per second {0} yields a tick shorter than one picosecond")]
    RateTooHigh(f64),

    /// A catch-up bound of zero would starve the simulation forever.
    #[error("max updates per iteration must be at least 1")]
    ZeroCatchUpBound,

    /// Window dimensions must be non-zero.
    #[error("window size must be non-zero, got {width}x{height}")]
    InvalidWindowSize { width: u32, height: u32 },
}

//=== TickError ===========================================================

/// Misuse of the tick bus API.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TickError {
    /// A tick was subscribed to or fired with a payload type that differs
    /// from the one it was first registered with.
    #[error("tick `{tick}` carries `{expected}` payloads, not `{found}`")]
    PayloadMismatch {
        tick: TickName,
        expected: &'static str,
        found: &'static str,
    },

    /// The subscription handle is unknown (already removed or foreign).
    #[error("no subscription {id} on tick `{tick}`")]
    UnknownSubscription { tick: TickName, id: u64 },
}

//=== EngineError =========================================================

/// Engine lifecycle failures reported to the caller of `start`/`stop`.
#[derive(Debug, Error)]
pub enum EngineError {
    /// `start` was called while the loop is already running.
    #[error("engine loop is already running")]
    AlreadyRunning,

    /// `stop` was called on an engine whose loop never started.
    #[error("engine loop is not running")]
    NotRunning,

    /// The engine was stopped; a stopped instance cannot be restarted.
    #[error("engine has been stopped and cannot be restarted")]
    Terminated,

    /// The OS refused to spawn the loop thread.
    #[error("failed to spawn loop thread: {0}")]
    Spawn(#[from] std::io::Error),

    /// The loop thread could not be joined (it panicked).
    #[error("failed to join loop thread: {0}")]
    JoinFailed(String),

    /// Configuration rejected at build time.
    #[error(transparent)]
    Config(#[from] ConfigError),
}

//=== Helpers =============================================================

/// Best-effort text of a caught panic payload.
pub(crate) fn panic_message(panic: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

//=========================================================================
// Unit Tests
//=========================================================================
