//=========================================================================
// Loop Configuration
//=========================================================================
//
// Immutable scheduler parameters, validated once at construction.
//
//   target_ups ──► optimal_tick_duration = 1e9 / target_ups   (ns, f64)
//              └─► tick_picos            = floor(1e12 / target_ups)
//
// The f64 duration is the reported value. Lag is drained against the
// integer picosecond tick so that exactly `target_ups` updates fit into
// one simulated second without float drift eating the last one.
//
//=========================================================================

//=== Internal Dependencies ===============================================

use super::error::ConfigError;

//=== Constants ===========================================================

const NANOS_PER_SECOND: f64 = 1_000_000_000.0;
const PICOS_PER_SECOND: f64 = 1_000_000_000_000.0;

/// Default target updates per second.
pub const DEFAULT_UPS: f64 = 60.0;

//=== LoopConfig ==========================================================

/// Fixed-timestep scheduler configuration.
///
/// # Examples
///
/// ```
/// use decaf_engine::core::config::LoopConfig;
///
/// let config = LoopConfig::new(60.0)?.with_max_updates_per_iteration(5)?;
/// assert_eq!(config.optimal_tick_duration(), 1e9 / 60.0);
/// assert_eq!(config.max_updates_per_iteration(), Some(5));
/// # Ok::<(), decaf_engine::core::error::ConfigError>(())
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LoopConfig {
    target_ups: f64,
    optimal_tick_duration: f64,
    tick_picos: u64,
    max_updates_per_iteration: Option<u32>,
}

impl LoopConfig {
    /// Creates a configuration targeting `target_ups` updates per second.
    ///
    /// Catch-up is unbounded by default.
    pub fn new(target_ups: f64) -> Result<Self, ConfigError> {
        if !target_ups.is_finite() || target_ups <= 0.0 {
            return Err(ConfigError::InvalidRate(target_ups));
        }

        let tick_picos = (PICOS_PER_SECOND / target_ups).floor();
        if tick_picos < 1.0 {
            return Err(ConfigError::RateTooHigh(target_ups));
        }

        Ok(Self {
            target_ups,
            optimal_tick_duration: NANOS_PER_SECOND / target_ups,
            tick_picos: tick_picos as u64,
            max_updates_per_iteration: None,
        })
    }

    /// Bounds how many update ticks a single iteration may fire.
    ///
    /// When the bound is reached, the remaining lag is carried into the
    /// next iteration (a render happens in between). Without a bound an
    /// update handler slower than one tick starves rendering entirely.
    pub fn with_max_updates_per_iteration(mut self, max: u32) -> Result<Self, ConfigError> {
        if max == 0 {
            return Err(ConfigError::ZeroCatchUpBound);
        }
        self.max_updates_per_iteration = Some(max);
        Ok(self)
    }

    //--- Accessors --------------------------------------------------------

    pub fn target_ups(&self) -> f64 {
        self.target_ups
    }

    /// Length of one logical update in nanoseconds (`1e9 / target_ups`).
    pub fn optimal_tick_duration(&self) -> f64 {
        self.optimal_tick_duration
    }

    /// Length of one logical update in whole picoseconds.
    pub fn tick_picos(&self) -> u64 {
        self.tick_picos
    }

    pub fn max_updates_per_iteration(&self) -> Option<u32> {
        self.max_updates_per_iteration
    }
}

impl Default for LoopConfig {
    fn default() -> Self {
        Self {
            target_ups: DEFAULT_UPS,
            optimal_tick_duration: NANOS_PER_SECOND / DEFAULT_UPS,
            tick_picos: (PICOS_PER_SECOND / DEFAULT_UPS).floor() as u64,
            max_updates_per_iteration: None,
        }
    }
}

//=========================================================================
// Unit Tests
//=========================================================================
