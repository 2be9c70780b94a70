//! Prepass configuration signals.
//!
//! Per-thread settings read by every visit. Held in signals so a host that
//! reacts to configuration can track them.

use spark_signals::signal;
use std::cell::RefCell;

/// Default cap on render passes for one function component.
pub const DEFAULT_MAX_RENDER_PASSES: usize = 25;

/// Visit configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Config {
    /// Render passes a function component may take before the visit fails
    /// with `TooManyRenders`.
    pub max_render_passes: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_render_passes: DEFAULT_MAX_RENDER_PASSES,
        }
    }
}

thread_local! {
    static CONFIG: RefCell<spark_signals::Signal<Config>> = RefCell::new(signal(Config::default()));
}

/// Get the current configuration.
pub fn config() -> Config {
    CONFIG.with(|c| c.borrow().get())
}

/// Replace the configuration.
///
/// A cap of zero is raised to one: a component always renders at least once.
pub fn set_config(config: Config) {
    let config = Config {
        max_render_passes: config.max_render_passes.max(1),
    };
    CONFIG.with(|c| c.borrow().set(config));
}

/// Restore the default configuration.
pub fn reset_config() {
    CONFIG.with(|c| c.borrow().set(Config::default()));
}

/// Get the configuration signal for reactive tracking.
pub fn config_signal() -> spark_signals::Signal<Config> {
    CONFIG.with(|c| c.borrow().clone())
}
