use std::time::Duration;

use smol_str::SmolStr;

/// Quiet period after the last edit before a check is issued.
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(700);

/// Language used until the user picks one.
pub const DEFAULT_LANGUAGE: &str = "en-US";

/// Fixed-interval retry settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub interval: Duration,
}

impl RetryPolicy {
    /// The language list is polled while the checker is still starting up.
    pub const LANGUAGE_POLL: Self = Self {
        max_attempts: 60,
        interval: Duration::from_secs(2),
    };
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::LANGUAGE_POLL
    }
}

/// Popover size and placement, in surface units.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PopoverGeometry {
    pub width: f64,
    /// Gap between the bottom of the annotation and the popover.
    pub gap: f64,
}

impl Default for PopoverGeometry {
    fn default() -> Self {
        Self {
            width: 340.0,
            gap: 6.0,
        }
    }
}

/// Editor configuration.
#[derive(Debug, Clone)]
pub struct EditorConfig {
    pub debounce: Duration,
    pub default_language: SmolStr,
    pub language_retry: RetryPolicy,
    pub popover: PopoverGeometry,
    /// Most suggestions shown in one popover.
    pub max_suggestions: usize,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            debounce: DEFAULT_DEBOUNCE,
            default_language: SmolStr::new_static(DEFAULT_LANGUAGE),
            language_retry: RetryPolicy::LANGUAGE_POLL,
            popover: PopoverGeometry::default(),
            max_suggestions: 5,
        }
    }
}
