//! Evaluation configuration.
//!
//! Every knob that influences parsing or evaluation lives in [`Config`] and is
//! passed explicitly to the parser and evaluator entry points. Two evaluations
//! with equal configurations and equal namespaces produce equal results.

use std::{borrow::Cow, fmt, sync::Arc};

use rust_decimal::{Decimal, RoundingStrategy};

/// Largest scale a `rust_decimal::Decimal` can carry.
pub const MAX_SCALE: u32 = 28;

/// Source of the "current time" used by the date built-ins.
pub trait Clock: Send + Sync {
    /// Milliseconds since the Unix epoch.
    fn now_millis(&self) -> i64;
}

/// Wall-clock time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_millis(&self) -> i64 {
        chrono::Utc::now().timestamp_millis()
    }
}

/// A clock frozen at a fixed instant. Used to make date expressions
/// deterministic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedClock {
    millis: i64,
}

impl FixedClock {
    pub fn new(millis: i64) -> Self {
        FixedClock { millis }
    }

    /// Builds a clock from an ISO-8601 date or date-time. Returns `None` when
    /// the text is not a recognised date.
    pub fn from_iso(text: &str) -> Option<Self> {
        crate::evaluator::dates::parse_iso(text).map(|dt| FixedClock::new(dt.timestamp_millis()))
    }
}

impl Clock for FixedClock {
    fn now_millis(&self) -> i64 {
        self.millis
    }
}

/// Parser and evaluator settings.
///
/// # Examples
///
/// ```
/// use tally_lang::Config;
/// use rust_decimal::RoundingStrategy;
///
/// let config = Config::default()
///     .with_scale(2)
///     .with_rounding(RoundingStrategy::MidpointNearestEven)
///     .with_case_sensitive(false);
///
/// assert_eq!(config.scale, 2);
/// assert_eq!(config.normalize_name("Total"), "total");
/// ```
#[derive(Clone)]
pub struct Config {
    /// Number of fractional digits kept after multiplication, division and
    /// power, and used when rendering numbers.
    pub scale: u32,

    /// Rounding applied when a result is cut down to `scale`.
    pub rounding: RoundingStrategy,

    /// When false, variable and function names match regardless of case.
    pub case_sensitive: bool,

    /// Source substituted for empty or whitespace-only input.
    pub default_expression: String,

    /// Time source for `now()` and the other date built-ins.
    pub clock: Arc<dyn Clock>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            scale: 10,
            rounding: RoundingStrategy::MidpointNearestEven,
            case_sensitive: true,
            default_expression: "null".to_string(),
            clock: Arc::new(SystemClock),
        }
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("scale", &self.scale)
            .field("rounding", &self.rounding)
            .field("case_sensitive", &self.case_sensitive)
            .field("default_expression", &self.default_expression)
            .field("now", &self.clock.now_millis())
            .finish()
    }
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the decimal scale, capped at [`MAX_SCALE`].
    pub fn with_scale(mut self, scale: u32) -> Self {
        self.scale = scale.min(MAX_SCALE);
        self
    }

    pub fn with_rounding(mut self, rounding: RoundingStrategy) -> Self {
        self.rounding = rounding;
        self
    }

    pub fn with_case_sensitive(mut self, case_sensitive: bool) -> Self {
        self.case_sensitive = case_sensitive;
        self
    }

    pub fn with_default_expression(mut self, source: impl Into<String>) -> Self {
        self.default_expression = source.into();
        self
    }

    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Arc::new(clock);
        self
    }

    /// Current time according to the configured clock.
    pub fn now_millis(&self) -> i64 {
        self.clock.now_millis()
    }

    /// Rounds a number to the configured scale.
    pub fn round(&self, value: Decimal) -> Decimal {
        value.round_dp_with_strategy(self.scale, self.rounding)
    }

    /// Name as used for lookups: unchanged when case sensitive, lower-cased
    /// otherwise.
    pub fn normalize_name<'a>(&self, name: &'a str) -> Cow<'a, str> {
        if self.case_sensitive {
            Cow::Borrowed(name)
        } else {
            Cow::Owned(name.to_lowercase())
        }
    }

    /// Two names refer to the same entry under this configuration.
    pub fn names_match(&self, a: &str, b: &str) -> bool {
        if self.case_sensitive {
            a == b
        } else {
            a.to_lowercase() == b.to_lowercase()
        }
    }
}

/// Maps a rounding-mode name (`half-even`, `half-up`, `floor`, ...) onto a
/// rounding strategy.
pub fn rounding_from_name(name: &str) -> Option<RoundingStrategy> {
    match name.to_lowercase().replace('_', "-").as_str() {
        "half-even" | "bankers" => Some(RoundingStrategy::MidpointNearestEven),
        "half-up" => Some(RoundingStrategy::MidpointAwayFromZero),
        "half-down" => Some(RoundingStrategy::MidpointTowardZero),
        "up" => Some(RoundingStrategy::AwayFromZero),
        "down" => Some(RoundingStrategy::ToZero),
        "ceiling" => Some(RoundingStrategy::ToPositiveInfinity),
        "floor" => Some(RoundingStrategy::ToNegativeInfinity),
        _ => None,
    }
}
