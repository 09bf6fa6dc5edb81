//! Tree and simulation configuration.
//!
//! Configuration is loaded from environment variables, falling back to
//! defaults when a variable is unset.
//!
//! # Environment Variables
//!
//! - `MVRB_PAGE_SIZE`: Slots per tree page (default: `256`)
//! - `MVRB_LOAD_FACTOR`: Fraction of a page kept by the left half on split (default: `0.7`)
//! - `MVRB_SIM_SEED`: Seed for the simulation workload (default: `42`)
//! - `MVRB_SIM_OPERATIONS`: Number of simulated operations (default: `10000`)
//! - `MVRB_SIM_CHECK_EVERY`: Structural check interval in operations (default: `100`)
//!
//! # Invariants
//!
//! - `page_size` is always at least `MIN_PAGE_SIZE` after `validate()`
//! - `load_factor` is always in `(0, 1]` after `validate()`

use std::str::FromStr;

/// Smallest page capacity that still leaves both halves of a split non-empty.
pub const MIN_PAGE_SIZE: usize = 2;

/// Shape of the pages a tree allocates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TreeConfig {
    /// Maximum number of key/value slots in one page.
    pub page_size: usize,
    /// Fraction of a full page that stays in the original node when it splits.
    /// Also the fill ratio used by bulk builds.
    pub load_factor: f32,
}

impl Default for TreeConfig {
    fn default() -> Self {
        Self {
            page_size: Self::DEFAULT_PAGE_SIZE,
            load_factor: Self::DEFAULT_LOAD_FACTOR,
        }
    }
}

/// Error returned when loading or validating configuration fails.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// A setting has an invalid value.
    InvalidValue { name: String, message: String },
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidValue { name, message } => {
                write!(f, "invalid value for {name}: {message}")
            }
        }
    }
}

impl std::error::Error for ConfigError {}

impl TreeConfig {
    /// Default page capacity.
    pub const DEFAULT_PAGE_SIZE: usize = 256;
    /// Default split load factor.
    pub const DEFAULT_LOAD_FACTOR: f32 = 0.7;

    /// Create a config with the given page size and the default load factor.
    #[must_use]
    pub const fn new(page_size: usize) -> Self {
        Self {
            page_size,
            load_factor: Self::DEFAULT_LOAD_FACTOR,
        }
    }

    /// Set the page size.
    #[must_use]
    pub const fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size;
        self
    }

    /// Set the load factor.
    #[must_use]
    pub const fn with_load_factor(mut self, load_factor: f32) -> Self {
        self.load_factor = load_factor;
        self
    }

    /// Check that the settings describe a usable page layout.
    ///
    /// # Errors
    ///
    /// Returns an error if `page_size < MIN_PAGE_SIZE` or the load factor is
    /// outside `(0, 1]`.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.page_size < MIN_PAGE_SIZE {
            return Err(ConfigError::InvalidValue {
                name: "page_size".to_string(),
                message: format!("must be at least {MIN_PAGE_SIZE}, got {}", self.page_size),
            });
        }
        if !(self.load_factor > 0.0 && self.load_factor <= 1.0) {
            return Err(ConfigError::InvalidValue {
                name: "load_factor".to_string(),
                message: format!("must be in (0, 1], got {}", self.load_factor),
            });
        }
        Ok(())
    }

    /// Number of slots the left half keeps when a full page splits.
    ///
    /// This is `floor(page_size * load_factor)`, never less than 1.
    #[must_use]
    pub fn split_items(&self) -> usize {
        split_point(self.page_size, self.load_factor)
    }

    /// Load the tree configuration from environment.
    ///
    /// # Errors
    ///
    /// Returns an error if a variable is set but unparsable, or if the
    /// resulting configuration fails `validate()`.
    pub fn from_env() -> Result<Self, ConfigError> {
        let config = Self {
            page_size: load_env("MVRB_PAGE_SIZE", Self::DEFAULT_PAGE_SIZE)?,
            load_factor: load_env("MVRB_LOAD_FACTOR", Self::DEFAULT_LOAD_FACTOR)?,
        };
        config.validate()?;
        Ok(config)
    }
}

/// `floor(capacity * load_factor)`, clamped to at least one slot.
#[must_use]
#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_precision_loss,
    clippy::cast_sign_loss
)] // page capacities are small; the product is non-negative
pub fn split_point(capacity: usize, load_factor: f32) -> usize {
    // Multiplying in f32 keeps e.g. 10 * 0.7 at 7; widening 0.7f32 first
    // gives 6.99999.. and floors one slot short.
    let items = (capacity as f32 * load_factor).floor() as usize;
    items.max(1)
}

/// Settings for the simulation driver binary.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SimulationSettings {
    /// Seed for the workload generator.
    pub seed: u64,
    /// Number of operations to run.
    pub operations: usize,
    /// Run the structural checker every this many operations.
    pub check_every: usize,
    /// Page layout of the tree under test.
    pub tree: TreeConfig,
}

impl SimulationSettings {
    /// Default workload seed.
    pub const DEFAULT_SEED: u64 = 42;
    /// Default number of operations.
    pub const DEFAULT_OPERATIONS: usize = 10_000;
    /// Default structural check interval.
    pub const DEFAULT_CHECK_EVERY: usize = 100;

    /// Load simulation settings (and the tree config) from environment.
    ///
    /// # Errors
    ///
    /// Returns an error if any variable is set but invalid, or if
    /// `MVRB_SIM_CHECK_EVERY` is zero.
    pub fn from_env() -> Result<Self, ConfigError> {
        let check_every = load_env("MVRB_SIM_CHECK_EVERY", Self::DEFAULT_CHECK_EVERY)?;
        if check_every == 0 {
            return Err(ConfigError::InvalidValue {
                name: "MVRB_SIM_CHECK_EVERY".to_string(),
                message: "must be greater than zero".to_string(),
            });
        }

        Ok(Self {
            seed: load_env("MVRB_SIM_SEED", Self::DEFAULT_SEED)?,
            operations: load_env("MVRB_SIM_OPERATIONS", Self::DEFAULT_OPERATIONS)?,
            check_every,
            tree: TreeConfig::from_env()?,
        })
    }
}

/// Load a value from environment.
///
/// Returns the default if not set.
///
/// # Errors
///
/// Returns an error if the value is set but does not parse as `T`.
fn load_env<T: FromStr>(name: &str, default: T) -> Result<T, ConfigError> {
    match std::env::var(name) {
        Ok(value) => value.trim().parse::<T>().map_err(|_| ConfigError::InvalidValue {
            name: name.to_string(),
            message: format!("'{value}' could not be parsed"),
        }),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_values() {
        let config = TreeConfig::default();
        assert_eq!(config.page_size, 256);
        assert!((config.load_factor - 0.7).abs() < f32::EPSILON);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_split_items() {
        assert_eq!(TreeConfig::new(4).split_items(), 2);
        assert_eq!(TreeConfig::new(10).split_items(), 7);
        assert_eq!(TreeConfig::new(2).with_load_factor(0.1).split_items(), 1);
        assert_eq!(TreeConfig::new(8).with_load_factor(1.0).split_items(), 8);
        assert_eq!(TreeConfig::new(100).split_items(), 70);
    }

    #[test]
    fn test_split_items_on_multiples_of_ten() {
        for page_size in (10..=1000).step_by(10) {
            assert_eq!(
                TreeConfig::new(page_size).split_items(),
                page_size * 7 / 10,
                "page size {page_size}"
            );
        }
        assert_eq!(TreeConfig::new(20).with_load_factor(0.5).split_items(), 10);
        assert_eq!(TreeConfig::new(30).with_load_factor(0.9).split_items(), 27);
    }

    #[test]
    fn test_validate_rejects_tiny_pages() {
        let error = TreeConfig::new(1).validate().expect_err("page size 1 is invalid");
        assert!(matches!(error, ConfigError::InvalidValue { ref name, .. } if name == "page_size"));
    }

    #[test]
    fn test_validate_rejects_bad_load_factor() {
        assert!(TreeConfig::new(8).with_load_factor(0.0).validate().is_err());
        assert!(TreeConfig::new(8).with_load_factor(1.5).validate().is_err());
        assert!(TreeConfig::new(8).with_load_factor(f32::NAN).validate().is_err());
    }

    #[test]
    fn test_config_error_display_invalid() {
        let error = ConfigError::InvalidValue {
            name: "TEST_VAR".to_string(),
            message: "bad value".to_string(),
        };
        assert_eq!(error.to_string(), "invalid value for TEST_VAR: bad value");
    }
}
