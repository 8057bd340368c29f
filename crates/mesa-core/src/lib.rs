//! # MESA Output Reader - Core Library
//!
//! Reads the text output of the MESA stellar evolution code into
//! queryable tables.
//!
//! ## Supported Files
//!
//! - History and profile logs (`.data`, `.log`)
//! - Saved models (`.mod`), including Fortran `D` exponents
//! - Profile indexes (`profiles.index`)
//! - Whole LOGS directories, linking profiles to history rows by model number
//!
//! ## Features
//!
//! - Derived fields: `L` from `log_L`, `R` from `lnR`, `log_T` from `T`
//! - Model-number indexing of histories
//! - Automatic removal of history rows left behind by backups and restarts
//! - Optional memoization of profiles
//! - Structured logging via `tracing` for diagnostics
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use mesa_core::{LogDir, MesaData};
//!
//! let history = MesaData::open("LOGS/history.data").unwrap();
//! let ages = history.data("star_age").unwrap();
//! println!("{} models", ages.len());
//!
//! // Linear luminosity even though only log_L is written
//! let lum = history.data("L").unwrap();
//! println!("Final L: {:?}", lum.get(lum.len() - 1));
//!
//! let mut logs = LogDir::open("LOGS").unwrap();
//! let last_profile = logs.profile_data(None, None).unwrap();
//! println!("{}", last_profile);
//! ```
//!
//! ## Selecting Models
//!
//! ```rust,no_run
//! use mesa_core::LogDir;
//!
//! let logs = LogDir::open("LOGS").unwrap();
//! let old_and_bright = logs
//!     .select_models(
//!         |v| v[0].as_f64() > Some(1e9) && v[1].as_f64() > Some(3.0),
//!         &["star_age", "log_L"],
//!     )
//!     .unwrap();
//! ```
//!
//! ## Enabling Logging
//!
//! This library uses `tracing` for structured logging. To see log output,
//! initialize a tracing subscriber in your application:
//!
//! ```rust,ignore
//! tracing_subscriber::fmt::init();
//! let history = mesa_core::read("LOGS/history.data").unwrap();
//! ```

mod config;
mod history;
mod index;
mod log_dir;
mod model_parser;
mod numeric;
mod parser;
mod reader;
mod resolver;
mod table;
mod types;

// Re-export public types
pub use types::{
    Column,
    FileKind,
    // Error types
    MesaError,
    Result,
    Value,
    // Constants
    DEFAULT_BULK_NAMES_LINE,
    DEFAULT_HEADER_NAMES_LINE,
    DEFAULT_INDEX_START_LINE,
    LEGACY_BULK_NAMES_LINE,
    LEGACY_HEADER_NAMES_LINE,
    MODEL_NUMBER,
    STAR_AGE,
    ZONE,
};

pub use config::{IndexLayout, LogDirConfig, LogLayout, ReadOptions};
pub use history::superseded_rows;
pub use index::{IndexEntry, ProfileIndex};
pub use log_dir::LogDir;
pub use numeric::normalize_exponent;
pub use reader::{is_blank, is_comment};
pub use resolver::{resolve, Resolution, Transform};
pub use table::{Field, MesaData};

// ============================================================================
// Public API Functions
// ============================================================================

/// Read a history, profile or model file, detecting the kind from the
/// extension.
///
/// # Example
/// ```rust,no_run
/// let profile = mesa_core::read("LOGS/profile12.data").unwrap();
/// println!("{} zones", profile.num_rows());
/// ```
pub fn read<P: AsRef<std::path::Path>>(path: P) -> Result<MesaData> {
    MesaData::open(path)
}

/// Read a file with explicit options (file kind, line layout)
pub fn read_with<P: AsRef<std::path::Path>>(path: P, options: &ReadOptions) -> Result<MesaData> {
    MesaData::open_with(path, options)
}
