//! Error types for lmsensors.
//!
//! All errors implement `std::error::Error` and provide human-readable messages.
//! Error variants are specific enough to allow programmatic handling: a missing
//! configuration file, a configuration the native library rejects, a handle
//! that was initialized twice and a chip name that cannot be rendered are all
//! distinct cases.
//!
//! Native status codes follow the libsensors `SENSORS_ERR_*` numbering, see
//! [`NativeErrorCode`].

use std::ffi::c_int;
use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Primary error type for lmsensors operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// The configuration file could not be opened.
    #[error("cannot open {}: {message}", path.display())]
    Io {
        /// Path that was being opened.
        path: PathBuf,
        /// Kind of the underlying system error.
        kind: io::ErrorKind,
        /// Message of the underlying system error.
        message: String,
    },

    /// The native library rejected the configuration file contents.
    #[error("sensors configuration rejected (code {code}): {message}")]
    Config {
        /// Native status code.
        code: i32,
        /// Message derived from the native status code.
        message: String,
    },

    /// The handle is not in a state that allows the operation.
    #[error("invalid handle state: {reason}")]
    State {
        /// What was wrong with the handle state.
        reason: String,
    },

    /// The native chip name formatter reported a failure.
    #[error("cannot format chip name (code {code}): {message}")]
    Format {
        /// Native status code (negative, as reported).
        code: i32,
        /// Message derived from the native status code.
        message: String,
    },

    /// Reading a subfeature value failed.
    #[error("cannot read {subfeature} (code {code}): {message}")]
    Read {
        /// Name of the subfeature being read.
        subfeature: String,
        /// Native status code.
        code: i32,
        /// Message derived from the native status code.
        message: String,
    },

    /// The native library returned no label for a feature.
    #[error("no label returned for feature {feature}")]
    Label {
        /// Name of the feature.
        feature: String,
    },
}

/// Result type alias for lmsensors operations.
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Create a new `Io` error for `path`.
    #[must_use]
    pub fn io(path: impl AsRef<Path>, err: &io::Error) -> Self {
        Self::Io {
            path: path.as_ref().to_path_buf(),
            kind: err.kind(),
            message: err.to_string(),
        }
    }

    /// Create a new `Config` error.
    #[must_use]
    pub fn config(code: c_int, message: impl Into<String>) -> Self {
        Self::Config {
            code,
            message: message.into(),
        }
    }

    /// Create a new `State` error.
    #[must_use]
    pub fn state(reason: impl Into<String>) -> Self {
        Self::State {
            reason: reason.into(),
        }
    }

    /// The `State` error raised when initializing a handle twice.
    #[must_use]
    pub fn already_initialized() -> Self {
        Self::state("configuration already initialized")
    }

    /// Create a new `Format` error.
    #[must_use]
    pub fn format(code: c_int, message: impl Into<String>) -> Self {
        Self::Format {
            code,
            message: message.into(),
        }
    }

    /// Create a new `Read` error.
    #[must_use]
    pub fn read(subfeature: impl Into<String>, code: c_int, message: impl Into<String>) -> Self {
        Self::Read {
            subfeature: subfeature.into(),
            code,
            message: message.into(),
        }
    }

    /// Create a new `Label` error.
    #[must_use]
    pub fn label(feature: impl Into<String>) -> Self {
        Self::Label {
            feature: feature.into(),
        }
    }

    /// Check if this error comes from opening the configuration file.
    #[must_use]
    pub const fn is_io(&self) -> bool {
        matches!(self, Self::Io { .. })
    }

    /// Check if the native library rejected the configuration.
    #[must_use]
    pub const fn is_config(&self) -> bool {
        matches!(self, Self::Config { .. })
    }

    /// Check if this error is a handle state violation.
    #[must_use]
    pub const fn is_state(&self) -> bool {
        matches!(self, Self::State { .. })
    }

    /// Check if this error comes from chip name formatting.
    #[must_use]
    pub const fn is_format(&self) -> bool {
        matches!(self, Self::Format { .. })
    }

    /// Get the native status code, if the error carries one.
    #[must_use]
    pub const fn error_code(&self) -> Option<i32> {
        match self {
            Self::Config { code, .. } | Self::Format { code, .. } | Self::Read { code, .. } => {
                Some(*code)
            }
            _ => None,
        }
    }
}

/// Status codes reported by libsensors (`SENSORS_ERR_*`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(i32)]
pub enum NativeErrorCode {
    /// Wildcard found in chip name.
    Wildcards = 1,
    /// No such subfeature known.
    NoEntry = 2,
    /// Can't read.
    AccessRead = 3,
    /// Kernel interface error.
    Kernel = 4,
    /// Divide by zero.
    DivZero = 5,
    /// Can't parse chip name.
    ChipName = 6,
    /// Can't parse bus name.
    BusName = 7,
    /// General parse error.
    Parse = 8,
    /// Can't write.
    AccessWrite = 9,
    /// I/O error.
    Io = 10,
    /// Evaluation recurses too deep.
    Recursion = 11,
}

impl NativeErrorCode {
    /// Create from a raw status code. The sign is ignored, as native calls
    /// report failures as negated codes.
    #[must_use]
    pub const fn from_code(code: c_int) -> Option<Self> {
        match code.unsigned_abs() {
            1 => Some(Self::Wildcards),
            2 => Some(Self::NoEntry),
            3 => Some(Self::AccessRead),
            4 => Some(Self::Kernel),
            5 => Some(Self::DivZero),
            6 => Some(Self::ChipName),
            7 => Some(Self::BusName),
            8 => Some(Self::Parse),
            9 => Some(Self::AccessWrite),
            10 => Some(Self::Io),
            11 => Some(Self::Recursion),
            _ => None,
        }
    }

    /// The positive status code.
    #[must_use]
    pub const fn code(self) -> c_int {
        self as c_int
    }

    /// The status code as reported by failing native calls.
    #[must_use]
    pub const fn negated(self) -> c_int {
        -(self as c_int)
    }

    /// The libsensors message for this code.
    #[must_use]
    pub const fn message(self) -> &'static str {
        match self {
            Self::Wildcards => "Wildcard found in chip name",
            Self::NoEntry => "No such subfeature known",
            Self::AccessRead => "Can't read",
            Self::Kernel => "Kernel interface error",
            Self::DivZero => "Divide by zero",
            Self::ChipName => "Can't parse chip name",
            Self::BusName => "Can't parse bus name",
            Self::Parse => "General parse error",
            Self::AccessWrite => "Can't write",
            Self::Io => "I/O error",
            Self::Recursion => "Evaluation recurses too deep",
        }
    }

    /// Message for an arbitrary status code, `"Unknown error"` when unknown.
    #[must_use]
    pub const fn describe(code: c_int) -> &'static str {
        match Self::from_code(code) {
            Some(known) => known.message(),
            None => "Unknown error",
        }
    }
}

impl fmt::Display for NativeErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}
