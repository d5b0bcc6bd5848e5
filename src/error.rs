//! Unified error types for cniwright

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Main error type for network configuration operations
#[derive(Error, Debug)]
pub enum Error {
    // IO errors
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    // Config errors
    #[error("Failed to read config file '{path}': {source}")]
    ConfigRead { path: PathBuf, source: io::Error },

    #[error("Failed to parse config: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error("Config validation failed: {0}")]
    ConfigValidation(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    // Address errors
    #[error("Invalid subnet {subnet:?}: {reason}")]
    InvalidSubnet { subnet: String, reason: String },

    #[error("Invalid gateway {gateway:?}: {reason}")]
    InvalidGateway { gateway: String, reason: String },

    #[error("No matching subnet {subnet} for ip-range {range:?}")]
    RangeOutsideSubnet { subnet: String, range: String },

    #[error("No free subnet available starting from {0}")]
    SubnetExhausted(String),

    // Driver option errors
    #[error("Invalid value {value:?} for option {option:?}: {reason}")]
    InvalidOption {
        option: String,
        value: String,
        reason: String,
    },

    #[error("Unsupported cni driver {0:?}")]
    UnsupportedDriver(String),

    #[error("Unsupported {driver:?} network option {option:?}")]
    UnsupportedOption { driver: String, option: String },

    // IPAM errors
    #[error("Unsupported ipam driver {0:?}")]
    UnsupportedIpamDriver(String),

    #[error("Unparsable ipam option {option} {value:?}")]
    InvalidIpamOption { option: String, value: String },

    #[error("ipam option {0:?} must have a type (provide or request)")]
    MissingIpamOptionType(String),

    // Host network errors
    #[error("Failed to remove network interface {interface}: {message}")]
    InterfaceDeleteFailed { interface: String, message: String },

    #[error("Network namespace error: {0}")]
    Namespace(String),
}

/// Result type alias for cniwright operations
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub(crate) fn invalid_subnet(subnet: &str, reason: impl Into<String>) -> Self {
        Error::InvalidSubnet {
            subnet: subnet.to_string(),
            reason: reason.into(),
        }
    }

    pub(crate) fn invalid_option(option: &str, value: &str, reason: impl Into<String>) -> Self {
        Error::InvalidOption {
            option: option.to_string(),
            value: value.to_string(),
            reason: reason.into(),
        }
    }
}
