use std::{io, path::PathBuf};

use thiserror::Error;

use crate::command_runner::ToolStatus;

pub const TROUBLESHOOTING_HINT: &str = "Troubleshooting: Is the IPMI interface correct? \
     Are the kernel modules (ipmi_devintf, ipmi_si, ipmi_msghandler) loaded for '-I open'?";

// Every failure of a run, each one is terminal
#[derive(Debug, Error)]
pub enum FanControlError {
    #[error("Could not determine the program location: {source}")]
    ProgramLocation {
        #[source]
        source: io::Error,
    },
    #[error("Configuration file not found at {}", path.display())]
    ConfigNotFound { path: PathBuf },
    #[error("Failed to read configuration file '{}': {source}", path.display())]
    ConfigUnreadable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("Configuration error in '{}': {reason}", path.display())]
    ConfigMalformed { path: PathBuf, reason: String },
    #[error(
        "Invalid number in [FanSpeeds] section of '{}': {key} = '{value}'",
        path.display()
    )]
    ConfigInvalidValue {
        path: PathBuf,
        key: String,
        value: String,
    },
    #[error(
        "Fan speed {value}% on channel {channel} is out of range. Must be between 0 and 100."
    )]
    ValueOutOfRange { channel: usize, value: i64 },
    #[error(
        "The command '{tool}' was not found or is not executable ({source}).\n\
         Please ensure 'ipmitool' is installed and the path in config.ini is correct."
    )]
    ToolNotFound {
        tool: String,
        #[source]
        source: io::Error,
    },
    #[error("Failed to start '{tool}': {source}")]
    ToolSpawn {
        tool: String,
        #[source]
        source: io::Error,
    },
    #[error(
        "ipmitool command failed.\n\
         Command: {command}\n\
         Return Code: {status}\n\
         Stderr: {stderr}\n\
         Stdout: {stdout}\n\
         {}",
        TROUBLESHOOTING_HINT
    )]
    ToolExecutionFailed {
        command: String,
        status: ToolStatus,
        stdout: String,
        stderr: String,
    },
}
