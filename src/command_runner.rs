use core::fmt;
use std::{
    io,
    process::{Command, ExitStatus, Stdio},
};

use tracing::{debug, trace};

use crate::{errors::FanControlError, ipmi_command::IpmiCommand};

type Result<T> = std::result::Result<T, FanControlError>;

// How the external tool terminated
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolStatus {
    Exited(i32),
    Signaled(i32),
    Unknown,
}

impl ToolStatus {
    pub fn success(&self) -> bool {
        *self == ToolStatus::Exited(0)
    }
}

impl From<ExitStatus> for ToolStatus {
    fn from(status: ExitStatus) -> Self {
        if let Some(code) = status.code() {
            return ToolStatus::Exited(code);
        }

        #[cfg(unix)]
        {
            use std::os::unix::process::ExitStatusExt;

            if let Some(signal) = status.signal() {
                return ToolStatus::Signaled(signal);
            }
        }

        ToolStatus::Unknown
    }
}

impl fmt::Display for ToolStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ToolStatus::Exited(code) => write!(f, "{code}"),
            ToolStatus::Signaled(signal) => {
                write!(f, "terminated by signal {signal}")
            }
            ToolStatus::Unknown => write!(f, "unknown"),
        }
    }
}

// Everything observed from a finished tool run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolOutput {
    pub status: ToolStatus,
    pub stdout: String,
    pub stderr: String,
}

// Execute a built IPMI command and wait for it to finish
pub trait CommandRunner {
    fn run(&mut self, command: &IpmiCommand) -> Result<ToolOutput>;
}

impl<R: CommandRunner + ?Sized> CommandRunner for &mut R {
    fn run(&mut self, command: &IpmiCommand) -> Result<ToolOutput> {
        (**self).run(command)
    }
}

// Spawn the real tool as a child process
#[derive(Debug, Default)]
pub struct SystemRunner;

impl CommandRunner for SystemRunner {
    fn run(&mut self, command: &IpmiCommand) -> Result<ToolOutput> {
        debug!("Spawning: {:?}", command.argv());

        // output() only returns once the child has exited and both
        // pipes are drained, so the child is always reaped here
        let output = Command::new(command.program())
            .args(command.args())
            .stdin(Stdio::null())
            .output()
            .map_err(|source| spawn_error(command.program(), source))?;

        let output = ToolOutput {
            status: output.status.into(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        };

        trace!("Tool finished: {:?}", output);

        Ok(output)
    }
}

fn spawn_error(tool: &str, source: io::Error) -> FanControlError {
    match source.kind() {
        io::ErrorKind::NotFound | io::ErrorKind::PermissionDenied => {
            FanControlError::ToolNotFound {
                tool: tool.to_string(),
                source,
            }
        }
        _ => FanControlError::ToolSpawn {
            tool: tool.to_string(),
            source,
        },
    }
}
