use std::io::Write;

use tracing::{debug, info, warn};

use crate::{
    command_runner::{CommandRunner, ToolOutput},
    config_manager::ConfigManager,
    errors::FanControlError,
    fan_speed::FanSpeedSet,
    ipmi_command::IpmiCommand,
};

type Result<T> = std::result::Result<T, FanControlError>;

pub const START_BANNER: &str = "--- Starting IPMI Fan Control ---";
pub const FINISH_BANNER: &str = "--- IPMI Fan Control Finished ---";

// What a successful run did
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    Applied {
        command: IpmiCommand,
        output: ToolOutput,
    },
    DryRun {
        command: IpmiCommand,
    },
}

impl RunOutcome {
    pub fn command(&self) -> &IpmiCommand {
        match self {
            RunOutcome::Applied { command, .. } => command,
            RunOutcome::DryRun { command } => command,
        }
    }
}

// Load the configuration, build the raw command and send it once.
// Progress is written to `out`, errors are returned to the caller
pub struct Controller<R, W> {
    config_manager: ConfigManager,
    runner: R,
    out: W,

    dry_run: bool,
}

impl<R: CommandRunner, W: Write> Controller<R, W> {
    pub fn new(config_manager: ConfigManager, runner: R, out: W) -> Self {
        Self {
            config_manager,
            runner,
            out,
            dry_run: false,
        }
    }

    // Stop right before spawning the tool
    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub fn run(&mut self) -> Result<RunOutcome> {
        self.report(START_BANNER);

        let config = self.config_manager.load()?;

        self.report(&format!(
            "Using IPMI interface: {}",
            config.settings.interface
        ));
        self.report(&format!(
            "Desired fan speeds (%): {:?}",
            config.fan_percentages
        ));

        let speeds = FanSpeedSet::from_percentages(config.fan_percentages)?;
        debug!("Validated fan speeds: {speeds}");
        let command = IpmiCommand::new(&config.settings, speeds);

        if self.dry_run {
            info!("Dry run, not executing the command");
            self.report(&format!("Command: {command}"));
            self.report("DRY RUN: command not executed.");
            self.report(FINISH_BANNER);

            return Ok(RunOutcome::DryRun { command });
        }

        self.report(&format!("Executing command: {command}"));

        let output = self.runner.run(&command)?;
        debug!("Tool exited with status: {}", output.status);

        if !output.status.success() {
            return Err(FanControlError::ToolExecutionFailed {
                command: command.to_string(),
                status: output.status,
                stdout: output.stdout.trim().to_string(),
                stderr: output.stderr.trim().to_string(),
            });
        }

        self.report("SUCCESS: IPMI command sent successfully.");

        let stdout = output.stdout.trim();
        if !stdout.is_empty() {
            self.report(&format!("Output: {stdout}"));
        }

        self.report(FINISH_BANNER);

        Ok(RunOutcome::Applied { command, output })
    }

    // A closed stdout must not abort the run, the fans matter more
    fn report(&mut self, line: &str) {
        if let Err(err) = writeln!(self.out, "{line}") {
            warn!("Failed to write progress line: {err}");
        }
    }
}

#[cfg(test)]
mod tests {
    use std::{fs, path::Path};

    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    use super::*;
    use crate::command_runner::ToolStatus;

    const VALID_FANS: &str = "\
[FanSpeeds]
fan_1 = 10
fan_2 = 20
fan_3 = 30
fan_4 = 40
fan_5 = 50
fan_6 = 60
fan_7 = 70
fan_8 = 80
";

    // Records every command instead of spawning anything
    struct FakeRunner {
        calls: Vec<Vec<String>>,
        output: ToolOutput,
    }

    impl FakeRunner {
        fn replying(status: ToolStatus, stdout: &str, stderr: &str) -> Self {
            Self {
                calls: Vec::new(),
                output: ToolOutput {
                    status,
                    stdout: stdout.to_string(),
                    stderr: stderr.to_string(),
                },
            }
        }

        fn ok() -> Self {
            Self::replying(ToolStatus::Exited(0), "", "")
        }
    }

    impl CommandRunner for FakeRunner {
        fn run(&mut self, command: &IpmiCommand) -> Result<ToolOutput> {
            self.calls.push(command.argv());
            Ok(self.output.clone())
        }
    }

    fn config_dir(content: &str) -> TempDir {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("config.ini"), content).unwrap();
        dir
    }

    fn controller<'a>(
        dir: &Path,
        runner: &'a mut FakeRunner,
        out: &'a mut Vec<u8>,
    ) -> Controller<&'a mut FakeRunner, &'a mut Vec<u8>> {
        Controller::new(
            ConfigManager::new(&dir.join("config.ini")),
            runner,
            out,
        )
    }

    #[test]
    fn valid_config_sends_one_command() {
        let dir = config_dir(VALID_FANS);
        let mut runner = FakeRunner::replying(ToolStatus::Exited(0), " done \n", "");
        let mut out = Vec::new();

        let outcome = controller(dir.path(), &mut runner, &mut out)
            .run()
            .unwrap();

        assert!(matches!(outcome, RunOutcome::Applied { .. }));
        assert_eq!(
            runner.calls,
            vec![vec![
                "/usr/bin/ipmitool", "-I", "open", "raw", "0x3a", "0x01",
                "0xa", "0x14", "0x1e", "0x28", "0x32", "0x3c", "0x46", "0x50",
            ]]
        );

        let out = String::from_utf8(out).unwrap();
        assert!(out.starts_with(START_BANNER));
        assert!(out.contains("Using IPMI interface: open"));
        assert!(out.contains("Desired fan speeds (%): [10, 20, 30, 40, 50, 60, 70, 80]"));
        assert!(out.contains(
            "Executing command: /usr/bin/ipmitool -I open raw 0x3a 0x01 0xa"
        ));
        assert!(out.contains("SUCCESS"));
        assert!(out.contains("Output: done\n"));
        assert!(out.trim_end().ends_with(FINISH_BANNER));
    }

    #[test]
    fn empty_tool_output_is_not_echoed() {
        let dir = config_dir(VALID_FANS);
        let mut runner = FakeRunner::ok();
        let mut out = Vec::new();

        controller(dir.path(), &mut runner, &mut out).run().unwrap();

        assert!(!String::from_utf8(out).unwrap().contains("Output:"));
    }

    #[test]
    fn missing_fan_key_spawns_nothing() {
        let dir = config_dir(&VALID_FANS.replace("fan_5 = 50\n", ""));
        let mut runner = FakeRunner::ok();
        let mut out = Vec::new();

        let err = controller(dir.path(), &mut runner, &mut out)
            .run()
            .unwrap_err();

        assert!(matches!(err, FanControlError::ConfigMalformed { .. }));
        assert!(err.to_string().contains("fan_5"));
        assert!(runner.calls.is_empty());
    }

    #[test]
    fn out_of_range_value_spawns_nothing() {
        let dir = config_dir(&VALID_FANS.replace("fan_3 = 30", "fan_3 = 150"));
        let mut runner = FakeRunner::ok();
        let mut out = Vec::new();

        let err = controller(dir.path(), &mut runner, &mut out)
            .run()
            .unwrap_err();

        assert!(matches!(
            err,
            FanControlError::ValueOutOfRange { channel: 3, value: 150 }
        ));
        assert!(runner.calls.is_empty());
        assert!(!String::from_utf8(out).unwrap().contains("Executing command"));
    }

    #[test]
    fn absent_config_spawns_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let mut runner = FakeRunner::ok();
        let mut out = Vec::new();

        let err = controller(dir.path(), &mut runner, &mut out)
            .run()
            .unwrap_err();

        assert!(matches!(err, FanControlError::ConfigNotFound { .. }));
        assert!(runner.calls.is_empty());
    }

    #[test]
    fn failing_tool_is_reported_verbatim() {
        let dir = config_dir(VALID_FANS);
        let mut runner =
            FakeRunner::replying(ToolStatus::Exited(2), "", "Invalid command\n");
        let mut out = Vec::new();

        let err = controller(dir.path(), &mut runner, &mut out)
            .run()
            .unwrap_err();

        match &err {
            FanControlError::ToolExecutionFailed {
                command,
                status,
                stderr,
                ..
            } => {
                assert_eq!(*status, ToolStatus::Exited(2));
                assert_eq!(stderr, "Invalid command");
                assert!(command.starts_with("/usr/bin/ipmitool -I open raw 0x3a 0x01"));
            }
            other => panic!("unexpected error: {other}"),
        }

        let message = err.to_string();
        assert!(message.contains("Return Code: 2"));
        assert!(message.contains("Stderr: Invalid command"));
        assert!(message.contains("Troubleshooting"));
        assert_eq!(runner.calls.len(), 1);
        assert!(!String::from_utf8(out).unwrap().contains("SUCCESS"));
    }

    #[test]
    fn two_runs_issue_identical_commands() {
        let dir = config_dir(VALID_FANS);
        let mut runner = FakeRunner::ok();
        let mut out = Vec::new();

        let mut controller = controller(dir.path(), &mut runner, &mut out);
        let first = controller.run().unwrap();
        let second = controller.run().unwrap();
        drop(controller);

        assert_eq!(first.command(), second.command());
        assert_eq!(runner.calls.len(), 2);
        assert_eq!(runner.calls[0], runner.calls[1]);
    }

    #[test]
    fn dry_run_spawns_nothing() {
        let dir = config_dir(VALID_FANS);
        let mut runner = FakeRunner::ok();
        let mut out = Vec::new();

        let outcome = controller(dir.path(), &mut runner, &mut out)
            .dry_run(true)
            .run()
            .unwrap();

        assert_eq!(
            outcome.command().to_string(),
            "/usr/bin/ipmitool -I open raw 0x3a 0x01 0xa 0x14 0x1e 0x28 0x32 0x3c 0x46 0x50"
        );
        assert!(matches!(outcome, RunOutcome::DryRun { .. }));
        assert!(runner.calls.is_empty());

        let out = String::from_utf8(out).unwrap();
        assert!(out.contains("DRY RUN"));
        assert!(out.contains("Command: /usr/bin/ipmitool -I open raw 0x3a 0x01"));
        assert!(!out.contains("Executing command"));
    }
}
