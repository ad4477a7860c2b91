use std::{io, process::ExitCode};

use anyhow::Result;
use ipmi_fanctl::{
    arg_parser::ArgsOptions, command_runner::SystemRunner,
    config_manager::ConfigManager, controller::Controller, logger,
};
use tracing::debug;

fn main() -> ExitCode {
    logger::init_logging();

    match try_main() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("ERROR: {err}");

            for cause in err.chain().skip(1) {
                debug!("Caused by: {cause}");
            }

            ExitCode::FAILURE
        }
    }
}

fn try_main() -> Result<()> {
    // Parse the command line arguments
    let args_options = ArgsOptions::parse();

    // Without an explicit path the config lives next to the executable
    let config_manager = match &args_options.config_file_path {
        Some(path) => ConfigManager::new(path),
        None => ConfigManager::beside_executable()?,
    };

    let mut controller =
        Controller::new(config_manager, SystemRunner, io::stdout().lock())
            .dry_run(args_options.dry_run);

    controller.run()?;

    Ok(())
}
