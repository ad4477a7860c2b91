use std::path::PathBuf;

use argparse::{ArgumentParser, Print, StoreOption, StoreTrue};

pub struct ArgsOptions {
    // Overrides the config.ini next to the executable
    pub config_file_path: Option<PathBuf>,
    pub dry_run: bool,
}

impl ArgsOptions {
    pub fn parse() -> Self {
        let mut options = ArgsOptions::default();

        {
            let mut parser = ArgumentParser::new();
            parser.set_description(
                "Set the fan duty cycles of an ASRock Rack board with a raw IPMI command",
            );

            // Configuration file path
            parser.refer(&mut options.config_file_path).add_option(
                &["-c", "--config"],
                StoreOption,
                "The file path of the configuration file",
            );

            // Build and print the command without running it
            parser.refer(&mut options.dry_run).add_option(
                &["-n", "--dry-run"],
                StoreTrue,
                "Print the ipmitool command without executing it",
            );

            // Show program version
            parser.add_option(
                &["-V", "--version"],
                Print(env!("CARGO_PKG_VERSION").to_string()),
                "Show the program version",
            );

            parser.parse_args_or_exit();
        }

        options
    }
}

impl Default for ArgsOptions {
    fn default() -> Self {
        Self {
            config_file_path: None,
            dry_run: false,
        }
    }
}
