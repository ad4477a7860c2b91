use std::{
    env, fs,
    path::{Path, PathBuf},
};

use ini::{Ini, ParseOption, Properties};
use tracing::{debug, trace};

use crate::{errors::FanControlError, fan_speed::FAN_CHANNELS};

type Result<T> = std::result::Result<T, FanControlError>;

pub const CONFIG_FILE_NAME: &str = "config.ini";

const SETTINGS_SECTION: &str = "Settings";
const FAN_SPEEDS_SECTION: &str = "FanSpeeds";

const TOOL_PATH_KEY: &str = "ipmitool_path";
const INTERFACE_KEY: &str = "interface";

const DEFAULT_TOOL_PATH: &str = "/usr/bin/ipmitool";
const DEFAULT_INTERFACE: &str = "open";

// How to reach the management controller
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub tool_path: String,
    pub interface: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            tool_path: DEFAULT_TOOL_PATH.to_string(),
            interface: DEFAULT_INTERFACE.to_string(),
        }
    }
}

// Parsed configuration, fan values are not range checked yet
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FanControlConfig {
    pub settings: Settings,
    pub fan_percentages: [i64; FAN_CHANNELS],
}

// Locate and read the INI configuration file
pub struct ConfigManager {
    config_path: PathBuf,
}

impl ConfigManager {
    // Create a new configuration manager for an explicit file
    pub fn new(config_path: &Path) -> Self {
        Self {
            config_path: config_path.to_path_buf(),
        }
    }

    // Use the config.ini sitting next to the running executable
    pub fn beside_executable() -> Result<Self> {
        let exe = env::current_exe()
            .and_then(fs::canonicalize)
            .map_err(|source| FanControlError::ProgramLocation { source })?;

        let dir = exe.parent().unwrap_or_else(|| Path::new("/"));

        Ok(Self::new(&dir.join(CONFIG_FILE_NAME)))
    }

    pub fn load(&self) -> Result<FanControlConfig> {
        debug!("Loading config file at: {:?}", self.config_path);

        if !self.config_path.exists() {
            return Err(FanControlError::ConfigNotFound {
                path: self.config_path.clone(),
            });
        }

        let content = fs::read_to_string(&self.config_path).map_err(|source| {
            FanControlError::ConfigUnreadable {
                path: self.config_path.clone(),
                source,
            }
        })?;

        self.parse(&content)
    }

    // Parse the content of a configuration file.
    // Values are taken literally, no quote or escape handling
    pub fn parse(&self, content: &str) -> Result<FanControlConfig> {
        let options = ParseOption {
            enabled_quote: false,
            enabled_escape: false,
            ..Default::default()
        };

        let ini = Ini::load_from_str_opt(content, options)
            .map_err(|err| self.malformed(err.to_string()))?;

        // Every option has to live under a [Section] header
        if ini
            .section(None::<String>)
            .is_some_and(|general| general.iter().next().is_some())
        {
            return Err(self.malformed(
                "File contains options before the first section header"
                    .to_string(),
            ));
        }

        let settings = self.parse_settings(ini.section(Some(SETTINGS_SECTION)))?;
        trace!("Current settings: {:?}", settings);

        let fan_percentages = self.parse_fan_speeds(&ini)?;
        trace!("Current fan speeds: {:?}", fan_percentages);

        Ok(FanControlConfig {
            settings,
            fan_percentages,
        })
    }

    // Missing keys, or a missing section, fall back to the defaults
    fn parse_settings(&self, section: Option<&Properties>) -> Result<Settings> {
        let mut settings = Settings::default();

        if let Some(section) = section {
            if let Some(tool_path) =
                self.option(section, SETTINGS_SECTION, TOOL_PATH_KEY)?
            {
                settings.tool_path = tool_path.to_string();
            }
            if let Some(interface) =
                self.option(section, SETTINGS_SECTION, INTERFACE_KEY)?
            {
                settings.interface = interface.to_string();
            }
        }

        Ok(settings)
    }

    fn parse_fan_speeds(&self, ini: &Ini) -> Result<[i64; FAN_CHANNELS]> {
        let section = ini.section(Some(FAN_SPEEDS_SECTION)).ok_or_else(|| {
            self.malformed(format!("No section: '{FAN_SPEEDS_SECTION}'"))
        })?;

        let mut values = [0; FAN_CHANNELS];

        for (idx, value) in values.iter_mut().enumerate() {
            let key = fan_key(idx + 1);

            let raw = self
                .option(section, FAN_SPEEDS_SECTION, &key)?
                .ok_or_else(|| {
                    self.malformed(format!(
                        "No option '{key}' in section: '{FAN_SPEEDS_SECTION}'"
                    ))
                })?;

            *value = raw.trim().parse().map_err(|_| {
                FanControlError::ConfigInvalidValue {
                    path: self.config_path.clone(),
                    key: key.clone(),
                    value: raw.to_string(),
                }
            })?;
        }

        Ok(values)
    }

    // Option names are matched ignoring case and may appear only once
    fn option<'a>(
        &self,
        section: &'a Properties,
        section_name: &str,
        key: &str,
    ) -> Result<Option<&'a str>> {
        let mut matches = section
            .iter()
            .filter(|(name, _)| name.trim().eq_ignore_ascii_case(key))
            .map(|(_, value)| value);

        let value = matches.next();

        if matches.next().is_some() {
            return Err(self.malformed(format!(
                "Duplicate option '{key}' in section: '{section_name}'"
            )));
        }

        Ok(value)
    }

    fn malformed(&self, reason: String) -> FanControlError {
        FanControlError::ConfigMalformed {
            path: self.config_path.clone(),
            reason,
        }
    }
}

// Key of a 1-based fan channel: fan_1 .. fan_8
pub fn fan_key(channel: usize) -> String {
    format!("fan_{channel}")
}
