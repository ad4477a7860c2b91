use core::fmt;

use crate::{config_manager::Settings, fan_speed::FanSpeedSet};

// ASRock Rack OEM NetFn and the "set fan duty" command
const NETFN_ASROCK: &str = "0x3a";
const CMD_SET_FAN_DUTY: &str = "0x01";

// A fully built `ipmitool raw` invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IpmiCommand {
    tool_path: String,
    interface: String,
    speeds: FanSpeedSet,
}

impl IpmiCommand {
    pub fn new(settings: &Settings, speeds: FanSpeedSet) -> Self {
        Self {
            tool_path: settings.tool_path.clone(),
            interface: settings.interface.clone(),
            speeds,
        }
    }

    // The executable to spawn
    pub fn program(&self) -> &str {
        &self.tool_path
    }

    // Arguments passed to the executable, without the program itself
    pub fn args(&self) -> Vec<String> {
        let mut args = vec![
            "-I".to_string(),
            self.interface.clone(),
            "raw".to_string(),
            NETFN_ASROCK.to_string(),
            CMD_SET_FAN_DUTY.to_string(),
        ];

        args.extend(self.speeds.iter().map(|speed| speed.to_hex()));

        args
    }

    // The full argument vector, program first
    pub fn argv(&self) -> Vec<String> {
        let mut argv = vec![self.tool_path.clone()];
        argv.extend(self.args());

        argv
    }
}

impl fmt::Display for IpmiCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.argv().join(" "))
    }
}
