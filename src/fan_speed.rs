use core::fmt;

use crate::errors::FanControlError;

type Result<T> = std::result::Result<T, FanControlError>;

// Number of independently addressable fan outputs on the board
pub const FAN_CHANNELS: usize = 8;

pub const MAX_PERCENT: u8 = 100;

// A fan duty cycle in percent, always between 0 and 100
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FanSpeed {
    speed: u8,
}

impl FanSpeed {
    // Return None if the value is above 100%
    pub fn new(speed: u8) -> Option<FanSpeed> {
        (speed <= MAX_PERCENT).then_some(FanSpeed { speed })
    }

    // Return the stored fan speed
    pub fn get(&self) -> u8 {
        self.speed
    }

    // Render the speed the way ipmitool expects raw bytes: "0x0", "0x32", "0x64"
    pub fn to_hex(&self) -> String {
        format!("{:#x}", self.speed)
    }
}

// The speeds of all the fan channels, index 0 is channel 1
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FanSpeedSet {
    speeds: [FanSpeed; FAN_CHANNELS],
}

impl FanSpeedSet {
    // Validate the configured percentages in channel order.
    // Stops at the first value outside of [0, 100]
    pub fn from_percentages(values: [i64; FAN_CHANNELS]) -> Result<Self> {
        let mut speeds = [FanSpeed { speed: 0 }; FAN_CHANNELS];

        for (idx, value) in values.into_iter().enumerate() {
            speeds[idx] = u8::try_from(value)
                .ok()
                .and_then(FanSpeed::new)
                .ok_or(FanControlError::ValueOutOfRange {
                    channel: idx + 1,
                    value,
                })?;
        }

        Ok(Self { speeds })
    }

    pub fn iter(&self) -> impl Iterator<Item = &FanSpeed> {
        self.speeds.iter()
    }
}

impl fmt::Display for FanSpeedSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[")?;
        for (idx, speed) in self.speeds.iter().enumerate() {
            if idx > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", speed.get())?;
        }
        write!(f, "]")
    }
}
