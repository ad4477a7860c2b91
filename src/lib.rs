pub mod arg_parser;
pub mod command_runner;
pub mod config_manager;
pub mod controller;
pub mod errors;
pub mod fan_speed;
pub mod ipmi_command;
pub mod logger;
