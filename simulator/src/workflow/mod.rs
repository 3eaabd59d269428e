pub mod calibration;
pub mod config;
pub mod runner;
