/// Staged LQR Tuner Library
///
/// Shared modules for the tuner GUI and bench tools

pub mod controller;
pub mod params;
pub mod protocol;
pub mod robot_link;
