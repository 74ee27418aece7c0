pub mod capture;
pub mod config;
pub mod frame;
pub mod protocol;
pub mod skeleton;
