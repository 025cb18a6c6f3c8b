pub mod data_port;
pub mod config_port;
