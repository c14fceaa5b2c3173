pub mod blocks;
pub mod config;
pub mod network;

pub use config::ContentNetConfig;
pub use network::ContentNet;
