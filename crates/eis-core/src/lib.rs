pub mod analysis;
pub mod config;
pub mod device;
pub mod domain;
pub mod driver;
pub mod experiment;
pub mod export;
pub mod observer;
pub mod spectrum;
pub mod store;
pub mod sweep;
