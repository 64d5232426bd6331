// src/config/mod.rs
pub mod eonet;

pub use eonet::EonetConfig;
