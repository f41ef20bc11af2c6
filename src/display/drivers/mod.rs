// src/display/drivers/mod.rs
//! Display driver implementations.

pub mod headless;
pub mod wayland;
