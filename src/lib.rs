// src/lib.rs

//! A full-screen crash screen: a solid background with one line of status
//! text, drawn into display-server buffers on every output.

pub mod colour;
pub mod config;
pub mod display;
pub mod geometry;
pub mod pixel_buffer;
pub mod rasterizer;
pub mod reporter;

pub use reporter::CrashReporter;
