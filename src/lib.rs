//! Mosaic Wall realtime state engine library.
//! This crate exposes internal modules for integration testing.
//! The binary entry point is in main.rs.

pub mod cleanup;
pub mod config;
pub mod engine;
pub mod render;
pub mod wall;
pub mod ws;
