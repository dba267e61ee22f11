//! HTTP API: manual cleanup triggers and service wiring.

pub mod app;
