//! Infrastructure layer: Postgres adapters, asset storage, config, jobs.

pub mod assets;
pub mod config;
pub mod content;
pub mod db;
pub mod jobs;
pub mod ledger;
pub mod locks;

mod integration_tests;
