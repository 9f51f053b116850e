// Pedantic: suppress noise for internal crate code.
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::return_self_not_must_use)]

pub mod actions;
pub mod api;
pub mod app;
pub mod cli;
pub mod color;
pub mod components;
pub mod config;
pub mod dashboard;
pub mod engine;
pub mod filter;
pub mod map;
pub mod performance;
pub mod store;
pub mod theme;
pub mod transform;
pub mod types;
pub mod util;
pub mod views;
pub mod workflow;
