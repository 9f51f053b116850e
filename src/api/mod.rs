// REST client for the civic reports backend.

mod client;
mod error;

pub use client::{ReportsClient, StatusBody};
pub use error::{ApiError, ApiResult};
