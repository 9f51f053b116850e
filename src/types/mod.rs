// Shared domain types, used by the engine, the dashboard controller and the
// UI layer alike.

pub mod issue;
pub mod report;
pub mod worker;

pub use issue::*;
pub use report::*;
pub use worker::*;
