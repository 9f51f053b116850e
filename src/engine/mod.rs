// engine module: reports backend engine

pub mod backend;
mod interface;
mod refresh;
pub mod stub;

pub use backend::BackendEngine;
pub use interface::{Engine, EngineHandle, Event, Request};
pub use refresh::RefreshScheduler;
pub use stub::StubEngine;
