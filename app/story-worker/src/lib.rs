pub mod config;
pub mod context;
pub mod error;
pub mod handlers;
pub mod messages;
pub mod probe;

pub use config::Config;
pub use context::{PageContext, WorkerContext};
pub use error::{AppError, Result};
pub use messages::WorkerMessage;
