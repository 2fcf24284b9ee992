pub mod catalog;
pub mod context;
pub mod dispatcher;
pub mod intent;
pub mod llm;
pub mod matcher;

pub use dispatcher::ResponseDispatcher;
pub use llm::{HistoryBuffer, LlmGateway, ModelParams, APOLOGY};
