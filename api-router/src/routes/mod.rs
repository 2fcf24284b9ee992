pub mod chat;
pub mod conversations;
pub mod events;
pub mod liveness;
pub mod readiness;
pub mod settings;
pub mod webhook;
