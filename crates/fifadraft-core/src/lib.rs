// Library root: the draft game core. The chat transport lives in the bot
// crate and plugs in through the `chat::ChatAdapter` trait.

pub mod chat;
pub mod config;
pub mod draft;
pub mod engine;
pub mod orchestrator;
pub mod pool;
