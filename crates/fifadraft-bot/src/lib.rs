// Chat front end for the draft: WebSocket hub, the hub-backed chat adapter,
// text rendering and the command loop.

pub mod app;
pub mod commands;
pub mod hub;
pub mod hub_chat;
pub mod render;
