//! HTTP Handlers

mod monitor;
mod ping;
mod printer;
mod websocket;

pub use monitor::*;
pub use ping::*;
pub use printer::*;
pub use websocket::*;
