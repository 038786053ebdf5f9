pub mod dispatch;
pub mod handlers;
pub mod logging;
pub mod server;
pub mod state;
