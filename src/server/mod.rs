mod config;
pub mod guards;
mod http_layers;
pub mod response;
pub mod server;
pub mod session;
pub mod state;

pub use config::ServerConfig;
pub use http_layers::*;
pub use server::{make_app, run_server};
