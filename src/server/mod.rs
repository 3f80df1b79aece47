mod docs;
mod handlers;
mod models;
mod overlay;
mod state;

pub use handlers::run_server;
