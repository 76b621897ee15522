pub mod config;
pub mod handlers;
pub mod middleware;
pub mod observability;
pub mod resolvers;
pub mod server;
pub mod state;

pub use config::AppConfig;
pub use observability::{apply_logging_level, init_tracing};
pub use server::{build_app, ReelhubServer, ServerBuilder};
pub use state::AppState;
