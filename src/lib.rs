mod config;
mod digest;
mod error;
mod handlers;
mod mailer;
mod push;
mod render;
mod routes;
mod state;
mod types;

pub use config::*;
pub use digest::*;
pub use error::*;
pub use handlers::*;
pub use mailer::*;
pub use push::*;
pub use render::*;
pub use routes::*;
pub use state::*;
pub use types::*;
