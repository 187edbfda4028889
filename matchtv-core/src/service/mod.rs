pub mod auth;
pub mod catalog;
pub mod session;

pub use auth::AuthService;
pub use catalog::CatalogService;
pub use session::{SessionPhase, SessionService, StreamSession};
