//! HTTP middleware stack for the registry.
//!
//! # Middleware Order (bottom to top in Router)
//!
//! 1. Sentry layer (capture errors)
//! 2. `TraceLayer` (request tracing)
//! 3. Body limit (multipart uploads)
//! 4. Session layer (tower-sessions with `PostgreSQL` store)
//!
//! Authentication is enforced per handler through the [`RequireAuth`]
//! extractor rather than a blanket layer, so read-only pages stay public.

pub mod auth;
pub mod flash;
pub mod session;

pub use auth::{OptionalAuth, RequireAuth, clear_current_user, set_current_user};
pub use flash::{Flash, FlashLevel, FlashMessage, push_flash};
pub use session::{create_session_layer, session_layer};
