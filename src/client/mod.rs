//! Client SDK carrying the browser's session logic.

pub mod api;
pub mod controller;
pub mod navigation;
pub mod session;
pub mod token_store;

pub use api::{AuthApi, ClientError, HttpAuthApi};
pub use controller::{CheckOutcome, NetworkStatus, SessionConfig, SessionController};
pub use navigation::{redirect_for, NavigationEffects, Navigator};
pub use session::{reduce, AuthStatus, SessionEvent, SessionState, SessionStore, SignOutReason};
pub use token_store::{FileTokenStore, MemoryTokenStore, TokenStore, TOKEN_STORAGE_KEY};
