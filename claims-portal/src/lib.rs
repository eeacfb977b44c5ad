pub mod api;
pub mod config;
pub mod error;
pub mod portal;
pub mod service;
pub mod session;
pub mod storage;
pub mod view_slot;

pub use api::{Credentials, LoginStrategy, PortalClient};
pub use config::{LogFormat, PortalConfig};
pub use error::{ApiError, PortalError, Result, StorageError};
pub use portal::{Portal, Screen};
pub use service::{AppState, build_router};
pub use session::{Role, SessionContext, UserData};
pub use storage::{FileLocalStore, InMemoryLocalStore, LocalStore};
