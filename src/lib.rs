pub mod client;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod oauth;
pub mod store;
pub mod types;

pub use client::UserClient;
pub use config::{ClientMode, Credentials, RefreshTokenPolicy};
pub use dispatch::{Dispatcher, RequestOptions};
pub use error::UserlinkError;
pub use oauth::{AuthorizeRedirect, Authorizer, TokenProvider};
pub use store::{MemoryStore, TokenStore};
pub use types::{ApiPayload, RawPayload};
