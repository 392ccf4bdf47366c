pub mod authorize;
pub mod token;

pub use authorize::{AuthorizeRedirect, Authorizer};
pub use token::TokenProvider;
