pub mod oauth;
pub mod store;

pub use oauth::TokenEndpoint;
pub use store::{Credential, CredentialCache, CredentialKey, GrantType, Lookup};
