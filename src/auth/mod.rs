pub mod credentials;
pub mod token;
pub mod token_manager;

pub use credentials::Credentials;
pub use token::{AccessToken, TokenResponse};
pub use token_manager::TokenManager;
