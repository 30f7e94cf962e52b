//! Authentication
//!
//! HMAC-signed bearer tokens (access/refresh pair) and the request
//! extractors that resolve them to account rows.

mod middleware;
mod tokens;

pub use middleware::{CurrentUser, MaybeUser};
pub use tokens::{TokenClaims, TokenKind, TokenPair, issue_token_pair, sign_token, verify_token};
