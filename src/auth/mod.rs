//! Authentication: password hashing and session tokens

mod password;
mod token;

pub use password::{hash_password, verify_password, PasswordError};
pub use token::{
    clear_session_cookie, session_cookie, AuthUser, Claims, TokenIssuer, AUTH_COOKIE_NAME,
};
