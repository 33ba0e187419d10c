//! tidebook-auth — identity for the admission flow.
//!
//! Users sign in with email + password and get back an opaque session
//! token. Admission requests may carry that token; resolution maps it to
//! the acting identity, and reservations record who admitted them.
//!
//! Token resolution is deliberately forgiving: blank, unknown, or expired
//! tokens resolve to "nobody" rather than an error, so a stale login can
//! never block a sale.

pub mod error;
pub mod password;
pub mod session;

pub use error::{AuthError, AuthResult};
pub use password::{hash_password, verify_password};
pub use session::{
    SESSION_TTL_DAYS, SessionHandle, resolve_token, seed_users, set_role, sign_in, sign_out,
    sign_up,
};
