//! Session lifecycle: sign-up, sign-in, sign-out, token resolution.

use chrono::{DateTime, Duration, Utc};
use rand::RngCore;
use tracing::debug;

use tidebook_core::UserId;
use tidebook_state::{Role, Session, StateError, StateStore, User};

use crate::error::{AuthError, AuthResult};
use crate::password::{hash_password, verify_password};

/// Sessions live for a week.
pub const SESSION_TTL_DAYS: i64 = 7;

const TOKEN_BYTES: usize = 32;

/// Demo accounts installed by `seed_users`.
const SEED_USERS: &[(&str, &str, Role)] = &[
    ("admin@tidebook.example", "admin123", Role::Admin),
    ("sales@tidebook.example", "sales123", Role::Seller),
];

/// What a caller holds after a successful sign-in.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionHandle {
    pub token: String,
    pub email: String,
    pub role: Role,
    pub expires_at: DateTime<Utc>,
}

/// Create an account and sign it in.
pub fn sign_up(
    store: &StateStore,
    email: &str,
    password: &str,
    role: Role,
    now: DateTime<Utc>,
) -> AuthResult<SessionHandle> {
    let email = normalize_email(email);
    if store.get_user(&email)?.is_some() {
        return Err(AuthError::EmailTaken(email));
    }

    let user = User {
        email: email.clone(),
        password_hash: hash_password(password),
        role,
        created_at: now,
        updated_at: now,
    };
    store.put_user(&user)?;
    debug!(%email, %role, "account created");
    issue_session(store, &user, now)
}

/// Verify credentials and issue a fresh session. Expired sessions for the
/// user are pruned on the way through.
pub fn sign_in(
    store: &StateStore,
    email: &str,
    password: &str,
    expected_role: Option<Role>,
    now: DateTime<Utc>,
) -> AuthResult<SessionHandle> {
    let email = normalize_email(email);
    let user = store
        .get_user(&email)?
        .ok_or(AuthError::UnknownUser(email))?;

    if !verify_password(password, &user.password_hash) {
        return Err(AuthError::IncorrectPassword);
    }
    if let Some(expected) = expected_role
        && expected != user.role
    {
        return Err(AuthError::RoleMismatch);
    }

    store.delete_expired_sessions_for_user(&user.email, now)?;
    issue_session(store, &user, now)
}

/// Revoke a session token. Revoking an unknown token is a no-op.
pub fn sign_out(store: &StateStore, token: &str) -> AuthResult<()> {
    store.delete_session(token)?;
    Ok(())
}

/// Resolve an optional session token to the acting identity.
///
/// Blank, unknown, or expired tokens resolve to `None`; only a store
/// failure is an error, so identity resolution never rejects an
/// otherwise valid admission.
pub fn resolve_token(
    store: &StateStore,
    token: Option<&str>,
    now: DateTime<Utc>,
) -> Result<Option<UserId>, StateError> {
    let Some(token) = token.map(str::trim).filter(|t| !t.is_empty()) else {
        return Ok(None);
    };
    match store.get_session(token)? {
        Some(session) if session.expires_at > now => Ok(Some(session.user_email)),
        _ => Ok(None),
    }
}

/// Change a user's role.
pub fn set_role(
    store: &StateStore,
    email: &str,
    role: Role,
    now: DateTime<Utc>,
) -> AuthResult<()> {
    let email = normalize_email(email);
    store.set_role(&email, role, now)?;
    Ok(())
}

/// Install the demo accounts if they don't exist yet. Returns how many
/// were created.
pub fn seed_users(store: &StateStore, now: DateTime<Utc>) -> AuthResult<u32> {
    let mut created = 0;
    for (email, password, role) in SEED_USERS {
        if store.get_user(email)?.is_none() {
            let user = User {
                email: (*email).to_string(),
                password_hash: hash_password(password),
                role: *role,
                created_at: now,
                updated_at: now,
            };
            store.put_user(&user)?;
            created += 1;
        }
    }
    Ok(created)
}

fn issue_session(store: &StateStore, user: &User, now: DateTime<Utc>) -> AuthResult<SessionHandle> {
    let mut bytes = [0u8; TOKEN_BYTES];
    rand::rng().fill_bytes(&mut bytes);
    let token = hex::encode(bytes);
    let expires_at = now + Duration::days(SESSION_TTL_DAYS);

    store.put_session(&Session {
        token: token.clone(),
        user_email: user.email.clone(),
        created_at: now,
        expires_at,
    })?;
    debug!(email = %user.email, "session issued");

    Ok(SessionHandle {
        token,
        email: user.email.clone(),
        role: user.role,
        expires_at,
    })
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> StateStore {
        StateStore::open_in_memory().unwrap()
    }

    fn now() -> DateTime<Utc> {
        "2024-03-10T15:00:00Z".parse().unwrap()
    }

    #[test]
    fn sign_up_then_sign_in() {
        let store = store();
        sign_up(&store, "Sales@Tidebook.example ", "s3cret", Role::Seller, now()).unwrap();

        let handle =
            sign_in(&store, "sales@tidebook.example", "s3cret", None, now()).unwrap();
        assert_eq!(handle.email, "sales@tidebook.example");
        assert_eq!(handle.role, Role::Seller);
        assert_eq!(handle.expires_at, now() + Duration::days(SESSION_TTL_DAYS));
    }

    #[test]
    fn duplicate_email_is_rejected() {
        let store = store();
        sign_up(&store, "a@tidebook.example", "pw", Role::Seller, now()).unwrap();

        assert!(matches!(
            sign_up(&store, "A@tidebook.example", "pw", Role::Admin, now()),
            Err(AuthError::EmailTaken(_))
        ));
    }

    #[test]
    fn wrong_password_and_wrong_role_fail() {
        let store = store();
        sign_up(&store, "a@tidebook.example", "pw", Role::Seller, now()).unwrap();

        assert!(matches!(
            sign_in(&store, "a@tidebook.example", "nope", None, now()),
            Err(AuthError::IncorrectPassword)
        ));
        assert!(matches!(
            sign_in(&store, "a@tidebook.example", "pw", Some(Role::Admin), now()),
            Err(AuthError::RoleMismatch)
        ));
        assert!(matches!(
            sign_in(&store, "ghost@tidebook.example", "pw", None, now()),
            Err(AuthError::UnknownUser(_))
        ));
    }

    #[test]
    fn token_resolution_is_forgiving() {
        let store = store();
        let handle = sign_up(&store, "a@tidebook.example", "pw", Role::Seller, now()).unwrap();

        assert_eq!(
            resolve_token(&store, Some(&handle.token), now()).unwrap(),
            Some("a@tidebook.example".to_string())
        );
        assert_eq!(resolve_token(&store, None, now()).unwrap(), None);
        assert_eq!(resolve_token(&store, Some("  "), now()).unwrap(), None);
        assert_eq!(resolve_token(&store, Some("bogus"), now()).unwrap(), None);

        let later = now() + Duration::days(SESSION_TTL_DAYS + 1);
        assert_eq!(resolve_token(&store, Some(&handle.token), later).unwrap(), None);
    }

    #[test]
    fn sign_out_revokes_the_token() {
        let store = store();
        let handle = sign_up(&store, "a@tidebook.example", "pw", Role::Seller, now()).unwrap();

        sign_out(&store, &handle.token).unwrap();
        assert_eq!(resolve_token(&store, Some(&handle.token), now()).unwrap(), None);

        // Unknown tokens are a no-op.
        sign_out(&store, "bogus").unwrap();
    }

    #[test]
    fn sign_in_prunes_expired_sessions() {
        let store = store();
        let stale = sign_up(&store, "a@tidebook.example", "pw", Role::Seller, now()).unwrap();

        let later = now() + Duration::days(SESSION_TTL_DAYS + 1);
        sign_in(&store, "a@tidebook.example", "pw", None, later).unwrap();

        assert!(store.get_session(&stale.token).unwrap().is_none());
    }

    #[test]
    fn seeding_is_idempotent() {
        let store = store();
        assert_eq!(seed_users(&store, now()).unwrap(), 2);
        assert_eq!(seed_users(&store, now()).unwrap(), 0);

        let handle =
            sign_in(&store, "admin@tidebook.example", "admin123", Some(Role::Admin), now())
                .unwrap();
        assert_eq!(handle.role, Role::Admin);
    }
}
