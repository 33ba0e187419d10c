//! Account and session commands.

use chrono::Utc;

use tidebook_auth::{SessionHandle, seed_users, set_role as auth_set_role, sign_in, sign_out, sign_up};
use tidebook_state::{Role, StateStore};

pub fn seed(store: &StateStore) -> anyhow::Result<()> {
    let created = seed_users(store, Utc::now())?;
    println!("seeded {created} accounts");
    Ok(())
}

pub fn signup(store: &StateStore, email: &str, password: &str, role: Role) -> anyhow::Result<()> {
    let handle = sign_up(store, email, password, role, Utc::now())?;
    print_handle(&handle);
    Ok(())
}

pub fn signin(
    store: &StateStore,
    email: &str,
    password: &str,
    role: Option<Role>,
) -> anyhow::Result<()> {
    let handle = sign_in(store, email, password, role, Utc::now())?;
    print_handle(&handle);
    Ok(())
}

pub fn signout(store: &StateStore, token: &str) -> anyhow::Result<()> {
    sign_out(store, token)?;
    println!("signed out");
    Ok(())
}

pub fn set_role(store: &StateStore, email: &str, role: Role) -> anyhow::Result<()> {
    auth_set_role(store, email, role, Utc::now())?;
    println!("{email} is now {role}");
    Ok(())
}

fn print_handle(handle: &SessionHandle) {
    println!("signed in as {} ({})", handle.email, handle.role);
    println!("token: {}", handle.token);
    println!("expires: {}", handle.expires_at.format("%Y-%m-%d %H:%M UTC"));
}
