use chrono::Duration;
use data_encoding::BASE32_NOPAD;
use rand::RngCore;
use tracing::{info, warn};

use crate::error::{AppError, AppResult};
use crate::models::{Session, User, UserRole};

use super::{AppState, SESSION_TTL_SECONDS, new_id, now};

#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub password: String,
    pub role: UserRole,
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub is_active: bool,
}

/// Partial account update. Passwords change only through `reset_password`.
#[derive(Debug, Clone, Default)]
pub struct UserPatch {
    pub username: Option<String>,
    pub role: Option<UserRole>,
    pub name: Option<String>,
    pub email: Option<Option<String>>,
    pub phone: Option<Option<String>>,
    pub is_active: Option<bool>,
}

pub fn list_users(state: &AppState) -> AppResult<Vec<User>> {
    state.users.load_all()
}

pub fn get_user_by_id(state: &AppState, id: &str) -> AppResult<Option<User>> {
    state.users.find(|u| u.id == id)
}

/// Active accounts holding `role`.
pub fn list_users_by_role(state: &AppState, role: UserRole) -> AppResult<Vec<User>> {
    state.users.filter(|u| u.role == role && u.is_active)
}

pub fn create_user(state: &AppState, input: NewUser) -> AppResult<User> {
    let username = input.username.trim().to_string();
    if username.is_empty() {
        return Err(AppError::validation("username is required"));
    }
    if input.password.is_empty() {
        return Err(AppError::validation("password is required"));
    }
    if input.name.trim().is_empty() {
        return Err(AppError::validation("name is required"));
    }

    let mut users = state.users.load_all()?;
    if input.is_active {
        ensure_username_free(&users, &username, None)?;
    }

    let user = User {
        id: new_id(),
        username,
        password: input.password,
        role: input.role,
        name: input.name.trim().to_string(),
        email: input.email,
        phone: input.phone,
        created_at: now(),
        is_active: input.is_active,
    };
    users.push(user.clone());
    state.users.save_all(&users)?;

    info!(user_id = %user.id, username = %user.username, role = %user.role, "user created");
    Ok(user)
}

pub fn update_user(state: &AppState, id: &str, patch: UserPatch) -> AppResult<User> {
    let mut users = state.users.load_all()?;
    let idx = users
        .iter()
        .position(|u| u.id == id)
        .ok_or_else(|| AppError::not_found("user", id))?;

    let mut updated = users[idx].clone();
    if let Some(username) = patch.username {
        updated.username = username.trim().to_string();
    }
    if let Some(role) = patch.role {
        updated.role = role;
    }
    if let Some(name) = patch.name {
        updated.name = name.trim().to_string();
    }
    if let Some(email) = patch.email {
        updated.email = email;
    }
    if let Some(phone) = patch.phone {
        updated.phone = phone;
    }
    if let Some(is_active) = patch.is_active {
        updated.is_active = is_active;
    }

    if updated.username.is_empty() {
        return Err(AppError::validation("username is required"));
    }
    if updated.name.is_empty() {
        return Err(AppError::validation("name is required"));
    }
    if updated.is_active {
        ensure_username_free(&users, &updated.username, Some(id))?;
    }

    users[idx] = updated.clone();
    state.users.save_all(&users)?;

    info!(user_id = %id, "user updated");
    Ok(updated)
}

pub fn reset_password(state: &AppState, id: &str, new_password: &str) -> AppResult<()> {
    if new_password.is_empty() {
        return Err(AppError::validation("password is required"));
    }
    let mut users = state.users.load_all()?;
    let user = users
        .iter_mut()
        .find(|u| u.id == id)
        .ok_or_else(|| AppError::not_found("user", id))?;
    user.password = new_password.to_string();
    state.users.save_all(&users)?;

    info!(user_id = %id, "password reset");
    Ok(())
}

/// Returns whether an account was removed; unknown ids are a no-op.
pub fn delete_user(state: &AppState, id: &str) -> AppResult<bool> {
    let removed = state.users.remove_where(|u| u.id == id)? > 0;
    if removed {
        info!(user_id = %id, "user deleted");
    }
    Ok(removed)
}

fn ensure_username_free(users: &[User], username: &str, except_id: Option<&str>) -> AppResult<()> {
    let taken = users.iter().any(|u| {
        u.is_active
            && Some(u.id.as_str()) != except_id
            && u.username.eq_ignore_ascii_case(username)
    });
    if taken {
        return Err(AppError::validation(format!(
            "username {username} is already in use"
        )));
    }
    Ok(())
}

/// Exact match on username, password and role against an active account.
/// On success the account snapshot becomes the current session.
pub fn login(state: &AppState, username: &str, password: &str, role: UserRole) -> AppResult<bool> {
    let found = state.users.find(|u| {
        u.username == username && u.password == password && u.role == role && u.is_active
    })?;

    let Some(user) = found else {
        warn!(username = %username, role = %role, "login rejected");
        return Ok(false);
    };

    let mut token_bytes = [0u8; 32];
    rand::rng().fill_bytes(&mut token_bytes);
    let token = BASE32_NOPAD.encode(&token_bytes);

    let logged_in_at = now();
    state.session.set(&Session {
        token,
        user: user.clone(),
        logged_in_at,
        expires_at: logged_in_at + Duration::seconds(SESSION_TTL_SECONDS),
    })?;

    info!(user_id = %user.id, role = %role, "login");
    Ok(true)
}

pub fn logout(state: &AppState) -> AppResult<()> {
    state.session.clear()?;
    info!("logout");
    Ok(())
}

/// Current session, or `None` when nobody is logged in or it has expired.
pub fn current_session(state: &AppState) -> AppResult<Option<Session>> {
    let Some(session) = state.session.get()? else {
        return Ok(None);
    };
    if session.expires_at <= now() {
        // Remove expired session
        state.session.clear()?;
        return Ok(None);
    }
    Ok(Some(session))
}
