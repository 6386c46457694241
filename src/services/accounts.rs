use crate::models::{non_empty, Account, ProfileUpdate, Registration};
use crate::services::error::{is_unique_violation, ServiceError};
use crate::Database;
use anyhow::Result;
use argon2::{
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use chrono::{TimeDelta, Utc};
use rand::{rngs::OsRng, RngCore};
use rusqlite::{Connection, OptionalExtension};

pub const MIN_USERNAME_LENGTH: usize = 3;
pub const MIN_PASSWORD_LENGTH: usize = 6;
const MAX_USERNAME_LENGTH: usize = 80;
const MAX_EMAIL_LENGTH: usize = 255;
const MAX_FULL_NAME_LENGTH: usize = 150;

pub(crate) const ACCOUNT_COLUMNS: &str = "id, username, email, password_hash, full_name, about, avatar_url, is_active, registered_at, last_login";

/// Everything wrong with a registration form except uniqueness, which
/// needs the store.
pub fn validate_registration(input: &Registration) -> Vec<String> {
    let mut errors = Vec::new();

    let username_len = input.username.chars().count();
    if username_len < MIN_USERNAME_LENGTH {
        errors.push(format!(
            "Username must be at least {} characters",
            MIN_USERNAME_LENGTH
        ));
    } else if username_len > MAX_USERNAME_LENGTH {
        errors.push(format!(
            "Username must be {} characters or less",
            MAX_USERNAME_LENGTH
        ));
    }

    if input.email.is_empty() || !input.email.contains('@') {
        errors.push("Enter a valid email address".to_string());
    } else if input.email.len() > MAX_EMAIL_LENGTH {
        errors.push(format!(
            "Email must be {} characters or less",
            MAX_EMAIL_LENGTH
        ));
    }

    if input.password.chars().count() < MIN_PASSWORD_LENGTH {
        errors.push(format!(
            "Password must be at least {} characters",
            MIN_PASSWORD_LENGTH
        ));
    }

    if input.password != input.password_confirm {
        errors.push("Passwords do not match".to_string());
    }

    if let Some(name) = &input.full_name {
        if name.chars().count() > MAX_FULL_NAME_LENGTH {
            errors.push(format!(
                "Full name must be {} characters or less",
                MAX_FULL_NAME_LENGTH
            ));
        }
    }

    errors
}

pub fn hash_password(password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();
    let hash = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| anyhow::anyhow!("Password hashing failed: {}", e))?;
    Ok(hash.to_string())
}

const DUMMY_HASH: &str =
    "$argon2id$v=19$m=19456,t=2,p=1$dW5rbm93bg$0000000000000000000000000000000000000000000";

pub fn verify_password(password: &str, hash: &str) -> bool {
    let parsed_hash = match PasswordHash::new(hash) {
        Ok(h) => h,
        Err(_) => {
            burn_dummy_verify(password);
            return false;
        }
    };
    Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok()
}

// Costs about as much as a real verification.
fn burn_dummy_verify(password: &str) {
    if let Ok(dummy) = PasswordHash::new(DUMMY_HASH) {
        let _ = Argon2::default().verify_password(password.as_bytes(), &dummy);
    }
}

pub fn generate_session_token() -> String {
    let mut bytes = [0u8; 32];
    OsRng.fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

/// Create an account. All validation failures are reported together.
pub fn register(db: &Database, input: Registration) -> Result<i64> {
    let input = Registration {
        username: input.username.trim().to_string(),
        email: input.email.trim().to_lowercase(),
        password: input.password,
        password_confirm: input.password_confirm,
        full_name: non_empty(input.full_name),
    };

    let mut errors = validate_registration(&input);
    let conn = db.get()?;

    if username_taken(&conn, &input.username)? {
        errors.push("An account with this username already exists".to_string());
    }
    if email_taken(&conn, &input.email)? {
        errors.push("An account with this email already exists".to_string());
    }
    if !errors.is_empty() {
        return Err(ServiceError::Validation(errors).into());
    }

    let password_hash = hash_password(&input.password)?;
    let inserted = conn.execute(
        "INSERT INTO accounts (username, email, password_hash, full_name, registered_at) VALUES (?, ?, ?, ?, ?)",
        (
            &input.username,
            &input.email,
            &password_hash,
            &input.full_name,
            Utc::now(),
        ),
    );

    match inserted {
        Ok(_) => {
            let id = conn.last_insert_rowid();
            tracing::info!("Account '{}' registered (id={})", input.username, id);
            Ok(id)
        }
        Err(e) if is_unique_violation(&e) => Err(ServiceError::Conflict(
            "An account with this username or email already exists".to_string(),
        )
        .into()),
        Err(e) => Err(e.into()),
    }
}

pub fn authenticate(db: &Database, username: &str, password: &str) -> Result<Account> {
    let username = username.trim();
    if username.is_empty() || password.is_empty() {
        return Err(ServiceError::invalid("Fill in all fields").into());
    }

    let conn = db.get()?;
    let account = find_by_username(&conn, username)?;

    let account = match account {
        Some(a) if verify_password(password, &a.password_hash) => a,
        Some(_) => return Err(ServiceError::InvalidCredentials.into()),
        None => {
            burn_dummy_verify(password);
            return Err(ServiceError::InvalidCredentials.into());
        }
    };

    if !account.is_active {
        return Err(ServiceError::AccountInactive.into());
    }

    let now = Utc::now();
    conn.execute(
        "UPDATE accounts SET last_login = ? WHERE id = ?",
        (now, account.id),
    )?;

    Ok(Account {
        last_login: Some(now),
        ..account
    })
}

pub fn update_profile(db: &Database, account_id: i64, input: ProfileUpdate) -> Result<()> {
    let full_name = non_empty(input.full_name);
    let about = non_empty(input.about);

    if let Some(name) = &full_name {
        if name.chars().count() > MAX_FULL_NAME_LENGTH {
            return Err(ServiceError::invalid(format!(
                "Full name is too long (maximum {} characters)",
                MAX_FULL_NAME_LENGTH
            ))
            .into());
        }
    }

    let conn = db.get()?;
    let affected = conn.execute(
        "UPDATE accounts SET full_name = ?, about = ? WHERE id = ?",
        (&full_name, &about, account_id),
    )?;
    if affected == 0 {
        return Err(ServiceError::NotFound("Account").into());
    }
    Ok(())
}

pub fn update_password(db: &Database, username: &str, password: &str) -> Result<()> {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(ServiceError::invalid(format!(
            "Password must be at least {} characters",
            MIN_PASSWORD_LENGTH
        ))
        .into());
    }
    let password_hash = hash_password(password)?;
    let conn = db.get()?;
    let affected = conn.execute(
        "UPDATE accounts SET password_hash = ? WHERE username = ?",
        (&password_hash, username),
    )?;
    if affected == 0 {
        return Err(ServiceError::NotFound("Account").into());
    }
    Ok(())
}

pub fn set_active(db: &Database, username: &str, active: bool) -> Result<()> {
    let conn = db.get()?;
    let affected = conn.execute(
        "UPDATE accounts SET is_active = ? WHERE username = ?",
        (active, username),
    )?;
    if affected == 0 {
        return Err(ServiceError::NotFound("Account").into());
    }
    if !active {
        conn.execute(
            "DELETE FROM sessions WHERE account_id = (SELECT id FROM accounts WHERE username = ?)",
            [username],
        )?;
    }
    Ok(())
}

/// Delete an account. Its posts and sessions go with it through the
/// schema's `ON DELETE CASCADE`.
pub fn delete_account(db: &Database, username: &str) -> Result<bool> {
    let conn = db.get()?;
    let affected = conn.execute("DELETE FROM accounts WHERE username = ?", [username])?;
    Ok(affected > 0)
}

pub fn get_account(db: &Database, id: i64) -> Result<Option<Account>> {
    let conn = db.get()?;
    let account = conn
        .query_row(
            &format!("SELECT {} FROM accounts WHERE id = ?", ACCOUNT_COLUMNS),
            [id],
            row_to_account,
        )
        .optional()?;
    Ok(account)
}

pub fn get_account_by_username(db: &Database, username: &str) -> Result<Option<Account>> {
    let conn = db.get()?;
    find_by_username(&conn, username)
}

pub fn list_accounts(db: &Database) -> Result<Vec<Account>> {
    let conn = db.get()?;
    let mut stmt = conn.prepare(&format!(
        "SELECT {} FROM accounts ORDER BY registered_at DESC, id DESC",
        ACCOUNT_COLUMNS
    ))?;
    let accounts = stmt
        .query_map([], row_to_account)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(accounts)
}

pub fn has_accounts(db: &Database) -> Result<bool> {
    let conn = db.get()?;
    let count: i64 = conn.query_row("SELECT COUNT(*) FROM accounts", [], |row| row.get(0))?;
    Ok(count > 0)
}

pub fn create_session(db: &Database, account_id: i64, duration_days: i64) -> Result<String> {
    let token = generate_session_token();
    let now = Utc::now();
    let conn = db.get()?;
    conn.execute(
        "INSERT INTO sessions (account_id, token, created_at, expires_at) VALUES (?, ?, ?, ?)",
        (account_id, &token, now, now + TimeDelta::days(duration_days)),
    )?;
    Ok(token)
}

/// The account behind an unexpired session, if it is still active.
pub fn validate_session(db: &Database, token: &str) -> Result<Option<Account>> {
    let conn = db.get()?;
    let account = conn
        .query_row(
            r#"
            SELECT a.id, a.username, a.email, a.password_hash, a.full_name, a.about,
                   a.avatar_url, a.is_active, a.registered_at, a.last_login
            FROM accounts a
            JOIN sessions s ON s.account_id = a.id
            WHERE s.token = ? AND s.expires_at > ? AND a.is_active = 1
            "#,
            (token, Utc::now()),
            row_to_account,
        )
        .optional()?;
    Ok(account)
}

pub fn delete_session(db: &Database, token: &str) -> Result<()> {
    let conn = db.get()?;
    conn.execute("DELETE FROM sessions WHERE token = ?", [token])?;
    Ok(())
}

pub fn cleanup_expired_sessions(db: &Database) -> Result<usize> {
    let conn = db.get()?;
    let removed = conn.execute("DELETE FROM sessions WHERE expires_at <= ?", [Utc::now()])?;
    Ok(removed)
}

fn find_by_username(conn: &Connection, username: &str) -> Result<Option<Account>> {
    let account = conn
        .query_row(
            &format!("SELECT {} FROM accounts WHERE username = ?", ACCOUNT_COLUMNS),
            [username],
            row_to_account,
        )
        .optional()?;
    Ok(account)
}

fn username_taken(conn: &Connection, username: &str) -> Result<bool> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM accounts WHERE username = ?",
        [username],
        |row| row.get(0),
    )?;
    Ok(count > 0)
}

fn email_taken(conn: &Connection, email: &str) -> Result<bool> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM accounts WHERE email = ?",
        [email],
        |row| row.get(0),
    )?;
    Ok(count > 0)
}

pub(crate) fn row_to_account(row: &rusqlite::Row) -> rusqlite::Result<Account> {
    Ok(Account {
        id: row.get(0)?,
        username: row.get(1)?,
        email: row.get(2)?,
        password_hash: row.get(3)?,
        full_name: row.get(4)?,
        about: row.get(5)?,
        avatar_url: row.get(6)?,
        is_active: row.get(7)?,
        registered_at: row.get(8)?,
        last_login: row.get(9)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registration(username: &str, email: &str, password: &str, confirm: &str) -> Registration {
        Registration {
            username: username.to_string(),
            email: email.to_string(),
            password: password.to_string(),
            password_confirm: confirm.to_string(),
            full_name: None,
        }
    }

    #[test]
    fn test_valid_registration_has_no_errors() {
        let input = registration("writer", "w@example.com", "secret1", "secret1");
        assert!(validate_registration(&input).is_empty());
    }

    #[test]
    fn test_registration_collects_every_error() {
        let input = registration("ab", "nope", "123", "456");
        let errors = validate_registration(&input);
        assert_eq!(errors.len(), 4);
        assert!(errors.iter().any(|e| e.contains("Username")));
        assert!(errors.iter().any(|e| e.contains("email")));
        assert!(errors.iter().any(|e| e.contains("at least 6")));
        assert!(errors.iter().any(|e| e.contains("do not match")));
    }

    #[test]
    fn test_hash_and_verify() {
        let hash = hash_password("secret1").unwrap();
        assert!(hash.starts_with("$argon2"));
        assert!(verify_password("secret1", &hash));
        assert!(!verify_password("secret2", &hash));
        assert!(!verify_password("secret1", "not-a-hash"));
    }

    #[test]
    fn test_session_tokens_are_unique() {
        let a = generate_session_token();
        let b = generate_session_token();
        assert_ne!(a, b);
        assert!(a.len() >= 40);
    }
}
