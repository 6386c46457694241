use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize)]
pub struct Account {
    pub id: i64,
    pub username: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub full_name: Option<String>,
    pub about: Option<String>,
    pub avatar_url: Option<String>,
    pub is_active: bool,
    pub registered_at: DateTime<Utc>,
    pub last_login: Option<DateTime<Utc>>,
}

impl Account {
    pub fn display_name(&self) -> &str {
        self.full_name.as_deref().unwrap_or(&self.username)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AccountSummary {
    pub id: i64,
    pub username: String,
    pub display_name: String,
}

impl From<&Account> for AccountSummary {
    fn from(account: &Account) -> Self {
        Self {
            id: account.id,
            username: account.username.clone(),
            display_name: account.display_name().to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Registration {
    pub username: String,
    pub email: String,
    pub password: String,
    pub password_confirm: String,
    #[serde(default)]
    pub full_name: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProfileUpdate {
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub about: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn account(full_name: Option<&str>) -> Account {
        Account {
            id: 1,
            username: "writer".to_string(),
            email: "writer@example.com".to_string(),
            password_hash: String::new(),
            full_name: full_name.map(str::to_string),
            about: None,
            avatar_url: None,
            is_active: true,
            registered_at: Utc::now(),
            last_login: None,
        }
    }

    #[test]
    fn test_display_name_prefers_full_name() {
        assert_eq!(account(Some("Jane Writer")).display_name(), "Jane Writer");
        assert_eq!(account(None).display_name(), "writer");
    }

    #[test]
    fn test_password_hash_not_serialized() {
        let json = serde_json::to_value(account(None)).unwrap();
        assert!(json.get("password_hash").is_none());
        assert_eq!(json["username"], "writer");
    }
}
