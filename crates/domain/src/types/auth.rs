//! Auth payloads
//!
//! Field names follow the backend's camelCase JSON.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// Access/refresh credential pair.
///
/// Both tokens are opaque strings. `Debug` output is redacted so pairs can be
/// logged as structured fields without leaking credentials.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

impl TokenPair {
    pub fn new(access_token: impl Into<String>, refresh_token: impl Into<String>) -> Self {
        Self { access_token: access_token.into(), refresh_token: refresh_token.into() }
    }
}

impl fmt::Debug for TokenPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenPair")
            .field("access_token", &"<redacted>")
            .field("refresh_token", &"<redacted>")
            .finish()
    }
}

/// `POST /auth/login` body
#[derive(Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

impl LoginRequest {
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self { email: email.into(), password: password.into() }
    }
}

impl fmt::Debug for LoginRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoginRequest")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// `POST /auth/register` body
#[derive(Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
    pub company_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gstin: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
}

impl fmt::Debug for RegisterRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegisterRequest")
            .field("name", &self.name)
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .field("company_name", &self.company_name)
            .field("gstin", &self.gstin)
            .field("phone", &self.phone)
            .finish()
    }
}

/// `POST /auth/refresh` body
#[derive(Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshRequest {
    pub refresh_token: String,
}

/// `POST /auth/logout` body
#[derive(Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogoutRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
}

/// Authenticated user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    pub email: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
    /// Fields this client does not model
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Tenant the user belongs to
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Company {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub gstin: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Response of `POST /auth/login` and `POST /auth/register`
#[derive(Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
    pub user: User,
    #[serde(default)]
    pub company: Option<Company>,
    pub access_token: String,
    pub refresh_token: String,
}

impl AuthResponse {
    /// Token pair embedded in the payload
    pub fn token_pair(&self) -> TokenPair {
        TokenPair::new(self.access_token.clone(), self.refresh_token.clone())
    }
}

impl fmt::Debug for AuthResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthResponse")
            .field("user", &self.user)
            .field("company", &self.company)
            .field("tokens", &"<redacted>")
            .finish()
    }
}

/// Response of `GET /auth/me`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfileResponse {
    pub user: User,
    #[serde(default)]
    pub company: Option<Company>,
}

fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        other => {
            Err(serde::de::Error::custom(format!("expected string or number id, got {other}")))
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn auth_response_reads_camel_case_tokens() {
        let payload = json!({
            "user": {"id": 7, "email": "demo@koshflow.com", "name": "Demo", "role": "ADMIN"},
            "company": {
                "id": "c_1",
                "name": "Demo Traders",
                "gstin": "27AAPFU0939F1ZV",
                "state": "MH"
            },
            "accessToken": "access-1",
            "refreshToken": "refresh-1"
        });

        let response: AuthResponse = serde_json::from_value(payload).unwrap();

        assert_eq!(response.user.id, "7");
        assert_eq!(response.token_pair(), TokenPair::new("access-1", "refresh-1"));
        let company = response.company.unwrap();
        assert_eq!(company.extra.get("state"), Some(&json!("MH")));
    }

    #[test]
    fn token_pair_debug_is_redacted() {
        let rendered = format!("{:?}", TokenPair::new("secret-access", "secret-refresh"));
        assert!(!rendered.contains("secret"));
    }

    #[test]
    fn refresh_request_serializes_camel_case() {
        let body = serde_json::to_value(RefreshRequest { refresh_token: "r".into() }).unwrap();
        assert_eq!(body, json!({"refreshToken": "r"}));
    }
}
