//! Claim variants.
//!
//! Each variant is a plain struct with typed fields. They are converted to
//! and from the JSON claim set only when a token is signed or parsed.

use crate::errors::{JwtError, Result};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use uuid::Uuid;

/// Reserved identity that must never appear as an ordinary bearer subject
pub const SUPER_ADMIN_ID: Uuid = Uuid::from_u128(1);

/// Registered claims shared by every variant
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StandardClaims {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub iss: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub sub: String,

    #[serde(
        default,
        skip_serializing_if = "Vec::is_empty",
        deserialize_with = "string_or_list::deserialize"
    )]
    pub aud: Vec<String>,

    #[serde(default)]
    pub iat: u64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exp: Option<u64>,

    /// Emitted as one space-delimited string
    #[serde(default, skip_serializing_if = "Vec::is_empty", with = "space_delimited")]
    pub scope: Vec<String>,
}

impl StandardClaims {
    pub fn with_subject(sub: impl Into<String>) -> Self {
        Self {
            sub: sub.into(),
            ..Default::default()
        }
    }
}

impl AsRef<StandardClaims> for StandardClaims {
    fn as_ref(&self) -> &StandardClaims {
        self
    }
}

/// Claims of an authenticated user, snapshotted at issuance
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserClaims {
    #[serde(flatten)]
    pub standard: StandardClaims,

    #[serde(rename = "pvd", default, skip_serializing_if = "String::is_empty")]
    pub provider: String,

    #[serde(rename = "adm", default, skip_serializing_if = "is_false")]
    pub admin: bool,

    #[serde(rename = "rst", default, skip_serializing_if = "is_false")]
    pub restricted: bool,

    #[serde(rename = "cnf", default, skip_serializing_if = "is_false")]
    pub confirmed: bool,

    #[serde(rename = "vrd", default, skip_serializing_if = "is_false")]
    pub verified: bool,
}

impl UserClaims {
    /// Claims for `user_id`. The super-admin identity is refused.
    pub fn for_user(user_id: Uuid, provider: impl Into<String>) -> Result<Self> {
        if user_id == SUPER_ADMIN_ID {
            return Err(JwtError::ReservedSubject(user_id.to_string()));
        }
        Ok(Self {
            standard: StandardClaims::with_subject(user_id.to_string()),
            provider: provider.into(),
            ..Default::default()
        })
    }

    /// Subject as a UUID.
    ///
    /// Returns `Uuid::nil()` when the subject does not parse or names the
    /// super admin.
    pub fn user_id(&self) -> Uuid {
        match Uuid::parse_str(&self.standard.sub) {
            Ok(id) if id != SUPER_ADMIN_ID => id,
            _ => Uuid::nil(),
        }
    }

    pub fn provider(&self) -> &str {
        &self.provider
    }

    pub fn admin(&self) -> bool {
        self.admin
    }

    pub fn restricted(&self) -> bool {
        self.restricted
    }

    pub fn confirmed(&self) -> bool {
        self.confirmed
    }

    pub fn verified(&self) -> bool {
        self.verified
    }
}

impl AsRef<StandardClaims> for UserClaims {
    fn as_ref(&self) -> &StandardClaims {
        &self.standard
    }
}

/// Claims attached to outgoing webhook calls
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WebhookClaims {
    #[serde(flatten)]
    pub standard: StandardClaims,

    /// Hex SHA-256 of the payload
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub chk: String,
}

impl WebhookClaims {
    pub fn new(subject: impl Into<String>, payload: &[u8]) -> Self {
        Self {
            standard: StandardClaims::with_subject(subject),
            chk: checksum(payload),
        }
    }

    pub fn verify_checksum(&self, payload: &[u8]) -> bool {
        !self.chk.is_empty() && self.chk == checksum(payload)
    }
}

impl AsRef<StandardClaims> for WebhookClaims {
    fn as_ref(&self) -> &StandardClaims {
        &self.standard
    }
}

/// Sealed set of claim shapes a token can carry
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Claims {
    Standard(StandardClaims),
    User(UserClaims),
    Webhook(WebhookClaims),
}

impl Claims {
    pub fn standard(&self) -> &StandardClaims {
        match self {
            Claims::Standard(claims) => claims,
            Claims::User(claims) => &claims.standard,
            Claims::Webhook(claims) => &claims.standard,
        }
    }

    pub(crate) fn standard_mut(&mut self) -> &mut StandardClaims {
        match self {
            Claims::Standard(claims) => claims,
            Claims::User(claims) => &mut claims.standard,
            Claims::Webhook(claims) => &mut claims.standard,
        }
    }

    pub fn subject(&self) -> &str {
        &self.standard().sub
    }
}

impl From<StandardClaims> for Claims {
    fn from(claims: StandardClaims) -> Self {
        Claims::Standard(claims)
    }
}

impl From<UserClaims> for Claims {
    fn from(claims: UserClaims) -> Self {
        Claims::User(claims)
    }
}

impl From<WebhookClaims> for Claims {
    fn from(claims: WebhookClaims) -> Self {
        Claims::Webhook(claims)
    }
}

fn checksum(payload: &[u8]) -> String {
    hex::encode(Sha256::digest(payload))
}

fn is_false(value: &bool) -> bool {
    !*value
}

/// `aud` may be a single string or an array
mod string_or_list {
    use serde::{Deserialize, Deserializer};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrMany {
        One(String),
        Many(Vec<String>),
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<String>, D::Error> {
        Ok(match OneOrMany::deserialize(deserializer)? {
            OneOrMany::One(value) if value.is_empty() => Vec::new(),
            OneOrMany::One(value) => vec![value],
            OneOrMany::Many(values) => values,
        })
    }
}

/// `scope` travels as a space-delimited string; arrays are accepted on input
mod space_delimited {
    use serde::{Deserialize, Deserializer, Serializer};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Scope {
        Joined(String),
        List(Vec<String>),
    }

    pub fn serialize<S: Serializer>(scopes: &[String], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&scopes.join(" "))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<String>, D::Error> {
        Ok(match Scope::deserialize(deserializer)? {
            Scope::Joined(value) => value.split_whitespace().map(str::to_string).collect(),
            Scope::List(values) => values,
        })
    }
}
