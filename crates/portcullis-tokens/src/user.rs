//! Issuance input describing a user.

use portcullis_jwt::{Result as JwtResult, UserClaims};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Role {
    #[default]
    User,
    Admin,
    Super,
}

/// Account status, ordered from most to least restricted
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum UserStatus {
    Banned,
    Locked,
    #[default]
    Restricted,
    Active,
    Verified,
}

/// Snapshot of a user taken by the caller at issuance time.
///
/// Tokens reflect the snapshot they were issued from; later changes only
/// show up after the next refresh.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserSnapshot {
    pub id: Uuid,
    pub provider: String,
    pub role: Role,
    pub status: UserStatus,
    /// Email address confirmed
    pub confirmed: bool,
}

impl UserSnapshot {
    pub fn new(id: Uuid, provider: impl Into<String>) -> Self {
        Self {
            id,
            provider: provider.into(),
            ..Default::default()
        }
    }

    pub fn with_status(mut self, status: UserStatus) -> Self {
        self.status = status;
        self
    }

    pub fn with_role(mut self, role: Role) -> Self {
        self.role = role;
        self
    }

    pub fn confirmed(mut self) -> Self {
        self.confirmed = true;
        self
    }

    pub fn is_admin(&self) -> bool {
        self.role >= Role::Admin
    }

    pub fn is_banned(&self) -> bool {
        self.status <= UserStatus::Banned
    }

    pub fn is_locked(&self) -> bool {
        self.status <= UserStatus::Locked
    }

    /// Not locked, but unconfirmed or explicitly restricted
    pub fn is_restricted(&self) -> bool {
        !self.is_locked() && (self.status <= UserStatus::Restricted || !self.confirmed)
    }

    pub fn is_confirmed(&self) -> bool {
        !self.is_locked() && self.confirmed
    }

    pub fn is_active(&self) -> bool {
        self.is_confirmed() && self.status >= UserStatus::Active
    }

    pub fn is_verified(&self) -> bool {
        self.is_confirmed() && self.status >= UserStatus::Verified
    }

    /// Access token claims for this snapshot.
    ///
    /// Fails for the reserved super-admin identity.
    pub fn claims(&self) -> JwtResult<UserClaims> {
        let mut claims = UserClaims::for_user(self.id, self.provider.as_str())?;
        claims.admin = self.is_admin();
        claims.restricted = self.is_restricted();
        claims.confirmed = self.is_confirmed();
        claims.verified = self.is_verified();
        Ok(claims)
    }
}
