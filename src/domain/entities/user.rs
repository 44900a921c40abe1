use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::entity::impl_entity;
use crate::shared::types::PhoneNumber;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UserRole {
    Admin,
    Agent,
    Customer,
}

impl UserRole {
    /// Admins and agents work tickets; customers open them.
    pub fn is_staff(&self) -> bool {
        matches!(self, UserRole::Admin | UserRole::Agent)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub organization_id: Option<String>,
    pub email: String,
    pub full_name: String,
    pub phone: Option<PhoneNumber>,
    #[serde(skip_serializing)]
    #[serde(default)]
    pub password_hash: String,
    pub role: UserRole,
    pub is_active: bool,
    pub last_login_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl_entity!(User, "users", unique = email);

impl User {
    pub fn new(email: &str, full_name: String, password_hash: String, role: UserRole) -> Self {
        let now = crate::shared::utils::now();
        Self {
            id: crate::shared::utils::generate_id(),
            organization_id: None,
            email: Self::normalize_email(email),
            full_name,
            phone: None,
            password_hash,
            role,
            is_active: true,
            last_login_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn normalize_email(email: &str) -> String {
        email.trim().to_lowercase()
    }

    pub fn belongs_to(&self, organization_id: &str) -> bool {
        self.organization_id.as_deref() == Some(organization_id)
    }

    pub fn record_login(&mut self) {
        let now = crate::shared::utils::now();
        self.last_login_at = Some(now);
        self.updated_at = now;
    }

    pub fn change_password(&mut self, password_hash: String) {
        self.password_hash = password_hash;
        self.updated_at = crate::shared::utils::now();
    }

    pub fn deactivate(&mut self) {
        self.is_active = false;
        self.updated_at = crate::shared::utils::now();
    }
}
