use async_trait::async_trait;
use bson::doc;
use serde::{Deserialize, Serialize};

use super::mongo_repository::{
    enum_value, from_bson_time, to_bson_time, MongoEntity, MongoRepository,
};
use crate::domain::entities::{Organization, User, UserRole};
use crate::domain::repositories::{OrganizationRepository, UserRepository};
use crate::shared::types::PhoneNumber;
use crate::shared::Result;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrganizationDocument {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
    pub slug: String,
    pub is_active: bool,
    pub created_at: bson::DateTime,
    pub updated_at: bson::DateTime,
}

impl MongoEntity for Organization {
    type Document = OrganizationDocument;

    fn to_document(&self) -> OrganizationDocument {
        OrganizationDocument {
            id: self.id.clone(),
            name: self.name.clone(),
            slug: self.slug.clone(),
            is_active: self.is_active,
            created_at: to_bson_time(self.created_at),
            updated_at: to_bson_time(self.updated_at),
        }
    }

    fn from_document(doc: OrganizationDocument) -> Result<Self> {
        Ok(Organization {
            id: doc.id,
            name: doc.name,
            slug: doc.slug,
            is_active: doc.is_active,
            created_at: from_bson_time(doc.created_at),
            updated_at: from_bson_time(doc.updated_at),
        })
    }
}

/// Stored form of [`User`]; unlike the API view it keeps the password hash.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserDocument {
    #[serde(rename = "_id")]
    pub id: String,
    pub organization_id: Option<String>,
    pub email: String,
    pub full_name: String,
    pub phone: Option<String>,
    pub password_hash: String,
    pub role: UserRole,
    pub is_active: bool,
    pub last_login_at: Option<bson::DateTime>,
    pub created_at: bson::DateTime,
    pub updated_at: bson::DateTime,
}

impl MongoEntity for User {
    type Document = UserDocument;

    fn to_document(&self) -> UserDocument {
        UserDocument {
            id: self.id.clone(),
            organization_id: self.organization_id.clone(),
            email: self.email.clone(),
            full_name: self.full_name.clone(),
            phone: self.phone.as_ref().map(|p| p.as_str().to_string()),
            password_hash: self.password_hash.clone(),
            role: self.role,
            is_active: self.is_active,
            last_login_at: self.last_login_at.map(to_bson_time),
            created_at: to_bson_time(self.created_at),
            updated_at: to_bson_time(self.updated_at),
        }
    }

    fn from_document(doc: UserDocument) -> Result<Self> {
        let phone = doc.phone.map(PhoneNumber::new).transpose()?;

        Ok(User {
            id: doc.id,
            organization_id: doc.organization_id,
            email: doc.email,
            full_name: doc.full_name,
            phone,
            password_hash: doc.password_hash,
            role: doc.role,
            is_active: doc.is_active,
            last_login_at: doc.last_login_at.map(from_bson_time),
            created_at: from_bson_time(doc.created_at),
            updated_at: from_bson_time(doc.updated_at),
        })
    }
}

#[async_trait]
impl OrganizationRepository for MongoRepository<Organization> {
    async fn get_by_slug(&self, slug: &str) -> Result<Option<Organization>> {
        self.find_one(doc! { "slug": slug.trim().to_lowercase() }).await
    }
}

#[async_trait]
impl UserRepository for MongoRepository<User> {
    async fn get_by_email(&self, email: &str) -> Result<Option<User>> {
        tracing::debug!("Looking up user by email");
        self.find_one(doc! { "email": User::normalize_email(email) }).await
    }

    async fn get_by_organization_id(&self, organization_id: &str) -> Result<Vec<User>> {
        self.find_sorted_by_id(doc! { "organization_id": organization_id })
            .await
    }

    async fn get_by_role(&self, organization_id: &str, role: UserRole) -> Result<Vec<User>> {
        self.find_sorted_by_id(doc! {
            "organization_id": organization_id,
            "role": enum_value(&role)?,
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stored_users_keep_their_password_hash() {
        let mut user = User::new("a@example.com", "A".to_string(), "hash".to_string(), UserRole::Agent);
        user.phone = Some(PhoneNumber::new("+989123456789").unwrap());

        let document = user.to_document();
        assert_eq!(document.password_hash, "hash");
        assert_eq!(document.phone.as_deref(), Some("+989123456789"));

        let restored = User::from_document(document).unwrap();
        assert_eq!(restored.password_hash, "hash");
        assert_eq!(restored.role, UserRole::Agent);
        assert_eq!(restored.email, "a@example.com");
    }

    #[test]
    fn corrupt_phone_numbers_fail_to_load() {
        let user = User::new("a@example.com", "A".to_string(), String::new(), UserRole::Customer);
        let mut document = user.to_document();
        document.phone = Some("not-a-phone".to_string());
        assert!(User::from_document(document).is_err());
    }
}
