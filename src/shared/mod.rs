pub mod app_state;
pub mod errors;

pub use app_state::AppState;
pub use errors::{HelpdeskError, Result};

/// Common types used across the application
pub mod types {
    use serde::{Deserialize, Serialize};

    /// Region assumed for numbers written without a country prefix.
    pub const DEFAULT_PHONE_REGION: phonenumber::country::Id = phonenumber::country::Id::IR;

    /// Phone number normalized to E.164
    #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
    #[serde(try_from = "String", into = "String")]
    pub struct PhoneNumber(String);

    impl PhoneNumber {
        pub fn new(phone: impl AsRef<str>) -> Result<Self, super::HelpdeskError> {
            let cleaned = phone.as_ref().trim().replace([' ', '-', '(', ')'], "");

            let parsed = phonenumber::parse(Some(DEFAULT_PHONE_REGION), &cleaned)
                .ok()
                .filter(phonenumber::is_valid)
                .ok_or_else(|| super::HelpdeskError::ValidationError {
                    field: "phone".to_string(),
                    message: "Invalid phone number format".to_string(),
                })?;

            Ok(PhoneNumber(
                parsed.format().mode(phonenumber::Mode::E164).to_string(),
            ))
        }

        pub fn as_str(&self) -> &str {
            &self.0
        }
    }

    impl TryFrom<String> for PhoneNumber {
        type Error = super::HelpdeskError;

        fn try_from(value: String) -> Result<Self, Self::Error> {
            PhoneNumber::new(value)
        }
    }

    impl From<PhoneNumber> for String {
        fn from(phone: PhoneNumber) -> Self {
            phone.0
        }
    }

    impl std::fmt::Display for PhoneNumber {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            f.write_str(&self.0)
        }
    }
}

/// Utilities for common operations
pub mod utils {
    use super::{HelpdeskError, Result};
    use chrono::{DateTime, Utc};
    use rand::{distributions::Alphanumeric, Rng};
    use std::future::Future;
    use std::time::Duration;
    use uuid::Uuid;

    /// Generate a unique ID
    pub fn generate_id() -> String {
        Uuid::new_v4().to_string()
    }

    /// Get current UTC timestamp
    pub fn now() -> DateTime<Utc> {
        Utc::now()
    }

    /// Random URL-safe secret for one-time tokens
    pub fn generate_secret_token(len: usize) -> String {
        rand::thread_rng()
            .sample_iter(&Alphanumeric)
            .take(len)
            .map(char::from)
            .collect()
    }

    /// Run `operation`, failing with [`HelpdeskError::Timeout`] once `limit` elapses.
    pub async fn with_timeout<T, F>(limit: Duration, operation: &str, future: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        match tokio::time::timeout(limit, future).await {
            Ok(result) => result,
            Err(_) => {
                tracing::warn!("{} exceeded {:?}", operation, limit);
                Err(HelpdeskError::Timeout {
                    operation: operation.to_string(),
                })
            }
        }
    }

    /// Hash a password using Argon2
    pub fn hash_password(password: &str) -> Result<String> {
        use argon2::{
            password_hash::{rand_core::OsRng, PasswordHasher, SaltString},
            Argon2,
        };

        let salt = SaltString::generate(&mut OsRng);
        let argon2 = Argon2::default();

        argon2
            .hash_password(password.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| HelpdeskError::Internal {
                message: format!("Password hashing failed: {}", e),
            })
    }

    /// Verify a password against its hash
    pub fn verify_password(password: &str, hash: &str) -> Result<bool> {
        use argon2::{
            password_hash::{PasswordHash, PasswordVerifier},
            Argon2,
        };

        let parsed_hash = PasswordHash::new(hash).map_err(|e| HelpdeskError::Internal {
            message: format!("Invalid password hash: {}", e),
        })?;

        Ok(Argon2::default()
            .verify_password(password.as_bytes(), &parsed_hash)
            .is_ok())
    }
}

#[cfg(test)]
mod tests {
    use super::types::PhoneNumber;
    use super::utils;
    use std::time::Duration;

    #[test]
    fn phone_numbers_are_normalized_to_e164() {
        let local = PhoneNumber::new("0912 345 6789").unwrap();
        let international = PhoneNumber::new("+98 912 345 6789").unwrap();

        assert_eq!(local.as_str(), "+989123456789");
        assert_eq!(local, international);
        assert!(PhoneNumber::new("12ab").is_err());
    }

    #[test]
    fn password_hash_roundtrip() {
        let hash = utils::hash_password("s3cret-pass").unwrap();
        assert!(utils::verify_password("s3cret-pass", &hash).unwrap());
        assert!(!utils::verify_password("wrong", &hash).unwrap());
    }

    #[tokio::test]
    async fn slow_operations_time_out() {
        let result: super::Result<()> = utils::with_timeout(
            Duration::from_millis(10),
            "slow",
            async {
                tokio::time::sleep(Duration::from_secs(5)).await;
                Ok(())
            },
        )
        .await;

        assert!(matches!(result, Err(super::HelpdeskError::Timeout { .. })));
    }
}
