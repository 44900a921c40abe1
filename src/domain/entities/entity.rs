use chrono::{DateTime, Utc};

/// Identity and audit metadata shared by every persisted record.
pub trait Entity: Clone + Send + Sync + 'static {
    /// Name of the backing table / collection.
    const COLLECTION: &'static str;

    fn id(&self) -> &str;
    fn created_at(&self) -> DateTime<Utc>;
    fn updated_at(&self) -> DateTime<Utc>;

    /// Refresh the modification timestamp.
    fn touch(&mut self);

    /// Write-time invariants. Checked by every repository before `add` and `update`.
    fn check_invariants(&self) -> crate::shared::Result<()> {
        Ok(())
    }

    /// Field that must be unique across the collection, with its value.
    fn unique_key(&self) -> Option<(&'static str, String)> {
        None
    }
}

/// Records owned by exactly one organization.
pub trait OrganizationScoped: Entity {
    fn organization_id(&self) -> &str;
}

/// Implements [`Entity`] for structs carrying `id`, `created_at` and `updated_at` fields.
macro_rules! impl_entity {
    ($ty:ty, $collection:literal $(, unique = $field:ident)?) => {
        impl $crate::domain::entities::Entity for $ty {
            const COLLECTION: &'static str = $collection;

            fn id(&self) -> &str {
                &self.id
            }

            fn created_at(&self) -> chrono::DateTime<chrono::Utc> {
                self.created_at
            }

            fn updated_at(&self) -> chrono::DateTime<chrono::Utc> {
                self.updated_at
            }

            fn touch(&mut self) {
                self.updated_at = $crate::shared::utils::now();
            }

            $(
                fn unique_key(&self) -> Option<(&'static str, String)> {
                    Some((stringify!($field), self.$field.clone()))
                }
            )?
        }
    };
    ($ty:ty, $collection:literal, scoped) => {
        $crate::domain::entities::entity::impl_entity!($ty, $collection);

        impl $crate::domain::entities::OrganizationScoped for $ty {
            fn organization_id(&self) -> &str {
                &self.organization_id
            }
        }
    };
}

pub(crate) use impl_entity;

/// Lowercase, trim, drop empties and duplicates while keeping first-seen order.
pub fn normalize_tags<I, S>(tags: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut normalized: Vec<String> = Vec::new();
    for tag in tags {
        let tag = tag.as_ref().trim().to_lowercase();
        if !tag.is_empty() && !normalized.contains(&tag) {
            normalized.push(tag);
        }
    }
    normalized
}
