use crate::db::models::{NewUser, Role, User};
use crate::error::BootstrapError;

/// Operations the bootstrapper needs from the persistence layer.
///
/// Every mutating call commits before returning, so an attempt that fails
/// halfway leaves only fully applied steps behind.
#[allow(async_fn_in_trait)]
pub trait IdentityStore {
    /// Create every declared table that does not exist yet.
    async fn create_all_schema(&self) -> Result<(), BootstrapError>;

    async fn find_role_by_name(&self, name: &str) -> Result<Option<Role>, BootstrapError>;

    async fn insert_role(&self, name: &str, description: &str) -> Result<Role, BootstrapError>;

    async fn find_user_by_username(&self, username: &str)
    -> Result<Option<User>, BootstrapError>;

    async fn delete_user(&self, id: i64) -> Result<(), BootstrapError>;

    async fn insert_user(&self, user: NewUser) -> Result<User, BootstrapError>;
}
