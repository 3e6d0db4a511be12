//! In-memory identity store.

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;

use crate::domain::ports::{UserPersistenceError, UserRepository};
use crate::domain::{User, UserId, Username};

use super::poisoned;

#[derive(Debug, Default)]
struct UserTable {
    by_id: HashMap<UserId, User>,
    id_by_username: HashMap<Username, UserId>,
}

/// Identity store backed by a process-local map.
#[derive(Debug, Default)]
pub struct InMemoryUserRepository {
    table: RwLock<UserTable>,
}

impl InMemoryUserRepository {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock_error() -> UserPersistenceError {
        UserPersistenceError::query(poisoned("user table"))
    }
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn insert(&self, user: &User) -> Result<(), UserPersistenceError> {
        let mut table = self.table.write().map_err(|_| Self::lock_error())?;
        if table.id_by_username.contains_key(user.username()) {
            return Err(UserPersistenceError::duplicate_username(
                user.username().as_ref(),
            ));
        }
        table
            .id_by_username
            .insert(user.username().clone(), user.id().clone());
        table.by_id.insert(user.id().clone(), user.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, UserPersistenceError> {
        let table = self.table.read().map_err(|_| Self::lock_error())?;
        Ok(table.by_id.get(id).cloned())
    }

    async fn find_by_username(
        &self,
        username: &Username,
    ) -> Result<Option<User>, UserPersistenceError> {
        let table = self.table.read().map_err(|_| Self::lock_error())?;
        Ok(table
            .id_by_username
            .get(username)
            .and_then(|id| table.by_id.get(id))
            .cloned())
    }

    async fn update(&self, user: &User) -> Result<(), UserPersistenceError> {
        let mut table = self.table.write().map_err(|_| Self::lock_error())?;
        let Some(stored) = table.by_id.get_mut(user.id()) else {
            return Err(UserPersistenceError::missing(user.id().as_ref()));
        };
        // Usernames are immutable, so the index needs no maintenance.
        *stored = user.clone();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{DisplayName, HouseholdToken, PasswordHash};
    use rstest::{fixture, rstest};

    #[fixture]
    fn user() -> User {
        User::new(
            UserId::random(),
            Username::new("ada").expect("username"),
            DisplayName::new("Ada Lovelace").expect("display name"),
            PasswordHash::new("salt$digest"),
        )
    }

    #[rstest]
    #[tokio::test]
    async fn stored_users_are_found_by_id_and_username(user: User) {
        let repo = InMemoryUserRepository::new();
        repo.insert(&user).await.expect("insert");

        assert_eq!(repo.find_by_id(user.id()).await.expect("read"), Some(user.clone()));
        assert_eq!(
            repo.find_by_username(user.username()).await.expect("read"),
            Some(user)
        );
    }

    #[rstest]
    #[tokio::test]
    async fn usernames_are_unique(user: User) {
        let repo = InMemoryUserRepository::new();
        repo.insert(&user).await.expect("insert");
        let twin = User::new(
            UserId::random(),
            user.username().clone(),
            user.display_name().clone(),
            PasswordHash::new("other"),
        );

        let error = repo.insert(&twin).await.expect_err("duplicate");
        assert_eq!(error, UserPersistenceError::duplicate_username("ada"));
    }

    #[rstest]
    #[tokio::test]
    async fn update_replaces_household_pointer(user: User) {
        let repo = InMemoryUserRepository::new();
        repo.insert(&user).await.expect("insert");
        let token = HouseholdToken::generate();
        let joined = user.clone().with_household_token(Some(token.clone()));

        repo.update(&joined).await.expect("update");

        let stored = repo.find_by_id(user.id()).await.expect("read").expect("present");
        assert_eq!(stored.household_token(), Some(&token));
    }

    #[rstest]
    #[tokio::test]
    async fn update_rejects_unknown_user(user: User) {
        let repo = InMemoryUserRepository::new();
        let error = repo.update(&user).await.expect_err("missing");
        assert!(matches!(error, UserPersistenceError::Missing { .. }));
    }
}
