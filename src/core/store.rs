use std::collections::{BTreeSet, HashMap};

use argon2::Argon2;
use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::core::errors::StoreError;
use crate::core::helpers::{hash_password, now, verify_password};
use crate::models::{Account, AccountPatch, EdgeChange, NewAccount};

/// Persistence for accounts. Implementations must make every operation
/// atomic with respect to the others.
#[async_trait]
pub trait AccountStore: Send + Sync {
    async fn create(&self, account: NewAccount) -> Result<Account, StoreError>;

    async fn get_all(&self) -> Result<Vec<Account>, StoreError>;

    async fn get_by_id(&self, id: Uuid) -> Result<Account, StoreError>;

    async fn update(&self, id: Uuid, patch: AccountPatch) -> Result<Account, StoreError>;

    /// Removes the account and strips its id from every other account's
    /// follower and following sets.
    async fn delete(&self, id: Uuid) -> Result<(), StoreError>;

    /// `Ok(None)` means the credentials did not match.
    async fn authenticate(&self, email: &str, password: &str) -> Result<Option<Account>, StoreError>;

    /// Adds or removes the `follower_id -> followed_id` edge on both records
    /// in one step. Returns whether anything changed.
    async fn set_edge(&self, follower_id: Uuid, followed_id: Uuid, change: EdgeChange) -> Result<bool, StoreError>;
}

#[derive(Default)]
struct Inner {
    accounts: HashMap<Uuid, Account>,
    users_list: Vec<Uuid>,
}

impl Inner {
    fn find_conflict(&self, username: Option<&str>, email: Option<&str>, skip: Option<Uuid>) -> Option<StoreError> {
        for account in self.accounts.values() {
            if Some(account.id) == skip {
                continue;
            }
            if username == Some(account.username.as_str()) {
                return Some(StoreError::Conflict("Username exists".to_string()));
            }
            if let Some(email) = email {
                if account.email.eq_ignore_ascii_case(email) {
                    return Some(StoreError::Conflict("Email exists".to_string()));
                }
            }
        }
        None
    }
}

/// In-process store backed by a single `RwLock`.
pub struct MemoryStore {
    inner: RwLock<Inner>,
    argon2: Argon2<'static>,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::with_hasher(Argon2::default())
    }

    pub fn with_hasher(argon2: Argon2<'static>) -> Self {
        MemoryStore {
            inner: RwLock::new(Inner::default()),
            argon2,
        }
    }
}

#[async_trait]
impl AccountStore for MemoryStore {
    async fn create(&self, account: NewAccount) -> Result<Account, StoreError> {
        let password = hash_password(&self.argon2, &account.password)?;
        let created_at = now();

        let mut inner = self.inner.write().await;
        if let Some(conflict) = inner.find_conflict(Some(account.username.as_str()), Some(account.email.as_str()), None) {
            return Err(conflict);
        }

        let record = Account {
            id: Uuid::new_v4(),
            username: account.username,
            email: account.email,
            password,
            display_name: account.display_name,
            bio: account.bio,
            avatar: account.avatar,
            birth_date: account.birth_date,
            followers: BTreeSet::new(),
            following: BTreeSet::new(),
            created_at,
            updated_at: created_at,
        };

        inner.users_list.push(record.id);
        inner.accounts.insert(record.id, record.clone());
        Ok(record)
    }

    async fn get_all(&self) -> Result<Vec<Account>, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner
            .users_list
            .iter()
            .filter_map(|id| inner.accounts.get(id).cloned())
            .collect())
    }

    async fn get_by_id(&self, id: Uuid) -> Result<Account, StoreError> {
        let inner = self.inner.read().await;
        inner.accounts.get(&id).cloned().ok_or(StoreError::NotFound(id))
    }

    async fn update(&self, id: Uuid, patch: AccountPatch) -> Result<Account, StoreError> {
        let password = match &patch.password {
            Some(p) => Some(hash_password(&self.argon2, p)?),
            None => None,
        };

        let mut inner = self.inner.write().await;
        if !inner.accounts.contains_key(&id) {
            return Err(StoreError::NotFound(id));
        }
        if let Some(conflict) = inner.find_conflict(patch.username.as_deref(), patch.email.as_deref(), Some(id)) {
            return Err(conflict);
        }

        let account = inner.accounts.get_mut(&id).ok_or(StoreError::NotFound(id))?;
        if let Some(username) = patch.username {
            account.username = username;
        }
        if let Some(email) = patch.email {
            account.email = email;
        }
        if let Some(password) = password {
            account.password = password;
        }
        if let Some(display_name) = patch.display_name {
            account.display_name = display_name;
        }
        if let Some(bio) = patch.bio {
            account.bio = bio;
        }
        if let Some(avatar) = patch.avatar {
            account.avatar = avatar;
        }
        if let Some(birth_date) = patch.birth_date {
            account.birth_date = Some(birth_date);
        }
        account.updated_at = now();

        Ok(account.clone())
    }

    async fn delete(&self, id: Uuid) -> Result<(), StoreError> {
        let mut inner = self.inner.write().await;
        if inner.accounts.remove(&id).is_none() {
            return Err(StoreError::NotFound(id));
        }
        inner.users_list.retain(|uid| *uid != id);

        let updated_at = now();
        for account in inner.accounts.values_mut() {
            let was_follower = account.followers.remove(&id);
            let was_following = account.following.remove(&id);
            if was_follower || was_following {
                account.updated_at = updated_at;
            }
        }

        Ok(())
    }

    async fn authenticate(&self, email: &str, password: &str) -> Result<Option<Account>, StoreError> {
        let candidate = {
            let inner = self.inner.read().await;
            inner
                .accounts
                .values()
                .find(|a| a.email.eq_ignore_ascii_case(email))
                .cloned()
        };

        Ok(candidate.filter(|a| verify_password(&self.argon2, password, &a.password)))
    }

    async fn set_edge(&self, follower_id: Uuid, followed_id: Uuid, change: EdgeChange) -> Result<bool, StoreError> {
        let mut inner = self.inner.write().await;
        for id in [follower_id, followed_id] {
            if !inner.accounts.contains_key(&id) {
                return Err(StoreError::NotFound(id));
            }
        }

        let changed = match inner.accounts.get_mut(&follower_id) {
            Some(follower) => match change {
                EdgeChange::Follow => follower.following.insert(followed_id),
                EdgeChange::Unfollow => follower.following.remove(&followed_id),
            },
            None => return Err(StoreError::NotFound(follower_id)),
        };
        if !changed {
            return Ok(false);
        }

        let updated_at = now();
        if let Some(followed) = inner.accounts.get_mut(&followed_id) {
            match change {
                EdgeChange::Follow => followed.followers.insert(follower_id),
                EdgeChange::Unfollow => followed.followers.remove(&follower_id),
            };
            followed.updated_at = updated_at;
        }
        if let Some(follower) = inner.accounts.get_mut(&follower_id) {
            follower.updated_at = updated_at;
        }

        Ok(true)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use argon2::{Algorithm, Params, Version};

    pub(crate) fn fast_store() -> MemoryStore {
        MemoryStore::with_hasher(Argon2::new(
            Algorithm::Argon2id,
            Version::V0x13,
            Params::new(Params::MIN_M_COST, 1, 1, None).unwrap(),
        ))
    }

    pub(crate) fn new_account(username: &str) -> NewAccount {
        NewAccount {
            username: username.to_string(),
            email: format!("{}@x.com", username),
            password: "p".to_string(),
            display_name: username.to_string(),
            bio: String::new(),
            avatar: String::new(),
            birth_date: None,
        }
    }

    #[tokio::test]
    async fn test_create_rejects_duplicates() {
        let store = fast_store();
        store.create(new_account("alice")).await.unwrap();

        let same_name = NewAccount { email: "other@x.com".into(), ..new_account("alice") };
        assert!(matches!(store.create(same_name).await, Err(StoreError::Conflict(_))));

        let same_email = NewAccount { email: "ALICE@x.com".into(), ..new_account("alicia") };
        assert!(matches!(store.create(same_email).await, Err(StoreError::Conflict(_))));

        assert_eq!(store.get_all().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_get_all_keeps_insertion_order() {
        let store = fast_store();
        for name in ["carol", "alice", "bob"] {
            store.create(new_account(name)).await.unwrap();
        }
        let names: Vec<String> = store.get_all().await.unwrap().into_iter().map(|a| a.username).collect();
        assert_eq!(names, vec!["carol", "alice", "bob"]);
    }

    #[tokio::test]
    async fn test_authenticate() {
        let store = fast_store();
        let alice = store.create(new_account("alice")).await.unwrap();

        let found = store.authenticate("a@x.com", "p").await.unwrap();
        assert!(found.is_none());
        let found = store.authenticate("alice@x.com", "p").await.unwrap();
        assert_eq!(found.map(|a| a.id), Some(alice.id));
        assert!(store.authenticate("alice@x.com", "wrong").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_update_and_missing() {
        let store = fast_store();
        let alice = store.create(new_account("alice")).await.unwrap();
        store.create(new_account("bob")).await.unwrap();

        let patch = AccountPatch { bio: Some("hi".into()), ..Default::default() };
        let updated = store.update(alice.id, patch).await.unwrap();
        assert_eq!(updated.bio, "hi");

        let clash = AccountPatch { username: Some("bob".into()), ..Default::default() };
        assert!(matches!(store.update(alice.id, clash).await, Err(StoreError::Conflict(_))));

        let missing = Uuid::new_v4();
        assert!(matches!(
            store.update(missing, AccountPatch::default()).await,
            Err(StoreError::NotFound(id)) if id == missing
        ));
        assert!(matches!(store.get_by_id(missing).await, Err(StoreError::NotFound(_))));
        assert!(matches!(store.delete(missing).await, Err(StoreError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_password_change_applies() {
        let store = fast_store();
        let alice = store.create(new_account("alice")).await.unwrap();
        let patch = AccountPatch { password: Some("new".into()), ..Default::default() };
        store.update(alice.id, patch).await.unwrap();

        assert!(store.authenticate("alice@x.com", "p").await.unwrap().is_none());
        assert!(store.authenticate("alice@x.com", "new").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_set_edge_updates_both_records() {
        let store = fast_store();
        let alice = store.create(new_account("alice")).await.unwrap();
        let bob = store.create(new_account("bob")).await.unwrap();

        assert!(store.set_edge(alice.id, bob.id, EdgeChange::Follow).await.unwrap());
        assert!(!store.set_edge(alice.id, bob.id, EdgeChange::Follow).await.unwrap());
        assert!(store.get_by_id(alice.id).await.unwrap().following.contains(&bob.id));
        assert!(store.get_by_id(bob.id).await.unwrap().followers.contains(&alice.id));

        assert!(store.set_edge(alice.id, bob.id, EdgeChange::Unfollow).await.unwrap());
        assert!(!store.set_edge(alice.id, bob.id, EdgeChange::Unfollow).await.unwrap());
        assert!(store.get_by_id(alice.id).await.unwrap().following.is_empty());
        assert!(store.get_by_id(bob.id).await.unwrap().followers.is_empty());
    }

    #[tokio::test]
    async fn test_set_edge_unknown_account_changes_nothing() {
        let store = fast_store();
        let alice = store.create(new_account("alice")).await.unwrap();
        let ghost = Uuid::new_v4();

        assert!(matches!(
            store.set_edge(alice.id, ghost, EdgeChange::Follow).await,
            Err(StoreError::NotFound(id)) if id == ghost
        ));
        assert!(matches!(
            store.set_edge(ghost, alice.id, EdgeChange::Follow).await,
            Err(StoreError::NotFound(id)) if id == ghost
        ));
        let alice = store.get_by_id(alice.id).await.unwrap();
        assert!(alice.following.is_empty());
        assert!(alice.followers.is_empty());
    }

    #[tokio::test]
    async fn test_delete_cleans_references() {
        let store = fast_store();
        let alice = store.create(new_account("alice")).await.unwrap();
        let bob = store.create(new_account("bob")).await.unwrap();

        store.set_edge(alice.id, bob.id, EdgeChange::Follow).await.unwrap();
        store.set_edge(bob.id, alice.id, EdgeChange::Follow).await.unwrap();

        store.delete(bob.id).await.unwrap();
        let alice = store.get_by_id(alice.id).await.unwrap();
        assert!(alice.followers.is_empty());
        assert!(alice.following.is_empty());
        assert_eq!(store.get_all().await.unwrap().len(), 1);
    }
}
