//! 内存持久化实现
//!
//! 与 PostgreSQL 实现语义一致：条件更新在同一把锁内完成检查与写入，
//! Unit of Work 在提交前独占整个存储，对应数据库侧的咨询锁。

use std::collections::HashMap;
use std::sync::{Arc, Mutex as StdMutex, PoisonError};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use club_common::{ClientId, SellerId, UserId};
use club_errors::{AppError, AppResult};
use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::domain::assignment::{Candidate, UnassignedClient};
use crate::domain::auth::{PasswordResetToken, PasswordResetTokenId};
use crate::domain::repositories::assignment::{ClientRepository, SellerRepository};
use crate::domain::repositories::auth::PasswordResetRepository;
use crate::domain::repositories::user::UserRepository;
use crate::domain::unit_of_work::{UnitOfWork, UnitOfWorkFactory};
use crate::domain::user::User;

/// 销售记录
#[derive(Debug, Clone)]
pub struct SellerRecord {
    pub id: SellerId,
    pub display_name: String,
    pub active: bool,
}

/// 客户记录
#[derive(Debug, Clone)]
pub struct ClientRecord {
    pub id: ClientId,
    pub display_name: String,
    pub seller_id: Option<SellerId>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default)]
struct MemoryState {
    users: HashMap<UserId, User>,
    tokens: Vec<PasswordResetToken>,
    sellers: Vec<SellerRecord>,
    clients: Vec<ClientRecord>,
}

impl MemoryState {
    fn outstanding_for(&self, user_id: &UserId, now: DateTime<Utc>) -> u64 {
        self.tokens
            .iter()
            .filter(|t| t.user_id == *user_id && !t.is_consumed() && !t.is_expired_at(now))
            .count() as u64
    }

    fn eligible_candidates(&self) -> Vec<Candidate> {
        let mut sellers: Vec<&SellerRecord> = self.sellers.iter().filter(|s| s.active).collect();
        sellers.sort_by_key(|s| s.id.0);

        sellers
            .into_iter()
            .map(|s| {
                let load = self
                    .clients
                    .iter()
                    .filter(|c| c.seller_id == Some(s.id))
                    .count() as u64;
                Candidate::new(s.id, load)
            })
            .collect()
    }

    fn unassigned(&self, limit: u32) -> Vec<UnassignedClient> {
        let mut clients: Vec<&ClientRecord> =
            self.clients.iter().filter(|c| c.seller_id.is_none()).collect();
        clients.sort_by_key(|c| (c.created_at, c.id.0));

        clients
            .into_iter()
            .take(limit as usize)
            .map(|c| UnassignedClient {
                id: c.id,
                display_name: c.display_name.clone(),
            })
            .collect()
    }

    fn assign_if_unassigned(&mut self, client_id: &ClientId, seller_id: &SellerId) -> bool {
        match self
            .clients
            .iter_mut()
            .find(|c| c.id == *client_id && c.seller_id.is_none())
        {
            Some(client) => {
                client.seller_id = Some(*seller_id);
                true
            }
            None => false,
        }
    }
}

/// 内存存储
///
/// 克隆共享同一份数据。
#[derive(Debug, Clone, Default)]
pub struct InMemoryStore {
    state: Arc<Mutex<MemoryState>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert_user(&self, user: User) {
        self.state.lock().await.users.insert(user.id, user);
    }

    pub async fn user(&self, id: &UserId) -> Option<User> {
        self.state.lock().await.users.get(id).cloned()
    }

    pub async fn insert_seller(&self, display_name: &str, active: bool) -> SellerId {
        let id = SellerId::new();
        self.state.lock().await.sellers.push(SellerRecord {
            id,
            display_name: display_name.to_string(),
            active,
        });
        id
    }

    pub async fn insert_client(
        &self,
        display_name: &str,
        seller_id: Option<SellerId>,
        created_at: DateTime<Utc>,
    ) -> ClientId {
        let id = ClientId::new();
        self.state.lock().await.clients.push(ClientRecord {
            id,
            display_name: display_name.to_string(),
            seller_id,
            created_at,
        });
        id
    }

    pub async fn client(&self, id: &ClientId) -> Option<ClientRecord> {
        self.state
            .lock()
            .await
            .clients
            .iter()
            .find(|c| c.id == *id)
            .cloned()
    }

    /// 某个销售名下的客户数
    pub async fn seller_load(&self, seller_id: &SellerId) -> u64 {
        self.state
            .lock()
            .await
            .clients
            .iter()
            .filter(|c| c.seller_id == Some(*seller_id))
            .count() as u64
    }

    /// 某个用户的全部令牌（含已使用）
    pub async fn tokens_for(&self, user_id: &UserId) -> Vec<PasswordResetToken> {
        self.state
            .lock()
            .await
            .tokens
            .iter()
            .filter(|t| t.user_id == *user_id)
            .cloned()
            .collect()
    }
}

#[async_trait]
impl PasswordResetRepository for InMemoryStore {
    async fn create(&self, token: &PasswordResetToken) -> AppResult<()> {
        let mut state = self.state.lock().await;
        if state.tokens.iter().any(|t| t.id == token.id) {
            return Err(AppError::conflict("Password reset token already exists"));
        }
        state.tokens.push(token.clone());
        Ok(())
    }

    async fn create_within_limit(
        &self,
        token: &PasswordResetToken,
        max_outstanding: u64,
    ) -> AppResult<bool> {
        let mut state = self.state.lock().await;
        if state.outstanding_for(&token.user_id, token.created_at) >= max_outstanding {
            return Ok(false);
        }
        if state.tokens.iter().any(|t| t.id == token.id) {
            return Err(AppError::conflict("Password reset token already exists"));
        }
        state.tokens.push(token.clone());
        Ok(true)
    }

    async fn find_by_token_hash(&self, token_hash: &str) -> AppResult<Option<PasswordResetToken>> {
        let state = self.state.lock().await;
        Ok(state
            .tokens
            .iter()
            .filter(|t| t.token_hash == token_hash)
            .max_by_key(|t| (!t.is_consumed(), t.created_at))
            .cloned())
    }

    async fn mark_consumed_if_unconsumed(
        &self,
        id: &PasswordResetTokenId,
        at: DateTime<Utc>,
    ) -> AppResult<bool> {
        let mut state = self.state.lock().await;
        Ok(state
            .tokens
            .iter_mut()
            .find(|t| t.id == *id)
            .is_some_and(|t| t.mark_consumed(at)))
    }

    async fn count_outstanding_by_user_id(
        &self,
        user_id: &UserId,
        now: DateTime<Utc>,
    ) -> AppResult<u64> {
        Ok(self.state.lock().await.outstanding_for(user_id, now))
    }

    async fn consume_all_outstanding_by_user_id(
        &self,
        user_id: &UserId,
        at: DateTime<Utc>,
    ) -> AppResult<u64> {
        let mut state = self.state.lock().await;
        let mut revoked = 0;
        for token in state.tokens.iter_mut().filter(|t| t.user_id == *user_id) {
            if token.mark_consumed(at) {
                revoked += 1;
            }
        }
        Ok(revoked)
    }
}

#[async_trait]
impl UserRepository for InMemoryStore {
    async fn find_by_id(&self, id: &UserId) -> AppResult<Option<User>> {
        Ok(self.state.lock().await.users.get(id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> AppResult<Option<User>> {
        let state = self.state.lock().await;
        Ok(state.users.values().find(|u| u.email == email).cloned())
    }

    async fn save(&self, user: &User) -> AppResult<()> {
        let mut state = self.state.lock().await;
        if state
            .users
            .values()
            .any(|u| u.email == user.email && u.id != user.id)
        {
            return Err(AppError::conflict("Email already registered"));
        }
        state.users.insert(user.id, user.clone());
        Ok(())
    }

    async fn update_password(&self, user: &User) -> AppResult<()> {
        let mut state = self.state.lock().await;
        let stored = state
            .users
            .get_mut(&user.id)
            .ok_or_else(|| AppError::not_found("User not found"))?;

        stored.password_hash = user.password_hash.clone();
        stored.last_password_change_at = user.last_password_change_at;
        stored.updated_at = user.updated_at;
        Ok(())
    }
}

#[async_trait]
impl ClientRepository for InMemoryStore {
    async fn find_unassigned(&self, limit: u32) -> AppResult<Vec<UnassignedClient>> {
        Ok(self.state.lock().await.unassigned(limit))
    }

    async fn assign_seller_if_unassigned(
        &self,
        client_id: &ClientId,
        seller_id: &SellerId,
    ) -> AppResult<bool> {
        Ok(self
            .state
            .lock()
            .await
            .assign_if_unassigned(client_id, seller_id))
    }
}

#[async_trait]
impl UnitOfWorkFactory for InMemoryStore {
    async fn begin(&self) -> AppResult<Box<dyn UnitOfWork>> {
        let guard = self.state.clone().lock_owned().await;
        let working = guard.clone();

        Ok(Box::new(InMemoryUnitOfWork {
            guard,
            working: StdMutex::new(working),
        }))
    }
}

/// 内存 Unit of Work
///
/// 在工作副本上修改，提交时整体写回；丢弃即回滚。
pub struct InMemoryUnitOfWork {
    guard: OwnedMutexGuard<MemoryState>,
    working: StdMutex<MemoryState>,
}

impl InMemoryUnitOfWork {
    fn with_state<T>(&self, f: impl FnOnce(&mut MemoryState) -> T) -> T {
        let mut state = self.working.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut state)
    }
}

#[async_trait]
impl SellerRepository for InMemoryUnitOfWork {
    async fn find_eligible_candidates(&self) -> AppResult<Vec<Candidate>> {
        Ok(self.with_state(|state| state.eligible_candidates()))
    }
}

#[async_trait]
impl ClientRepository for InMemoryUnitOfWork {
    async fn find_unassigned(&self, limit: u32) -> AppResult<Vec<UnassignedClient>> {
        Ok(self.with_state(|state| state.unassigned(limit)))
    }

    async fn assign_seller_if_unassigned(
        &self,
        client_id: &ClientId,
        seller_id: &SellerId,
    ) -> AppResult<bool> {
        Ok(self.with_state(|state| state.assign_if_unassigned(client_id, seller_id)))
    }
}

#[async_trait]
impl UnitOfWork for InMemoryUnitOfWork {
    fn sellers(&self) -> &dyn SellerRepository {
        self
    }

    fn clients(&self) -> &dyn ClientRepository {
        self
    }

    async fn commit(self: Box<Self>) -> AppResult<()> {
        let Self { mut guard, working } = *self;
        *guard = working.into_inner().unwrap_or_else(PoisonError::into_inner);
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> AppResult<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_rollback_discards_changes() {
        let store = InMemoryStore::new();
        let seller = store.insert_seller("Ana", true).await;
        let client = store.insert_client("Acme Travel", None, Utc::now()).await;

        let uow = store.begin().await.unwrap();
        assert!(uow.clients().assign_seller_if_unassigned(&client, &seller).await.unwrap());
        uow.rollback().await.unwrap();

        assert_eq!(store.client(&client).await.unwrap().seller_id, None);
    }

    #[tokio::test]
    async fn test_commit_applies_changes() {
        let store = InMemoryStore::new();
        let seller = store.insert_seller("Ana", true).await;
        let client = store.insert_client("Acme Travel", None, Utc::now()).await;

        let uow = store.begin().await.unwrap();
        assert!(uow.clients().assign_seller_if_unassigned(&client, &seller).await.unwrap());
        uow.commit().await.unwrap();

        assert_eq!(store.client(&client).await.unwrap().seller_id, Some(seller));
        assert_eq!(store.seller_load(&seller).await, 1);
    }

    #[tokio::test]
    async fn test_candidates_exclude_inactive_and_count_load() {
        let store = InMemoryStore::new();
        let active = store.insert_seller("Ana", true).await;
        store.insert_seller("Bruno", false).await;
        store.insert_client("Acme Travel", Some(active), Utc::now()).await;

        let uow = store.begin().await.unwrap();
        let candidates = uow.sellers().find_eligible_candidates().await.unwrap();

        assert_eq!(candidates, vec![Candidate::new(active, 1)]);
    }

    #[tokio::test]
    async fn test_conditional_assign_only_once() {
        let store = InMemoryStore::new();
        let a = store.insert_seller("Ana", true).await;
        let b = store.insert_seller("Bruno", true).await;
        let client = store.insert_client("Acme Travel", None, Utc::now()).await;

        assert!(store.assign_seller_if_unassigned(&client, &a).await.unwrap());
        assert!(!store.assign_seller_if_unassigned(&client, &b).await.unwrap());
        assert_eq!(store.client(&client).await.unwrap().seller_id, Some(a));
    }
}
