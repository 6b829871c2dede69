//! 用户仓储接口

use async_trait::async_trait;
use club_common::UserId;
use club_errors::AppResult;

use crate::domain::user::User;

/// 用户仓储接口
#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn find_by_id(&self, id: &UserId) -> AppResult<Option<User>>;

    /// 按规范化后的邮箱查找
    async fn find_by_email(&self, email: &str) -> AppResult<Option<User>>;

    async fn save(&self, user: &User) -> AppResult<()>;

    /// 更新密码哈希与修改时间
    async fn update_password(&self, user: &User) -> AppResult<()>;
}
