//! Club Accounts Library
//!
//! 会员俱乐部账户核心：
//! - `domain`: 实体、仓储接口、领域服务（密码重置令牌、销售分配）
//! - `application`: 命令与处理器
//! - `infrastructure`: PostgreSQL / 内存持久化、业务指标
//! - `composition`: 按配置组装处理器

pub mod application;
pub mod composition;
pub mod domain;
pub mod infrastructure;
