//! club-bootstrap - 统一启动骨架
//!
//! 配置 → 遥测 → 连接池

mod infrastructure;
mod runtime;

pub use infrastructure::*;
pub use runtime::*;
