//! club-cqrs-core - 命令处理核心
//!
//! Command trait、Handler 与日志中间件

mod command;
mod middleware;

pub use command::*;
pub use middleware::*;
