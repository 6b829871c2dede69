//! 用户领域模型

mod password;
mod user;

pub use password::*;
pub use user::*;
