//! Middleware 定义

use std::time::Instant;

use async_trait::async_trait;
use club_errors::AppResult;
use tracing::{debug, error};

use crate::{Command, CommandHandler};

/// 日志中间件
///
/// 包装任意 handler，记录命令名称、耗时与失败原因。
pub struct Logged<H> {
    name: &'static str,
    inner: H,
}

impl<H> Logged<H> {
    pub fn new(name: &'static str, inner: H) -> Self {
        Self { name, inner }
    }

    pub fn inner(&self) -> &H {
        &self.inner
    }
}

#[async_trait]
impl<C, H> CommandHandler<C> for Logged<H>
where
    C: Command + 'static,
    H: CommandHandler<C>,
{
    async fn handle(&self, command: C) -> AppResult<C::Result> {
        debug!(command = self.name, "Executing command");
        let started = Instant::now();

        let result = self.inner.handle(command).await;
        let elapsed_ms = started.elapsed().as_millis() as u64;

        match &result {
            Ok(_) => debug!(command = self.name, elapsed_ms, "Command executed successfully"),
            Err(e) => error!(command = self.name, elapsed_ms, error = %e, "Command failed"),
        }

        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use club_errors::AppError;

    struct Echo(u32);

    impl Command for Echo {
        type Result = u32;
    }

    struct EchoHandler;

    #[async_trait]
    impl CommandHandler<Echo> for EchoHandler {
        async fn handle(&self, command: Echo) -> AppResult<u32> {
            if command.0 == 0 {
                return Err(AppError::validation("zero"));
            }
            Ok(command.0)
        }
    }

    #[tokio::test]
    async fn test_logged_passes_result_through() {
        let handler = Logged::new("echo", EchoHandler);

        assert_eq!(handler.handle(Echo(7)).await.unwrap(), 7);
        assert!(matches!(
            handler.handle(Echo(0)).await,
            Err(AppError::Validation(_))
        ));
    }
}
