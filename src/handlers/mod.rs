// src/handlers/mod.rs

pub mod incorrect;
pub mod quiz;
pub mod review;
pub mod session;

use crate::{error::AppError, quiz::QuizResult};

/// Runs a synchronous engine operation on the blocking pool.
/// The engine blocks on file I/O and must not run on the async workers.
pub(crate) async fn run_blocking<T, F>(op: F) -> Result<T, AppError>
where
    F: FnOnce() -> QuizResult<T> + Send + 'static,
    T: Send + 'static,
{
    Ok(tokio::task::spawn_blocking(op).await??)
}
