//! Command handler trait.

use crate::dispatch::Invocation;
use crate::error::HandlerResult;
use async_trait::async_trait;
use std::future::Future;
use std::sync::Arc;

/// The body of a command.
///
/// Each matched invocation runs in its own task; the handler owns the
/// [`Invocation`] and is responsible for its own replies.
#[async_trait]
pub trait CommandHandler: Send + Sync {
    async fn call(&self, inv: Invocation) -> HandlerResult;
}

#[async_trait]
impl<F, Fut> CommandHandler for F
where
    F: Fn(Invocation) -> Fut + Send + Sync,
    Fut: Future<Output = HandlerResult> + Send + 'static,
{
    async fn call(&self, inv: Invocation) -> HandlerResult {
        (self)(inv).await
    }
}

/// Adapt a method-like function over shared plugin state into a handler.
///
/// ```ignore
/// reg.command("stats", bind(&self, |me, inv| async move { me.stats(inv).await }))
///     .finish()?;
/// ```
pub fn bind<T, F, Fut>(target: &Arc<T>, f: F) -> impl CommandHandler + 'static
where
    T: Send + Sync + ?Sized + 'static,
    F: Fn(Arc<T>, Invocation) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = HandlerResult> + Send + 'static,
{
    let target = Arc::clone(target);
    move |inv: Invocation| f(Arc::clone(&target), inv)
}
