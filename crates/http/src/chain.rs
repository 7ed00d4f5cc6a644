//! Handler interface and cross-cutting wrappers.
//!
//! Where the underlying service framework would stack decorators, this
//! module composes explicit wrappers over [`ApiHandler`] at registration
//! time: `adapter → Protected → Transactional → handler`. A route without
//! required roles skips `Protected` entirely.

use std::collections::HashSet;
use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use restgate_auth::{SessionResolver, check_roles};
use restgate_core::{ApiError, ApiResult, Kwargs, RequestContext};
use restgate_db::TransactionManager;

/// An invocable endpoint.
///
/// The context is threaded mutably so the authorization gate can elevate
/// the anonymous identity before the inner handler runs.
#[async_trait]
pub trait ApiHandler: Send + Sync {
    async fn call(&self, ctx: &mut RequestContext, kwargs: Kwargs) -> ApiResult<Value>;
}

/// Adapter turning a plain async function into an [`ApiHandler`].
///
/// The function receives a clone of the context; handlers observe identity
/// but do not mutate it.
pub struct FnHandler<F>(F);

#[async_trait]
impl<F, Fut> ApiHandler for FnHandler<F>
where
    F: Fn(RequestContext, Kwargs) -> Fut + Send + Sync,
    Fut: Future<Output = ApiResult<Value>> + Send,
{
    async fn call(&self, ctx: &mut RequestContext, kwargs: Kwargs) -> ApiResult<Value> {
        (self.0)(ctx.clone(), kwargs).await
    }
}

/// Wrap an async `fn(RequestContext, Kwargs) -> ApiResult<Value>`.
pub fn handler_fn<F, Fut>(f: F) -> Arc<dyn ApiHandler>
where
    F: Fn(RequestContext, Kwargs) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = ApiResult<Value>> + Send + 'static,
{
    Arc::new(FnHandler(f))
}

/// Authorization gate.
///
/// Takes the session token from the reserved `_session_id` kwarg (removed
/// before the handler sees it) or from the request context, resolves it,
/// elevates the context, and checks the role intersection.
pub struct Protected {
    roles_required: HashSet<String>,
    resolver: Arc<dyn SessionResolver>,
    inner: Arc<dyn ApiHandler>,
}

impl Protected {
    pub fn new(
        roles_required: HashSet<String>,
        resolver: Arc<dyn SessionResolver>,
        inner: Arc<dyn ApiHandler>,
    ) -> Self {
        Self {
            roles_required,
            resolver,
            inner,
        }
    }
}

#[async_trait]
impl ApiHandler for Protected {
    async fn call(&self, ctx: &mut RequestContext, mut kwargs: Kwargs) -> ApiResult<Value> {
        let session_id = kwargs
            .take_session_id()
            .or_else(|| ctx.session_id().cloned());

        let Some(session_id) = session_id else {
            return Err(ApiError::access_denied("session not found"));
        };

        let identity = self.resolver.resolve(&session_id).await.map_err(|err| {
            tracing::warn!(error = %err, "session resolution failed");
            ApiError::access_denied(err.to_string())
        })?;

        ctx.elevate(session_id, identity.user_id, identity.groups);

        if let Err(denied) = check_roles(ctx.groups(), &self.roles_required) {
            tracing::warn!(
                user_id = %ctx.user_id(),
                roles_required = ?denied.roles_required,
                "role check failed"
            );
            return Err(ApiError::access_denied_with_data(
                "access denied",
                denied.into_data(),
            ));
        }

        self.inner.call(ctx, kwargs).await
    }
}

/// Transaction wrapper.
///
/// Begins a transaction before the inner call; commits on success, rolls
/// back and propagates the original error on failure. No retries.
pub struct Transactional {
    manager: Arc<dyn TransactionManager>,
    inner: Arc<dyn ApiHandler>,
}

impl Transactional {
    pub fn new(manager: Arc<dyn TransactionManager>, inner: Arc<dyn ApiHandler>) -> Self {
        Self { manager, inner }
    }
}

#[async_trait]
impl ApiHandler for Transactional {
    async fn call(&self, ctx: &mut RequestContext, kwargs: Kwargs) -> ApiResult<Value> {
        let tx = self
            .manager
            .begin()
            .await
            .map_err(|e| ApiError::from(anyhow::Error::new(e)))?;

        match self.inner.call(ctx, kwargs).await {
            Ok(value) => {
                tx.commit()
                    .await
                    .map_err(|e| ApiError::from(anyhow::Error::new(e)))?;
                Ok(value)
            }
            Err(err) => {
                if let Err(rollback_err) = tx.rollback().await {
                    // The handler error is the one worth surfacing.
                    tracing::error!(error = %rollback_err, "transaction rollback failed");
                }
                Err(err)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    use restgate_auth::{InMemorySessionResolver, SessionIdentity};
    use restgate_core::{SessionId, UserId};
    use restgate_db::InMemoryTransactionManager;

    fn roles(items: &[&str]) -> HashSet<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    fn ok_handler() -> Arc<dyn ApiHandler> {
        handler_fn(|ctx, _kwargs| async move { Ok(json!({"uid": ctx.user_id()})) })
    }

    fn failing_handler() -> Arc<dyn ApiHandler> {
        handler_fn(|_ctx, _kwargs| async move { Err(ApiError::domain("handler failed")) })
    }

    fn resolver_with(sid: &str, uid: i64, groups: &[&str]) -> Arc<InMemorySessionResolver> {
        let resolver = InMemorySessionResolver::new();
        resolver.insert(
            SessionId::from(sid),
            SessionIdentity::new(UserId::new(uid), groups.iter().copied()),
        );
        Arc::new(resolver)
    }

    #[tokio::test]
    async fn protected_without_session_is_denied() {
        let gate = Protected::new(
            roles(&["admin"]),
            resolver_with("s-1", 1, &["admin"]),
            ok_handler(),
        );

        let mut ctx = RequestContext::anonymous();
        let err = gate.call(&mut ctx, Kwargs::new()).await.unwrap_err();
        assert!(matches!(err, ApiError::AccessDenied { ref msg, .. } if msg == "session not found"));
    }

    #[tokio::test]
    async fn protected_elevates_context_on_matching_role() {
        let gate = Protected::new(
            roles(&["admin"]),
            resolver_with("s-1", 42, &["admin", "staff"]),
            ok_handler(),
        );

        let mut ctx = RequestContext::anonymous();
        ctx.set_session_id(SessionId::from("s-1"));

        let value = gate.call(&mut ctx, Kwargs::new()).await.unwrap();
        assert_eq!(value, json!({"uid": 42}));
        assert_eq!(ctx.user_id(), UserId::new(42));
        assert!(ctx.groups().contains("staff"));
    }

    #[tokio::test]
    async fn protected_denies_disjoint_groups_with_diagnostics() {
        let gate = Protected::new(
            roles(&["admin"]),
            resolver_with("s-1", 7, &["viewer"]),
            ok_handler(),
        );

        let mut ctx = RequestContext::anonymous();
        ctx.set_session_id(SessionId::from("s-1"));

        let err = gate.call(&mut ctx, Kwargs::new()).await.unwrap_err();
        let ApiError::AccessDenied { data: Some(data), .. } = err else {
            panic!("expected AccessDenied with data, got {err:?}");
        };
        assert_eq!(data["groups"], json!(["viewer"]));
        assert_eq!(data["roles_required"], json!(["admin"]));
    }

    #[tokio::test]
    async fn protected_prefers_the_session_kwarg_and_strips_it() {
        let inner = handler_fn(|_ctx, kwargs| async move {
            // The reserved kwarg must not leak into the handler.
            assert!(kwargs.get(restgate_core::SESSION_ID_KEY).is_none());
            Ok(json!("ok"))
        });
        let gate = Protected::new(roles(&["admin"]), resolver_with("s-2", 5, &["admin"]), inner);

        let mut ctx = RequestContext::anonymous();
        let mut kwargs = Kwargs::new();
        kwargs.insert(restgate_core::SESSION_ID_KEY, json!("s-2"));

        gate.call(&mut ctx, kwargs).await.unwrap();
        assert_eq!(ctx.user_id(), UserId::new(5));
    }

    #[tokio::test]
    async fn protected_maps_unknown_sessions_to_access_denied() {
        let gate = Protected::new(
            roles(&["admin"]),
            Arc::new(InMemorySessionResolver::new()),
            ok_handler(),
        );

        let mut ctx = RequestContext::anonymous();
        ctx.set_session_id(SessionId::from("expired"));

        let err = gate.call(&mut ctx, Kwargs::new()).await.unwrap_err();
        assert!(matches!(err, ApiError::AccessDenied { .. }));
    }

    #[tokio::test]
    async fn transactional_commits_on_success() {
        let manager = InMemoryTransactionManager::new();
        let wrapped = Transactional::new(Arc::new(manager.clone()), ok_handler());

        let mut ctx = RequestContext::anonymous();
        wrapped.call(&mut ctx, Kwargs::new()).await.unwrap();

        assert_eq!(manager.begun(), 1);
        assert_eq!(manager.committed(), 1);
        assert_eq!(manager.rolled_back(), 0);
    }

    #[tokio::test]
    async fn transactional_rolls_back_and_propagates_handler_error() {
        let manager = InMemoryTransactionManager::new();
        let wrapped = Transactional::new(Arc::new(manager.clone()), failing_handler());

        let mut ctx = RequestContext::anonymous();
        let err = wrapped.call(&mut ctx, Kwargs::new()).await.unwrap_err();

        assert!(matches!(err, ApiError::Domain { ref msg, .. } if msg == "handler failed"));
        assert_eq!(manager.rolled_back(), 1);
        assert_eq!(manager.committed(), 0);
    }

    #[tokio::test]
    async fn transactional_maps_begin_failure_to_internal() {
        let manager = InMemoryTransactionManager::new();
        manager.fail_next_begin();
        let wrapped = Transactional::new(Arc::new(manager.clone()), ok_handler());

        let mut ctx = RequestContext::anonymous();
        let err = wrapped.call(&mut ctx, Kwargs::new()).await.unwrap_err();
        assert!(matches!(err, ApiError::Internal(_)));
    }

    #[tokio::test]
    async fn transactional_maps_commit_failure_to_internal() {
        let manager = InMemoryTransactionManager::new();
        manager.fail_next_commit();
        let wrapped = Transactional::new(Arc::new(manager.clone()), ok_handler());

        let mut ctx = RequestContext::anonymous();
        let err = wrapped.call(&mut ctx, Kwargs::new()).await.unwrap_err();
        assert!(matches!(err, ApiError::Internal(_)));
    }
}
