//! URL registration: CRUD conventions and free-form mappings.
//!
//! `RestPublisher` maps a resource to the conventional collection/item
//! URLs; `HttpPublisher` maps a single handler to an arbitrary URL. Both
//! compose the same chain per route (gate → transaction → handler behind
//! the request adapter) and answer OPTIONS on every registered path.

use std::borrow::Cow;
use std::collections::{HashMap, HashSet};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use axum::{
    Router,
    extract::{Path, Request},
    http::Method,
    response::Response,
    routing::MethodRouter,
};
use tower::ServiceBuilder;

use restgate_auth::SessionResolver;
use restgate_db::TransactionManager;

use crate::adapter::{self, preflight, serve};
use crate::chain::{ApiHandler, Protected, Transactional};
use crate::cors::cors_middleware;

/// A handler plus its registration-time metadata.
///
/// Required roles live here, attached explicitly when the route is mapped;
/// a spec without roles is published without any authorization check.
pub struct HandlerSpec {
    handler: Arc<dyn ApiHandler>,
    roles_required: Option<HashSet<String>>,
}

impl HandlerSpec {
    pub fn new(handler: Arc<dyn ApiHandler>) -> Self {
        Self {
            handler,
            roles_required: None,
        }
    }

    pub fn with_roles(mut self, roles: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.roles_required = Some(roles.into_iter().map(Into::into).collect());
        self
    }
}

/// The five conventional CRUD slots. Every slot is optional; absent slots
/// are simply not registered.
#[derive(Default)]
pub struct ResourceHandlers {
    pub list: Option<HandlerSpec>,
    pub create: Option<HandlerSpec>,
    pub get: Option<HandlerSpec>,
    pub update: Option<HandlerSpec>,
    pub delete: Option<HandlerSpec>,
}

impl ResourceHandlers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn list(mut self, spec: HandlerSpec) -> Self {
        self.list = Some(spec);
        self
    }

    pub fn create(mut self, spec: HandlerSpec) -> Self {
        self.create = Some(spec);
        self
    }

    pub fn get(mut self, spec: HandlerSpec) -> Self {
        self.get = Some(spec);
        self
    }

    pub fn update(mut self, spec: HandlerSpec) -> Self {
        self.update = Some(spec);
        self
    }

    pub fn delete(mut self, spec: HandlerSpec) -> Self {
        self.delete = Some(spec);
        self
    }
}

/// Name of the path identifier for item routes (the kwargs key the value
/// lands under). Captures are plain strings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceId {
    name: Cow<'static, str>,
}

impl ResourceId {
    pub fn new(name: impl Into<Cow<'static, str>>) -> Self {
        Self { name: name.into() }
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl Default for ResourceId {
    fn default() -> Self {
        Self::new("id")
    }
}

/// Expose a set of handlers as a RESTful resource.
///
/// Conventions: collection URL answers GET (list) and POST (create); item
/// URL answers GET (get), POST (update) and DELETE (delete). Partial edit
/// via HTTP PATCH is not implemented.
pub struct RestPublisher {
    prefix: String,
    resolver: Arc<dyn SessionResolver>,
    transactions: Arc<dyn TransactionManager>,
    router: Router,
}

impl RestPublisher {
    /// Publisher with the conventional `/api/` prefix.
    pub fn new(resolver: Arc<dyn SessionResolver>, transactions: Arc<dyn TransactionManager>) -> Self {
        Self::with_prefix("/api/", resolver, transactions)
    }

    pub fn with_prefix(
        prefix: impl Into<String>,
        resolver: Arc<dyn SessionResolver>,
        transactions: Arc<dyn TransactionManager>,
    ) -> Self {
        Self {
            prefix: prefix.into(),
            resolver,
            transactions,
            router: Router::new(),
        }
    }

    /// Map a resource's handlers to its conventional URLs.
    pub fn map_resource(mut self, url: &str, handlers: ResourceHandlers, id: ResourceId) -> Self {
        let (collection_url, item_url) = resource_urls(&self.prefix, url, id.name());
        let id_name: Arc<str> = Arc::from(id.name());

        let mut collection = MethodRouter::new();
        let mut has_collection = false;
        if let Some(spec) = handlers.list {
            log_registration(&collection_url, &Method::GET);
            collection = collection.get(collection_route(self.compose(spec)));
            has_collection = true;
        }
        if let Some(spec) = handlers.create {
            log_registration(&collection_url, &Method::POST);
            collection = collection.post(collection_route(self.compose(spec)));
            has_collection = true;
        }

        let mut item = MethodRouter::new();
        let mut has_item = false;
        if let Some(spec) = handlers.get {
            log_registration(&item_url, &Method::GET);
            item = item.get(item_route(self.compose(spec), id_name.clone()));
            has_item = true;
        }
        if let Some(spec) = handlers.update {
            log_registration(&item_url, &Method::POST);
            item = item.post(item_route(self.compose(spec), id_name.clone()));
            has_item = true;
        }
        if let Some(spec) = handlers.delete {
            log_registration(&item_url, &Method::DELETE);
            item = item.delete(item_route(self.compose(spec), id_name.clone()));
            has_item = true;
        }

        if has_collection {
            self.router = self.router.route(&collection_url, collection.options(preflight));
        }
        if has_item {
            self.router = self.router.route(&item_url, item.options(preflight));
        }

        self
    }

    /// Finish registration; applies the CORS layer to every route.
    pub fn into_router(self) -> Router {
        self.router
            .layer(ServiceBuilder::new().layer(axum::middleware::from_fn(cors_middleware)))
    }

    fn compose(&self, spec: HandlerSpec) -> Arc<dyn ApiHandler> {
        compose(&self.resolver, &self.transactions, spec)
    }
}

/// Expose individual handlers over HTTP at arbitrary URLs.
pub struct HttpPublisher {
    resolver: Arc<dyn SessionResolver>,
    transactions: Arc<dyn TransactionManager>,
    router: Router,
}

impl HttpPublisher {
    pub fn new(resolver: Arc<dyn SessionResolver>, transactions: Arc<dyn TransactionManager>) -> Self {
        Self {
            resolver,
            transactions,
            router: Router::new(),
        }
    }

    /// Register one handler at `url` for the given methods (plus OPTIONS).
    pub fn add_mapping(mut self, url: &str, spec: HandlerSpec, methods: &[Method]) -> Self {
        let handler = compose(&self.resolver, &self.transactions, spec);

        let mut mapped = MethodRouter::new();
        for method in methods {
            log_registration(url, method);
            mapped = match *method {
                Method::GET => mapped.get(collection_route(handler.clone())),
                Method::POST => mapped.post(collection_route(handler.clone())),
                Method::PUT => mapped.put(collection_route(handler.clone())),
                Method::PATCH => mapped.patch(collection_route(handler.clone())),
                Method::DELETE => mapped.delete(collection_route(handler.clone())),
                ref other => {
                    tracing::warn!(url = %url, method = %other, "unsupported method, skipping");
                    mapped
                }
            };
        }

        self.router = self.router.route(url, mapped.options(preflight));
        self
    }

    pub fn into_router(self) -> Router {
        self.router
            .layer(ServiceBuilder::new().layer(axum::middleware::from_fn(cors_middleware)))
    }
}

/// Collection and item URLs for a resource, e.g. `/api/` + `todos/` →
/// `/api/todos/` and `/api/todos/:id`.
fn resource_urls(prefix: &str, url: &str, id_name: &str) -> (String, String) {
    let collection = format!("{prefix}{url}");
    let item = format!("{collection}:{id_name}");
    (collection, item)
}

fn log_registration(url: &str, method: &Method) {
    tracing::debug!(url = %url, method = %method, "registering handler");
}

fn compose(
    resolver: &Arc<dyn SessionResolver>,
    transactions: &Arc<dyn TransactionManager>,
    spec: HandlerSpec,
) -> Arc<dyn ApiHandler> {
    let transactional: Arc<dyn ApiHandler> =
        Arc::new(Transactional::new(transactions.clone(), spec.handler));

    // No declared roles: the gate is skipped outright, not stubbed in.
    match spec.roles_required {
        Some(roles) => Arc::new(Protected::new(roles, resolver.clone(), transactional)),
        None => transactional,
    }
}

type RouteFuture = Pin<Box<dyn Future<Output = Response> + Send>>;

fn collection_route(
    handler: Arc<dyn ApiHandler>,
) -> impl Fn(Request) -> RouteFuture + Clone + Send + 'static {
    move |req| {
        let handler = handler.clone();
        Box::pin(async move { serve(handler, None, req).await })
    }
}

fn item_route(
    handler: Arc<dyn ApiHandler>,
    id_name: Arc<str>,
) -> impl Fn(Path<HashMap<String, String>>, Request) -> RouteFuture + Clone + Send + 'static {
    move |Path(params), req| {
        let handler = handler.clone();
        let id_name = id_name.clone();
        Box::pin(async move {
            let value = adapter::path_id(&params, &id_name);
            serve(handler, Some((id_name, value)), req).await
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resource_urls_follow_the_conventions() {
        let (collection, item) = resource_urls("/api/", "todos/", "id");
        assert_eq!(collection, "/api/todos/");
        assert_eq!(item, "/api/todos/:id");
    }

    #[test]
    fn resource_id_defaults_to_id() {
        assert_eq!(ResourceId::default().name(), "id");
    }

    #[test]
    fn resource_id_accepts_custom_names() {
        let (_, item) = resource_urls("/api/", "orders/", ResourceId::new("order_id").name());
        assert_eq!(item, "/api/orders/:order_id");
    }
}
