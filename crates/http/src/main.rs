//! Demo server: publishes an in-memory `todos` resource with the full
//! chain wired (session auth, transactions, CORS).

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use serde_json::{Value, json};

use restgate_auth::{InMemorySessionResolver, SessionIdentity, SessionResolver};
use restgate_core::{ApiError, Kwargs, RequestContext, SessionId, UserId};
use restgate_db::{InMemoryTransactionManager, PostgresTransactionManager, TransactionManager};
use restgate_http::{HandlerSpec, ResourceHandlers, ResourceId, RestPublisher, handler_fn};

type TodoStore = Arc<RwLock<HashMap<String, Value>>>;

fn lock_error() -> ApiError {
    ApiError::from(anyhow::anyhow!("todo store lock poisoned"))
}

async fn list_todos(store: TodoStore, _ctx: RequestContext, _kwargs: Kwargs) -> Result<Value, ApiError> {
    let todos = store.read().map_err(|_| lock_error())?;
    let mut items: Vec<Value> = todos.values().cloned().collect();
    items.sort_by(|a, b| a["id"].as_str().cmp(&b["id"].as_str()));
    Ok(json!(items))
}

async fn create_todo(store: TodoStore, _ctx: RequestContext, kwargs: Kwargs) -> Result<Value, ApiError> {
    let Some(title) = kwargs.get_str("title") else {
        return Err(ApiError::domain("title is required"));
    };

    let todo = json!({
        "id": uuid::Uuid::new_v4().to_string(),
        "title": title,
        "done": false,
        "created_at": chrono::Utc::now(),
    });

    let mut todos = store.write().map_err(|_| lock_error())?;
    todos.insert(todo["id"].as_str().unwrap_or_default().to_string(), todo.clone());
    Ok(todo)
}

async fn get_todo(store: TodoStore, _ctx: RequestContext, kwargs: Kwargs) -> Result<Value, ApiError> {
    let id = kwargs.get_str("id").unwrap_or_default();
    let todos = store.read().map_err(|_| lock_error())?;
    todos
        .get(id)
        .cloned()
        .ok_or_else(|| ApiError::domain("todo not found"))
}

async fn update_todo(store: TodoStore, _ctx: RequestContext, kwargs: Kwargs) -> Result<Value, ApiError> {
    let id = kwargs.get_str("id").unwrap_or_default().to_string();
    let mut todos = store.write().map_err(|_| lock_error())?;
    let todo = todos
        .get_mut(&id)
        .ok_or_else(|| ApiError::domain("todo not found"))?;

    if let Some(title) = kwargs.get("title") {
        todo["title"] = title.clone();
    }
    if let Some(done) = kwargs.get("done") {
        todo["done"] = done.clone();
    }

    Ok(todo.clone())
}

async fn delete_todo(store: TodoStore, _ctx: RequestContext, kwargs: Kwargs) -> Result<Value, ApiError> {
    let id = kwargs.get_str("id").unwrap_or_default();
    let mut todos = store.write().map_err(|_| lock_error())?;
    match todos.remove(id) {
        Some(_) => Ok(json!({"deleted": true})),
        None => Err(ApiError::domain("todo not found")),
    }
}

fn todo_handlers(store: TodoStore) -> ResourceHandlers {
    let list = {
        let store = store.clone();
        handler_fn(move |ctx, kwargs| list_todos(store.clone(), ctx, kwargs))
    };
    let create = {
        let store = store.clone();
        handler_fn(move |ctx, kwargs| create_todo(store.clone(), ctx, kwargs))
    };
    let get = {
        let store = store.clone();
        handler_fn(move |ctx, kwargs| get_todo(store.clone(), ctx, kwargs))
    };
    let update = {
        let store = store.clone();
        handler_fn(move |ctx, kwargs| update_todo(store.clone(), ctx, kwargs))
    };
    let delete = {
        let store = store.clone();
        handler_fn(move |ctx, kwargs| delete_todo(store.clone(), ctx, kwargs))
    };

    ResourceHandlers::new()
        .list(HandlerSpec::new(list))
        .create(HandlerSpec::new(create))
        .get(HandlerSpec::new(get))
        .update(HandlerSpec::new(update))
        .delete(HandlerSpec::new(delete).with_roles(["admin"]))
}

#[tokio::main]
async fn main() {
    restgate_observability::init();

    let sessions = Arc::new(InMemorySessionResolver::new());
    // Dev session so the protected delete route works out of the box.
    sessions.insert(
        SessionId::from("dev"),
        SessionIdentity::new(UserId::new(1), ["admin"]),
    );
    tracing::info!("dev session registered (cookie: session_id=dev)");
    let resolver: Arc<dyn SessionResolver> = sessions;

    let transactions: Arc<dyn TransactionManager> = match std::env::var("DATABASE_URL") {
        Ok(url) => match PostgresTransactionManager::connect_lazy(&url) {
            Ok(pg) => {
                tracing::info!("using postgres transactions");
                Arc::new(pg)
            }
            Err(err) => {
                tracing::warn!(error = %err, "DATABASE_URL rejected; using in-memory transactions");
                Arc::new(InMemoryTransactionManager::new())
            }
        },
        Err(_) => {
            tracing::warn!("DATABASE_URL not set; using in-memory transactions");
            Arc::new(InMemoryTransactionManager::new())
        }
    };

    let store: TodoStore = Arc::new(RwLock::new(HashMap::new()));
    let app = RestPublisher::new(resolver, transactions)
        .map_resource("todos/", todo_handlers(store), ResourceId::default())
        .into_router();

    let addr = std::env::var("RESTGATE_ADDR").unwrap_or_else(|_| "0.0.0.0:8080".to_string());
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .unwrap_or_else(|e| panic!("failed to bind {addr}: {e}"));

    tracing::info!("listening on {}", listener.local_addr().unwrap());

    axum::serve(listener, app).await.unwrap();
}
