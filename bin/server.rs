// Expense Manager - Web Server
// Form-based dashboard + JSON API with Axum

use anyhow::Context;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{Html, IntoResponse, Json, Response},
    routing::get,
    Router,
};
use chrono::NaiveDate;
use expense_manager::{
    all_expenses, delete_expenses_for_date, fetch_expense_summary, fetch_expenses_by_month_range,
    fetch_expenses_for_date, insert_expense, logging, AppConfig, Database, NewExpense,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tracing::{error, info};

/// Shared application state
#[derive(Clone)]
struct AppState {
    db: Arc<Database>,
}

/// API Response wrapper
#[derive(Serialize)]
struct ApiResponse<T> {
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl<T> ApiResponse<T> {
    fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    fn err(message: String) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message),
        }
    }
}

#[derive(Deserialize)]
struct DateRangeQuery {
    start: NaiveDate,
    end: NaiveDate,
}

/// Month range bounds; full dates or YYYY-MM, only the year-month is used
#[derive(Deserialize)]
struct MonthRangeQuery {
    start: String,
    end: String,
}

#[derive(Serialize)]
struct InsertedResponse {
    id: i64,
}

#[derive(Serialize)]
struct DeletedResponse {
    deleted: usize,
}

/// Run a blocking data-access call off the async workers and shape the response
async fn respond<T, F>(state: AppState, op: &'static str, work: F) -> Response
where
    T: Serialize + Send + 'static,
    F: FnOnce(&Database) -> expense_manager::Result<T> + Send + 'static,
{
    let db = state.db.clone();
    let outcome = tokio::task::spawn_blocking(move || work(&db)).await;

    match outcome {
        Ok(Ok(data)) => (StatusCode::OK, Json(ApiResponse::ok(data))).into_response(),
        Ok(Err(e)) => {
            error!(op, error = %e, "request failed");
            let status = if e.is_rejected_input() {
                StatusCode::BAD_REQUEST
            } else {
                StatusCode::INTERNAL_SERVER_ERROR
            };
            (status, Json(ApiResponse::<T>::err(e.to_string()))).into_response()
        }
        Err(join_error) => {
            error!(op, error = %join_error, "worker task failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ApiResponse::<T>::err("internal error".to_string())),
            )
                .into_response()
        }
    }
}

// ============================================================================
// API Handlers
// ============================================================================

/// GET /api/health - Health check
async fn health_check() -> impl IntoResponse {
    Json(ApiResponse::ok("OK"))
}

/// GET /api/expenses - All expenses
async fn list_expenses(State(state): State<AppState>) -> Response {
    respond(state, "list_expenses", all_expenses).await
}

/// POST /api/expenses - Add one expense
async fn add_expense(State(state): State<AppState>, Json(expense): Json<NewExpense>) -> Response {
    respond(state, "add_expense", move |db| {
        insert_expense(db, &expense).map(|id| InsertedResponse { id })
    })
    .await
}

/// GET /api/expenses/:date - Expenses on one date
async fn expenses_for_date(
    State(state): State<AppState>,
    Path(date): Path<NaiveDate>,
) -> Response {
    respond(state, "expenses_for_date", move |db| fetch_expenses_for_date(db, date)).await
}

/// DELETE /api/expenses/:date - Delete every expense on one date
async fn delete_for_date(State(state): State<AppState>, Path(date): Path<NaiveDate>) -> Response {
    respond(state, "delete_for_date", move |db| {
        delete_expenses_for_date(db, date).map(|deleted| DeletedResponse { deleted })
    })
    .await
}

/// GET /api/summary?start=&end= - Totals per category for a date range
async fn summary(State(state): State<AppState>, Query(range): Query<DateRangeQuery>) -> Response {
    respond(state, "summary", move |db| {
        fetch_expense_summary(db, range.start, range.end)
    })
    .await
}

/// GET /api/summary/months?start=&end= - Totals per category for a month range
async fn month_summary(
    State(state): State<AppState>,
    Query(range): Query<MonthRangeQuery>,
) -> Response {
    respond(state, "month_summary", move |db| {
        fetch_expenses_by_month_range(db, &range.start, &range.end)
    })
    .await
}

/// GET / - Serve the dashboard
async fn serve_index() -> impl IntoResponse {
    Html(include_str!("../web/index.html"))
}

fn router(state: AppState) -> Router {
    let api_routes = Router::new()
        .route("/health", get(health_check))
        .route("/expenses", get(list_expenses).post(add_expense))
        .route(
            "/expenses/:date",
            get(expenses_for_date).delete(delete_for_date),
        )
        .route("/summary", get(summary))
        .route("/summary/months", get(month_summary))
        .with_state(state);

    Router::new()
        .route("/", get(serve_index))
        .nest("/api", api_routes)
        .layer(CorsLayer::permissive())
}

// ============================================================================
// Main Server
// ============================================================================

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = AppConfig::load().context("Failed to load configuration")?;
    logging::init_tracing(&config.log_level);

    let db = Database::new(config.database.clone());
    db.setup().context("Failed to prepare database")?;
    info!(target = %db.config().target(), "database ready");

    let app = router(AppState { db: Arc::new(db) });

    let addr = config.server.bind_address();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    info!("🚀 Server running on http://{}", addr);

    axum::serve(listener, app).await.context("Server error")?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::{Method, Request};
    use expense_manager::DatabaseConfig;
    use serde_json::{json, Value};
    use tower::ServiceExt;

    fn test_app() -> (tempfile::TempDir, Router) {
        let dir = tempfile::tempdir().unwrap();
        let db = Database::new(DatabaseConfig::for_path(dir.path().join("expenses.db")));
        db.setup().unwrap();
        (dir, router(AppState { db: Arc::new(db) }))
    }

    async fn call(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let request = match body {
            Some(body) => Request::builder()
                .method(method)
                .uri(uri)
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => Request::builder().method(method).uri(uri).body(Body::empty()).unwrap(),
        };

        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    async fn add(app: &Router, date: &str, amount: f64, category: &str, notes: &str) {
        let (status, _) = call(
            app,
            Method::POST,
            "/api/expenses",
            Some(json!({
                "expense_date": date,
                "amount": amount,
                "category": category,
                "notes": notes,
            })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_health() {
        let (_dir, app) = test_app();
        let (status, body) = call(&app, Method::GET, "/api/health", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"], "OK");
    }

    #[tokio::test]
    async fn test_add_then_summary() {
        let (_dir, app) = test_app();
        add(&app, "2024-08-10", 100.50, "Food", "Biriyani").await;
        add(&app, "2024-08-12", 20.00, "Food", "Snacks").await;
        add(&app, "2024-08-15", 50.00, "Transport", "").await;

        let (status, body) = call(
            &app,
            Method::GET,
            "/api/summary?start=2024-08-01&end=2024-08-31",
            None,
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            body["data"],
            json!([
                {"category": "Food", "total": 120.5},
                {"category": "Transport", "total": 50.0}
            ])
        );

        let (_, months) = call(
            &app,
            Method::GET,
            "/api/summary/months?start=2024-08&end=2024-08",
            None,
        )
        .await;
        assert_eq!(months["data"], body["data"]);
    }

    #[tokio::test]
    async fn test_invalid_expense_is_bad_request() {
        let (_dir, app) = test_app();

        let (status, body) = call(
            &app,
            Method::POST,
            "/api/expenses",
            Some(json!({"expense_date": "2024-08-10", "amount": 0.0, "category": "Food"})),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["success"], false);
        assert!(body["error"].as_str().unwrap().contains("amount"));

        let (status, _) = call(
            &app,
            Method::POST,
            "/api/expenses",
            Some(json!({"expense_date": "2024-08-10", "amount": 0.004, "category": "Tips"})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_store_side_insert_failure_is_server_error() {
        let dir = tempfile::tempdir().unwrap();
        // No setup: the expenses table does not exist
        let db = Database::new(DatabaseConfig::for_path(dir.path().join("bare.db")));
        let app = router(AppState { db: Arc::new(db) });

        let (status, body) = call(
            &app,
            Method::POST,
            "/api/expenses",
            Some(json!({"expense_date": "2024-08-10", "amount": 12.5, "category": "Food"})),
        )
        .await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["success"], false);
        assert!(body["error"]
            .as_str()
            .unwrap()
            .starts_with("failed to insert expense"));
    }

    #[tokio::test]
    async fn test_fetch_and_delete_by_date() {
        let (_dir, app) = test_app();
        add(&app, "2024-08-10", 100.50, "Food", "Biriyani").await;

        let (_, body) = call(&app, Method::GET, "/api/expenses/2024-08-10", None).await;
        assert_eq!(
            body["data"],
            json!([{"amount": 100.5, "category": "Food", "notes": "Biriyani"}])
        );

        let (_, deleted) = call(&app, Method::DELETE, "/api/expenses/2024-08-10", None).await;
        assert_eq!(deleted["data"]["deleted"], 1);

        let (_, again) = call(&app, Method::DELETE, "/api/expenses/2024-08-10", None).await;
        assert_eq!(again["data"]["deleted"], 0);

        let (_, body) = call(&app, Method::GET, "/api/expenses/2024-08-10", None).await;
        assert_eq!(body["data"], json!([]));
    }
}
