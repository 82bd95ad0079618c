use axum::body::Body;
use axum::http::{Request, StatusCode};
use chrono::{Duration, TimeZone, Utc};
use rusty_library_loans::adapters::mock::{
    BookCatalog as MockBookCatalog, Clock as MockClock, LoanStore as MockLoanStore,
    Notifier as MockNotifier, UserLookup as MockUserLookup,
};
use rusty_library_loans::api::handlers::{AppState, USER_ID_HEADER};
use rusty_library_loans::api::router::create_router;
use rusty_library_loans::api::types::*;
use rusty_library_loans::application::loan::{LoanPolicy, ServiceDependencies};
use rusty_library_loans::domain::value_objects::*;
use serde_json::{Value, json};
use std::sync::Arc;
use tower::ServiceExt;

// ============================================================================
// テスト用のヘルパー関数
// ============================================================================

struct TestApp {
    router: axum::Router,
    notifier: Arc<MockNotifier>,
    loan_store: Arc<MockLoanStore>,
    clock: Arc<MockClock>,
    user_id: UserId,
    book_id: BookId,
}

/// モックアダプターで構成したルーター
///
/// 連絡先付きの利用者と書籍を1件ずつ登録しておく。
fn setup_app() -> TestApp {
    let loan_store = Arc::new(MockLoanStore::new());
    let notifier = Arc::new(MockNotifier::new());
    let user_lookup = Arc::new(MockUserLookup::new());
    let book_catalog = Arc::new(MockBookCatalog::new());
    let clock = Arc::new(MockClock::new(
        Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap(),
    ));

    let user_id = UserId::new();
    let book_id = BookId::new();
    user_lookup.add_user(user_id, ContactAddress::new("alice@library.test").unwrap());
    book_catalog.add_book(book_id);

    let service_deps = ServiceDependencies {
        loan_store: loan_store.clone(),
        notifier: notifier.clone(),
        user_lookup,
        book_catalog,
        policy: LoanPolicy::default(),
    };

    let state = Arc::new(AppState {
        service_deps,
        clock: clock.clone(),
    });

    TestApp {
        router: create_router(state),
        notifier,
        loan_store,
        clock,
        user_id,
        book_id,
    }
}

async fn send(app: &TestApp, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let value = if body.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&body).unwrap_or(Value::Null)
    };
    (status, value)
}

fn create_loan_request(user_id: UserId, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/loans")
        .header("content-type", "application/json")
        .header(USER_ID_HEADER, user_id.to_string())
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn return_loan_request(user_id: UserId, loan_id: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(format!("/loans/{}/return", loan_id))
        .header(USER_ID_HEADER, user_id.to_string())
        .body(Body::empty())
        .unwrap()
}

async fn create_loan(app: &TestApp, days: i64) -> LoanOutcomeResponse {
    let (status, body) = send(
        app,
        create_loan_request(
            app.user_id,
            json!({ "book_id": app.book_id.to_string(), "duration_days": days }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    serde_json::from_value(body).unwrap()
}

// ============================================================================
// 正常系
// ============================================================================

#[tokio::test]
async fn test_health_check() {
    let app = setup_app();
    let response = app
        .router
        .clone()
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_full_loan_flow() {
    let app = setup_app();

    // Step 1: 貸出作成（POST /loans）
    let created = create_loan(&app, 7).await;
    assert_eq!(created.loan.user_id, app.user_id.value());
    assert_eq!(created.loan.book_id, app.book_id.value());
    assert_eq!(created.loan.duration_days, 7);
    assert_eq!(created.loan.due_at, created.loan.borrowed_at + Duration::days(7));
    assert!(!created.loan.returned);
    assert!(created.warnings.is_empty());

    // Step 2: 一覧取得（GET /loans）
    let (status, body) = send(
        &app,
        Request::builder()
            .uri("/loans")
            .header(USER_ID_HEADER, app.user_id.to_string())
            .body(Body::empty())
            .unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let loans: Vec<LoanResponse> = serde_json::from_value(body).unwrap();
    assert_eq!(loans, vec![created.loan]);

    // Step 3: 9日後に返却（POST /loans/:id/return）
    app.clock.advance(Duration::days(9));
    let (status, body) = send(
        &app,
        return_loan_request(app.user_id, &loans[0].loan_id.to_string()),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let returned: LoanOutcomeResponse = serde_json::from_value(body).unwrap();
    assert!(returned.loan.returned);
    assert_eq!(returned.loan.fine, 10_000);
    assert!(returned.loan.returned_at.is_some());

    // 貸出確認と延滞料金の通知
    let subjects: Vec<String> = app.notifier.sent().into_iter().map(|m| m.subject).collect();
    assert_eq!(subjects, vec!["Loan confirmation", "Late return fine"]);
}

#[tokio::test]
async fn test_create_loan_reports_notification_warning() {
    let app = setup_app();
    app.notifier.set_failing(true);

    let created = create_loan(&app, 7).await;

    assert_eq!(created.warnings.len(), 1);
    assert!(created.warnings[0].contains("delivery failed"));
    assert_eq!(app.loan_store.len(), 1);
}

// ============================================================================
// 異常系
// ============================================================================

#[tokio::test]
async fn test_missing_user_header_is_unauthorized() {
    let app = setup_app();

    let (status, body) = send(
        &app,
        Request::builder().uri("/loans").body(Body::empty()).unwrap(),
    )
    .await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "UNAUTHENTICATED");
}

#[tokio::test]
async fn test_malformed_user_header_is_unauthorized() {
    let app = setup_app();

    let (status, _) = send(
        &app,
        Request::builder()
            .uri("/loans")
            .header(USER_ID_HEADER, "not-a-uuid")
            .body(Body::empty())
            .unwrap(),
    )
    .await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_create_loan_zero_duration_is_bad_request() {
    let app = setup_app();

    let (status, body) = send(
        &app,
        create_loan_request(
            app.user_id,
            json!({ "book_id": app.book_id.to_string(), "duration_days": 0 }),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "INVALID_INPUT");
    assert!(app.loan_store.is_empty());
}

#[tokio::test]
async fn test_create_loan_malformed_book_id_is_bad_request() {
    let app = setup_app();

    let (status, body) = send(
        &app,
        create_loan_request(
            app.user_id,
            json!({ "book_id": "abc", "duration_days": 7 }),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "INVALID_INPUT");
}

#[tokio::test]
async fn test_create_loan_missing_field_is_bad_request() {
    let app = setup_app();

    let (status, body) = send(
        &app,
        create_loan_request(app.user_id, json!({ "book_id": app.book_id.to_string() })),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "INVALID_INPUT");
}

#[tokio::test]
async fn test_create_loan_unknown_book_is_bad_request() {
    let app = setup_app();

    let (status, body) = send(
        &app,
        create_loan_request(
            app.user_id,
            json!({ "book_id": BookId::new().to_string(), "duration_days": 7 }),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "INVALID_REFERENCE");
}

#[tokio::test]
async fn test_return_unknown_loan_is_not_found() {
    let app = setup_app();

    let (status, body) = send(
        &app,
        return_loan_request(app.user_id, &LoanId::new().to_string()),
    )
    .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "LOAN_NOT_FOUND");
}

#[tokio::test]
async fn test_return_malformed_loan_id_is_bad_request() {
    let app = setup_app();

    let (status, _) = send(&app, return_loan_request(app.user_id, "12345")).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_return_by_other_user_is_unauthorized() {
    let app = setup_app();
    let created = create_loan(&app, 7).await;

    let (status, body) = send(
        &app,
        return_loan_request(UserId::new(), &created.loan.loan_id.to_string()),
    )
    .await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "FORBIDDEN");
}

#[tokio::test]
async fn test_return_twice_is_bad_request() {
    let app = setup_app();
    let created = create_loan(&app, 7).await;
    let loan_id = created.loan.loan_id.to_string();

    let (status, _) = send(&app, return_loan_request(app.user_id, &loan_id)).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send(&app, return_loan_request(app.user_id, &loan_id)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "ALREADY_RETURNED");
}

#[tokio::test]
async fn test_store_failure_is_internal_error() {
    let app = setup_app();
    app.loan_store.set_unavailable(true);

    let (status, body) = send(
        &app,
        Request::builder()
            .uri("/loans")
            .header(USER_ID_HEADER, app.user_id.to_string())
            .body(Body::empty())
            .unwrap(),
    )
    .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "STORE_UNAVAILABLE");
}
