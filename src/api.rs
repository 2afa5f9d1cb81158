// 🌐 REST API - axum router over the SQLite store
//
// Every handler locks the shared connection, runs one db operation and
// wraps the result in the `{ success, data, error }` envelope.

use crate::db;
use crate::entities::{
    Inscription, PaymentRecord, Publication, PublicationStatus, Student, StudentFilter,
    StudentStatus, StudentUpdate, Testimonial, PUBLIC_TESTIMONIAL_LIMIT,
};
use crate::error::AdminError;
use crate::program::Program;
use crate::schema::{
    RawInscriptionRow, RawPaymentRow, RawPublicationRow, RawStudentRow, RawTestimonialRow,
    SchemaValidator, ValidationError,
};
use crate::stats::AdminStats;
use crate::view::{
    compose_category_view, write_category_csv, CategoryRow, StatusFilter, ViewConfig,
};
use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Json, Response},
    routing::{delete, get, post, put},
    Router,
};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex, MutexGuard};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, warn};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<Mutex<Connection>>,
}

impl AppState {
    pub fn new(conn: Connection) -> Self {
        Self {
            db: Arc::new(Mutex::new(conn)),
        }
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>, ApiError> {
        self.db
            .lock()
            .map_err(|_| ApiError(anyhow::anyhow!("database lock poisoned")))
    }
}

/// API Response wrapper
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn failure(message: String) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message),
        }
    }
}

type ApiResult<T> = Result<Json<ApiResponse<T>>, ApiError>;

fn ok<T>(data: T) -> ApiResult<T> {
    Ok(Json(ApiResponse::ok(data)))
}

// ============================================================================
// ERRORS
// ============================================================================

/// Any handler failure; the status code comes from the `AdminError` inside
pub struct ApiError(anyhow::Error);

impl<E> From<E> for ApiError
where
    E: Into<anyhow::Error>,
{
    fn from(err: E) -> Self {
        ApiError(err.into())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match self.0.downcast_ref::<AdminError>() {
            Some(AdminError::NotFound { .. }) => StatusCode::NOT_FOUND,
            Some(AdminError::Validation(_)) => StatusCode::BAD_REQUEST,
            Some(AdminError::Conflict(_)) => StatusCode::CONFLICT,
            None => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let message = format!("{:#}", self.0);
        if status.is_server_error() {
            error!(error = %message, "request failed");
        } else {
            warn!(status = status.as_u16(), error = %message, "request rejected");
        }

        (status, Json(ApiResponse::<()>::failure(message))).into_response()
    }
}

fn invalid(errors: Vec<ValidationError>) -> ApiError {
    AdminError::Validation(errors).into()
}

// ============================================================================
// STUDENTS
// ============================================================================

#[derive(Debug, Serialize)]
pub struct StudentDetail {
    pub student: Student,
    pub payments: Vec<PaymentRecord>,
}

/// GET /api/health - Health check
async fn health_check() -> Json<ApiResponse<&'static str>> {
    Json(ApiResponse::ok("OK"))
}

/// GET /api/students - Filtered student list, sorted by name
async fn list_students(
    State(state): State<AppState>,
    Query(filter): Query<StudentFilter>,
) -> ApiResult<Vec<Student>> {
    let conn = state.conn()?;
    let students = db::get_all_students(&conn)?;
    let filtered: Vec<Student> = filter.apply(&students).into_iter().cloned().collect();
    ok(filtered)
}

/// POST /api/students
async fn create_student(
    State(state): State<AppState>,
    Json(raw): Json<RawStudentRow>,
) -> Result<(StatusCode, Json<ApiResponse<Student>>), ApiError> {
    let student = SchemaValidator::new().student(&raw).map_err(invalid)?;
    let conn = state.conn()?;
    db::insert_student(&conn, &student)?;
    Ok((StatusCode::CREATED, Json(ApiResponse::ok(student))))
}

/// GET /api/students/:id - Profile with payment history
async fn get_student(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<StudentDetail> {
    let conn = state.conn()?;
    let student = db::get_student(&conn, &id)?
        .ok_or_else(|| AdminError::not_found("student", &id))?;
    let payments = db::get_payments_for_student(&conn, &id)?;
    ok(StudentDetail { student, payments })
}

/// PUT /api/students/:id - Partial update from the edit form
async fn update_student(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(update): Json<StudentUpdate>,
) -> ApiResult<Student> {
    let conn = state.conn()?;
    let mut student = db::get_student(&conn, &id)?
        .ok_or_else(|| AdminError::not_found("student", &id))?;
    update.apply(&mut student);
    db::update_student(&conn, &student)?;
    ok(student)
}

async fn delete_student(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<String> {
    let conn = state.conn()?;
    db::delete_student(&conn, &id)?;
    ok(id)
}

async fn archive_student(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Student> {
    change_student_status(&state, &id, StudentStatus::Archived)
}

async fn restore_student(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Student> {
    change_student_status(&state, &id, StudentStatus::Active)
}

fn change_student_status(state: &AppState, id: &str, status: StudentStatus) -> ApiResult<Student> {
    let conn = state.conn()?;
    db::set_student_status(&conn, id, status)?;
    let student =
        db::get_student(&conn, id)?.ok_or_else(|| AdminError::not_found("student", id))?;
    ok(student)
}

// ============================================================================
// PAYMENTS
// ============================================================================

/// GET /api/payments - Every record, newest first
async fn list_payments(State(state): State<AppState>) -> ApiResult<Vec<PaymentRecord>> {
    let conn = state.conn()?;
    ok(db::get_all_payments(&conn)?)
}

/// POST /api/payments - Record one month for one student
async fn create_payment(
    State(state): State<AppState>,
    Json(raw): Json<RawPaymentRow>,
) -> Result<(StatusCode, Json<ApiResponse<PaymentRecord>>), ApiError> {
    let record = SchemaValidator::new().payment(&raw).map_err(invalid)?;
    let conn = state.conn()?;
    db::insert_payment(&conn, &record)?;
    Ok((StatusCode::CREATED, Json(ApiResponse::ok(record))))
}

#[derive(Debug, Default, Deserialize)]
pub struct SummaryQuery {
    pub start: Option<String>,
    pub end: Option<String>,
    pub status: Option<String>,
    pub student: Option<String>,
}

impl SummaryQuery {
    fn to_config(&self, program_key: &str) -> Result<ViewConfig, ApiError> {
        let program = Program::from_key(program_key)
            .ok_or_else(|| AdminError::not_found("program", program_key))?;

        let status = match self.status.as_deref() {
            Some(key) => StatusFilter::parse(key).ok_or_else(|| {
                invalid(vec![ValidationError::new(
                    "status",
                    "Expected \"all\", \"paye\" or \"non_paye\"",
                    "Summary",
                )])
            })?,
            None => StatusFilter::All,
        };

        let mut config = ViewConfig::new(program);
        if let Some(start) = &self.start {
            config.start_month = start.clone();
        }
        if let Some(end) = &self.end {
            config.end_month = end.clone();
        }

        Ok(config.with_status(status).focused_on(self.student.clone()))
    }
}

#[derive(Debug, Serialize)]
pub struct CategorySummary {
    pub program: Program,
    pub label: &'static str,
    pub start_month: String,
    pub end_month: String,
    pub status_filter: StatusFilter,
    pub file_name: String,
    pub rows: Vec<CategoryRow>,
}

fn load_category(state: &AppState, config: &ViewConfig) -> Result<Vec<CategoryRow>, ApiError> {
    let conn = state.conn()?;
    let students = db::get_all_students(&conn)?;
    let payments = db::get_all_payments(&conn)?;
    Ok(compose_category_view(&students, &payments, config))
}

/// GET /api/payments/summary/:program - One category table
async fn category_summary(
    State(state): State<AppState>,
    Path(program): Path<String>,
    Query(query): Query<SummaryQuery>,
) -> ApiResult<CategorySummary> {
    let config = query.to_config(&program)?;
    let rows = load_category(&state, &config)?;

    ok(CategorySummary {
        program: config.program,
        label: config.program.label(),
        file_name: config.export_file_name(),
        start_month: config.start_month,
        end_month: config.end_month,
        status_filter: config.status_filter,
        rows,
    })
}

/// GET /api/payments/summary/:program/export - Same table as CSV
async fn export_category(
    State(state): State<AppState>,
    Path(program): Path<String>,
    Query(query): Query<SummaryQuery>,
) -> Result<Response, ApiError> {
    let config = query.to_config(&program)?;
    let rows = load_category(&state, &config)?;

    let mut body = Vec::new();
    write_category_csv(&rows, &mut body)?;

    let disposition = format!("attachment; filename=\"{}\"", config.export_file_name());
    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        body,
    )
        .into_response())
}

/// GET /api/stats - Dashboard counters
async fn get_stats(State(state): State<AppState>) -> ApiResult<AdminStats> {
    let conn = state.conn()?;
    let students = db::get_all_students(&conn)?;
    ok(AdminStats::compute(&students))
}

// ============================================================================
// INSCRIPTIONS
// ============================================================================

async fn list_inscriptions(State(state): State<AppState>) -> ApiResult<Vec<Inscription>> {
    let conn = state.conn()?;
    ok(db::get_all_inscriptions(&conn)?)
}

/// POST /api/inscriptions - Public enrollment form
async fn create_inscription(
    State(state): State<AppState>,
    Json(raw): Json<RawInscriptionRow>,
) -> Result<(StatusCode, Json<ApiResponse<Inscription>>), ApiError> {
    let inscription = SchemaValidator::new().inscription(&raw).map_err(invalid)?;
    let conn = state.conn()?;
    db::insert_inscription(&conn, &inscription)?;
    Ok((StatusCode::CREATED, Json(ApiResponse::ok(inscription))))
}

/// POST /api/inscriptions/:id/confirm - Enroll as a student
async fn confirm_inscription(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<(StatusCode, Json<ApiResponse<Student>>), ApiError> {
    let conn = state.conn()?;
    let student = db::confirm_inscription(&conn, &id)?;
    Ok((StatusCode::CREATED, Json(ApiResponse::ok(student))))
}

#[derive(Debug, Deserialize)]
pub struct NotesBody {
    pub notes: Option<String>,
}

async fn update_inscription_notes(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(body): Json<NotesBody>,
) -> ApiResult<Inscription> {
    let conn = state.conn()?;
    db::update_inscription_notes(&conn, &id, body.notes.as_deref())?;
    let inscription = db::get_inscription(&conn, &id)?
        .ok_or_else(|| AdminError::not_found("inscription", &id))?;
    ok(inscription)
}

async fn delete_inscription(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<String> {
    let conn = state.conn()?;
    db::delete_inscription(&conn, &id)?;
    ok(id)
}

// ============================================================================
// PUBLICATIONS
// ============================================================================

async fn list_publications(State(state): State<AppState>) -> ApiResult<Vec<Publication>> {
    let conn = state.conn()?;
    ok(db::get_all_publications(&conn)?)
}

async fn create_publication(
    State(state): State<AppState>,
    Json(raw): Json<RawPublicationRow>,
) -> Result<(StatusCode, Json<ApiResponse<Publication>>), ApiError> {
    let mut post = SchemaValidator::new().publication(&raw).map_err(invalid)?;
    let conn = state.conn()?;
    db::insert_publication(&conn, &mut post)?;
    Ok((StatusCode::CREATED, Json(ApiResponse::ok(post))))
}

/// PUT /api/publications/:id - Edit title and content; status, slug and
/// cover change only when sent
async fn update_publication(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(raw): Json<RawPublicationRow>,
) -> ApiResult<Publication> {
    let conn = state.conn()?;
    let existing = db::get_publication(&conn, &id)?
        .ok_or_else(|| AdminError::not_found("publication", &id))?;

    let mut post = SchemaValidator::new()
        .publication_update(&raw, &existing)
        .map_err(invalid)?;
    db::update_publication(&conn, &mut post)?;
    ok(post)
}

#[derive(Debug, Default, Deserialize)]
pub struct StatusBody {
    pub status: Option<String>,
}

/// POST /api/publications/:id/status - Set, or toggle when no status given
async fn set_publication_status(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Option<Json<StatusBody>>,
) -> ApiResult<Publication> {
    let conn = state.conn()?;
    let existing = db::get_publication(&conn, &id)?
        .ok_or_else(|| AdminError::not_found("publication", &id))?;

    let requested = body.and_then(|Json(b)| b.status);
    let status = match requested.as_deref() {
        Some(tag) => PublicationStatus::parse(tag).ok_or_else(|| {
            invalid(vec![ValidationError::new(
                "status",
                "Expected \"draft\" or \"published\"",
                "Publication",
            )])
        })?,
        None => existing.status.toggled(),
    };

    db::set_publication_status(&conn, &id, status)?;
    let updated = db::get_publication(&conn, &id)?
        .ok_or_else(|| AdminError::not_found("publication", &id))?;
    ok(updated)
}

async fn delete_publication(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<String> {
    let conn = state.conn()?;
    db::delete_publication(&conn, &id)?;
    ok(id)
}

/// GET /api/public/publications - Magazine listing, published only
async fn public_publications(State(state): State<AppState>) -> ApiResult<Vec<Publication>> {
    let conn = state.conn()?;
    ok(db::get_published_publications(&conn)?)
}

/// GET /api/public/publications/:slug
async fn public_publication(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> ApiResult<Publication> {
    let conn = state.conn()?;
    let post = db::get_publication_by_slug(&conn, &slug)?
        .ok_or_else(|| AdminError::not_found("publication", &slug))?;
    ok(post)
}

// ============================================================================
// TESTIMONIALS
// ============================================================================

/// GET /api/public/testimonials - Newest messages for the public page
async fn public_testimonials(State(state): State<AppState>) -> ApiResult<Vec<Testimonial>> {
    let conn = state.conn()?;
    ok(db::get_recent_testimonials(&conn, PUBLIC_TESTIMONIAL_LIMIT)?)
}

/// POST /api/public/testimonials - Public testimonial form
async fn create_testimonial(
    State(state): State<AppState>,
    Json(raw): Json<RawTestimonialRow>,
) -> Result<(StatusCode, Json<ApiResponse<Testimonial>>), ApiError> {
    let testimonial = SchemaValidator::new().testimonial(&raw).map_err(invalid)?;
    let conn = state.conn()?;
    db::insert_testimonial(&conn, &testimonial)?;
    Ok((StatusCode::CREATED, Json(ApiResponse::ok(testimonial))))
}

async fn list_testimonials(State(state): State<AppState>) -> ApiResult<Vec<Testimonial>> {
    let conn = state.conn()?;
    ok(db::get_all_testimonials(&conn)?)
}

async fn delete_testimonial(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<String> {
    let conn = state.conn()?;
    db::delete_testimonial(&conn, &id)?;
    ok(id)
}

// ============================================================================
// ROUTER
// ============================================================================

/// Build the full application: API routes under `/api`, CORS and request tracing
pub fn router(state: AppState) -> Router {
    let api_routes = Router::new()
        .route("/health", get(health_check))
        .route("/students", get(list_students).post(create_student))
        .route(
            "/students/:id",
            get(get_student).put(update_student).delete(delete_student),
        )
        .route("/students/:id/archive", post(archive_student))
        .route("/students/:id/restore", post(restore_student))
        .route("/payments", get(list_payments).post(create_payment))
        .route("/payments/summary/:program", get(category_summary))
        .route("/payments/summary/:program/export", get(export_category))
        .route("/stats", get(get_stats))
        .route("/inscriptions", get(list_inscriptions).post(create_inscription))
        .route("/inscriptions/:id", delete(delete_inscription))
        .route("/inscriptions/:id/confirm", post(confirm_inscription))
        .route("/inscriptions/:id/notes", put(update_inscription_notes))
        .route("/publications", get(list_publications).post(create_publication))
        .route("/publications/:id", put(update_publication).delete(delete_publication))
        .route("/publications/:id/status", post(set_publication_status))
        .route("/public/publications", get(public_publications))
        .route("/public/publications/:slug", get(public_publication))
        .route("/public/testimonials", get(public_testimonials).post(create_testimonial))
        .route("/testimonials", get(list_testimonials))
        .route("/testimonials/:id", delete(delete_testimonial))
        .with_state(state);

    Router::new()
        .nest("/api", api_routes)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::{Method, Request};
    use serde_json::{json, Value};
    use tower::ServiceExt;

    fn test_app() -> Router {
        let conn = Connection::open_in_memory().unwrap();
        db::setup_database(&conn).unwrap();
        router(AppState::new(conn))
    }

    async fn call(
        app: &Router,
        method: Method,
        uri: &str,
        body: Option<Value>,
    ) -> (StatusCode, Vec<u8>) {
        let builder = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, bytes.to_vec())
    }

    async fn call_json(
        app: &Router,
        method: Method,
        uri: &str,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let (status, bytes) = call(app, method, uri, body).await;
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    async fn add_student(app: &Router, name: &str, program: &str) -> String {
        let (status, body) = call_json(
            app,
            Method::POST,
            "/api/students",
            Some(json!({ "nom": name, "programme": program, "groupe": 2 })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        body["data"]["id"].as_str().unwrap().to_string()
    }

    async fn pay(app: &Router, student_id: &str, month: &str) {
        let (status, _) = call_json(
            app,
            Method::POST,
            "/api/payments",
            Some(json!({ "etudiant_id": student_id, "mois": month, "statut": "paye" })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
    }

    #[tokio::test]
    async fn test_health() {
        let app = test_app();
        let (status, body) = call_json(&app, Method::GET, "/api/health", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);
        assert_eq!(body["data"], "OK");
    }

    #[tokio::test]
    async fn test_summary_reconciles_range() {
        let app = test_app();
        let anne = add_student(&app, "Anne", "Maquillage").await;
        let berthe = add_student(&app, "Berthe", "maquillage").await;
        add_student(&app, "Carla", "Décoration").await;

        for month in ["01", "02", "03"] {
            pay(&app, &anne, month).await;
        }
        pay(&app, &berthe, "01").await;

        let (status, body) = call_json(
            &app,
            Method::GET,
            "/api/payments/summary/maquillage?start=01&end=03",
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        let rows = body["data"]["rows"].as_array().unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0]["name"], "Anne");
        assert_eq!(rows[0]["status_label"], "Payé");
        assert_eq!(rows[0]["group"], "Weekend");
        assert_eq!(rows[1]["status_label"], "Non payé");
        assert_eq!(body["data"]["file_name"], "paiements_maquillage_01-03.csv");

        let (_, body) = call_json(
            &app,
            Method::GET,
            &format!(
                "/api/payments/summary/maquillage?start=01&end=03&status=paye&student={berthe}"
            ),
            None,
        )
        .await;
        assert!(body["data"]["rows"].as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_summary_rejects_unknown_program_and_status() {
        let app = test_app();
        let (status, body) =
            call_json(&app, Method::GET, "/api/payments/summary/coiffure", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["success"], false);

        let uri = "/api/payments/summary/decoration?status=maybe";
        let (status, _) = call_json(&app, Method::GET, uri, None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_export_csv() {
        let app = test_app();
        let anne = add_student(&app, "Anne", "cosmetologie").await;
        pay(&app, &anne, "02").await;

        let request = Request::builder()
            .uri("/api/payments/summary/cosmetologie/export?start=02&end=02")
            .body(Body::empty())
            .unwrap();
        let response = app.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()[header::CONTENT_DISPOSITION],
            "attachment; filename=\"paiements_cosmetologie_02-02.csv\""
        );

        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let text = String::from_utf8(bytes.to_vec()).unwrap();
        assert_eq!(text, "Nom,Groupe,Mois payés,Status\nAnne,Weekend,Fév,Payé\n");
    }

    #[tokio::test]
    async fn test_invalid_payment_is_bad_request() {
        let app = test_app();
        let anne = add_student(&app, "Anne", "maquillage").await;

        let (status, body) = call_json(
            &app,
            Method::POST,
            "/api/payments",
            Some(json!({ "etudiant_id": anne, "mois": "13", "statut": "paye" })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].as_str().unwrap().contains("mois"));

        let (status, _) = call_json(
            &app,
            Method::POST,
            "/api/payments",
            Some(json!({ "etudiant_id": "ghost", "mois": 4, "statut": "paye" })),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_student_lifecycle() {
        let app = test_app();
        let id = add_student(&app, "Rose", "maquillage").await;

        let (status, body) = call_json(
            &app,
            Method::PUT,
            &format!("/api/students/{id}"),
            Some(json!({ "telephone": "3823-5518", "programme": "decoration" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["programme"], "decoration");

        let archive = format!("/api/students/{id}/archive");
        let (_, body) = call_json(&app, Method::POST, &archive, None).await;
        assert_eq!(body["data"]["statut"], "archive");

        let (_, body) = call_json(&app, Method::GET, "/api/students?status=actif", None).await;
        assert!(body["data"].as_array().unwrap().is_empty());

        let (_, body) = call_json(&app, Method::GET, "/api/stats", None).await;
        assert_eq!(body["data"]["archived"], 1);
        assert_eq!(body["data"]["decoration"]["weekend"], 1);

        let profile = format!("/api/students/{id}");
        let (status, _) = call_json(&app, Method::DELETE, &profile, None).await;
        assert_eq!(status, StatusCode::OK);
        let (status, _) = call_json(&app, Method::GET, &profile, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_inscription_confirmation_conflict() {
        let app = test_app();
        let (status, body) = call_json(
            &app,
            Method::POST,
            "/api/inscriptions",
            Some(json!({
                "nom": "Nadia",
                "telephone": "+509 3700-0000",
                "specialites": ["Maquillage"],
                "programme": "weekend"
            })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        let id = body["data"]["id"].as_str().unwrap().to_string();

        let confirm = format!("/api/inscriptions/{id}/confirm");
        let (status, body) = call_json(&app, Method::POST, &confirm, None).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["data"]["groupe"], "weekend");

        let (status, _) = call_json(&app, Method::POST, &confirm, None).await;
        assert_eq!(status, StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn test_public_publications_hide_drafts() {
        let app = test_app();
        let (_, body) = call_json(
            &app,
            Method::POST,
            "/api/publications",
            Some(json!({ "title": "Rentrée 2025", "content": "Bienvenue" })),
        )
        .await;
        let id = body["data"]["id"].as_str().unwrap().to_string();
        assert_eq!(body["data"]["slug"], "rentree-2025");

        let public = "/api/public/publications/rentree-2025";
        let (status, _) = call_json(&app, Method::GET, public, None).await;
        assert_eq!(status, StatusCode::OK);

        // No body toggles published -> draft
        let toggle = format!("/api/publications/{id}/status");
        let (_, body) = call_json(&app, Method::POST, &toggle, None).await;
        assert_eq!(body["data"]["status"], "draft");

        let (status, _) = call_json(&app, Method::GET, public, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        let (_, body) = call_json(&app, Method::GET, "/api/public/publications", None).await;
        assert!(body["data"].as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_edit_keeps_draft_status_and_slug() {
        let app = test_app();
        let (status, body) = call_json(
            &app,
            Method::POST,
            "/api/publications",
            Some(json!({ "title": "Brouillon", "content": "x", "status": "draft" })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["data"]["slug"], "brouillon");
        let id = body["data"]["id"].as_str().unwrap().to_string();

        let (status, body) = call_json(
            &app,
            Method::PUT,
            &format!("/api/publications/{id}"),
            Some(json!({ "title": "Brouillon corrigé", "content": "y" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["status"], "draft");
        assert_eq!(body["data"]["slug"], "brouillon");
        assert_eq!(body["data"]["title"], "Brouillon corrigé");

        let (_, body) = call_json(&app, Method::GET, "/api/public/publications", None).await;
        assert!(body["data"].as_array().unwrap().is_empty());

        let (status, _) = call_json(
            &app,
            Method::PUT,
            "/api/publications/missing",
            Some(json!({ "title": "Ailleurs", "content": "z" })),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_public_slug_is_decoded_once() {
        let app = test_app();
        let (_, body) = call_json(
            &app,
            Method::POST,
            "/api/publications",
            Some(json!({ "title": "Portes ouvertes", "content": "Samedi" })),
        )
        .await;
        assert_eq!(body["data"]["slug"], "portes-ouvertes");

        let (status, body) =
            call_json(&app, Method::GET, "/api/public/publications/portes%2Douvertes", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["title"], "Portes ouvertes");

        // "%252D" is the literal text "%2D" once decoded, not a dash
        let (status, _) =
            call_json(&app, Method::GET, "/api/public/publications/portes%252Douvertes", None)
                .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_export_file_name_ignores_raw_month_text() {
        let app = test_app();
        let anne = add_student(&app, "Anne", "cosmetologie").await;
        pay(&app, &anne, "03").await;

        let request = Request::builder()
            .uri("/api/payments/summary/cosmetologie/export?start=3&end=%2003")
            .body(Body::empty())
            .unwrap();
        let response = app.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()[header::CONTENT_DISPOSITION],
            "attachment; filename=\"paiements_cosmetologie_03-03.csv\""
        );

        let request = Request::builder()
            .uri("/api/payments/summary/cosmetologie/export?start=01%22%3B%20x%3D&end=02")
            .body(Body::empty())
            .unwrap();
        let response = app.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()[header::CONTENT_DISPOSITION],
            "attachment; filename=\"paiements_cosmetologie.csv\""
        );
    }

    #[tokio::test]
    async fn test_testimonials_public_form_and_moderation() {
        let app = test_app();
        let (status, body) = call_json(
            &app,
            Method::POST,
            "/api/public/testimonials",
            Some(json!({ "nom": "Nadia", "message": "Merci pour la formation", "note": 5 })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["data"]["note"], 5);
        let id = body["data"]["id"].as_str().unwrap().to_string();

        let (status, body) = call_json(
            &app,
            Method::POST,
            "/api/public/testimonials",
            Some(json!({ "nom": "Rose", "message": "Trop bien", "note": 7 })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].as_str().unwrap().contains("note"));

        let (status, _) = call_json(
            &app,
            Method::POST,
            "/api/public/testimonials",
            Some(json!({ "nom": "Rose", "message": "  " })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (_, body) = call_json(&app, Method::GET, "/api/public/testimonials", None).await;
        let listed = body["data"].as_array().unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0]["nom"], "Nadia");

        let (_, body) = call_json(&app, Method::GET, "/api/testimonials", None).await;
        assert_eq!(body["data"].as_array().unwrap().len(), 1);

        let uri = format!("/api/testimonials/{id}");
        let (status, _) = call_json(&app, Method::DELETE, &uri, None).await;
        assert_eq!(status, StatusCode::OK);
        let (status, _) = call_json(&app, Method::DELETE, &uri, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (_, body) = call_json(&app, Method::GET, "/api/public/testimonials", None).await;
        assert!(body["data"].as_array().unwrap().is_empty());
    }
}
