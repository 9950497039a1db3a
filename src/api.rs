//! HTTP API handlers, independent of the socket loop in `bin/server.rs`.
//!
//! Routes:
//! - `GET  /health`
//! - `GET  /tables`
//! - `GET  /describe/{name}`
//! - `POST /compile      {"nl": ...}`
//! - `POST /execute_nl   {"nl": ..., "allow_write": bool}`
//! - `POST /execute_sql  {"sql": ..., "allow_write": bool}`

use crate::config::Settings;
use crate::db::{Database, QueryOutcome};
use crate::engine::{EngineBuilder, Nl2SqlEngine};
use crate::error::{Nl2SqlError, Result};
use crate::ontology::Ontology;
use crate::sql::StatementKind;
use serde::Deserialize;
use serde_json::json;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

#[derive(Debug, Deserialize)]
struct CompileRequest {
    nl: String,
}

#[derive(Debug, Deserialize)]
struct ExecuteNlRequest {
    nl: String,
    #[serde(default)]
    allow_write: bool,
}

#[derive(Debug, Deserialize)]
struct ExecuteSqlRequest {
    sql: String,
    #[serde(default)]
    allow_write: bool,
}

/// Shared server state: one engine tuned to the current schema, one database.
pub struct ApiState {
    engine: Mutex<Nl2SqlEngine>,
    db: Database,
    base_ontology: Ontology,
    settings: Settings,
}

impl ApiState {
    pub fn new(settings: Settings) -> Result<Self> {
        let db = Database::open(&settings.db_path)?;
        Self::with_database(db, settings)
    }

    pub fn with_database(db: Database, settings: Settings) -> Result<Self> {
        let base_ontology = match &settings.ontology_path {
            Some(path) => Ontology::load(path)?,
            None => Ontology::load_default()?,
        };
        let engine = build_engine(&settings, &base_ontology, &db)?;
        Ok(Self {
            engine: Mutex::new(engine),
            db,
            base_ontology,
            settings,
        })
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    /// Rebuild the engine against the live schema.
    pub async fn refresh_engine(&self) -> Result<()> {
        let engine = build_engine(&self.settings, &self.base_ontology, &self.db)?;
        *self.engine.lock().await = engine;
        info!("Engine refreshed from database schema");
        Ok(())
    }

    async fn after_execute(&self, outcome: &QueryOutcome) {
        if outcome.kind == StatementKind::Schema {
            if let Err(e) = self.refresh_engine().await {
                warn!("Engine refresh failed: {}", e);
            }
        }
    }
}

fn build_engine(settings: &Settings, ontology: &Ontology, db: &Database) -> Result<Nl2SqlEngine> {
    EngineBuilder::new()
        .language(&settings.language)
        .verbose(settings.verbose)
        .reduction_mode(settings.reduction_mode)
        .ontology(ontology.clone())
        .catalog(db.catalog()?)
        .build()
}

pub fn extract_content_length(request: &str) -> Option<usize> {
    for line in request.lines() {
        if line.to_lowercase().starts_with("content-length:") {
            if let Some(value) = line.split(':').nth(1) {
                return value.trim().parse().ok();
            }
        }
    }
    None
}

pub fn create_response(status: u16, status_text: &str, body: &str) -> String {
    format!(
        "HTTP/1.1 {} {}\r\n\
         Content-Type: application/json\r\n\
         Access-Control-Allow-Origin: *\r\n\
         Access-Control-Allow-Methods: GET, POST, OPTIONS\r\n\
         Access-Control-Allow-Headers: Content-Type\r\n\
         Content-Length: {}\r\n\
         \r\n\
         {}",
        status,
        status_text,
        body.len(),
        body
    )
}

fn json_response(status: u16, status_text: &str, body: serde_json::Value) -> String {
    create_response(status, status_text, &body.to_string())
}

fn error_response(err: &Nl2SqlError) -> String {
    let (status, text) = match err {
        Nl2SqlError::WriteNotAllowed => (403, "Forbidden"),
        Nl2SqlError::Internal(_) | Nl2SqlError::Io(_) => (500, "Internal Server Error"),
        _ => (400, "Bad Request"),
    };
    json_response(status, text, json!({ "error": err.to_string() }))
}

/// Decode `%XX` escapes in a path segment.
fn percent_decode(raw: &str) -> String {
    let bytes = raw.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' && i + 2 < bytes.len() {
            let hex = std::str::from_utf8(&bytes[i + 1..i + 3]).ok();
            if let Some(b) = hex.and_then(|h| u8::from_str_radix(h, 16).ok()) {
                out.push(b);
                i += 3;
                continue;
            }
        }
        out.push(if bytes[i] == b'+' { b' ' } else { bytes[i] });
        i += 1;
    }
    String::from_utf8_lossy(&out).into_owned()
}

fn request_body(request: &str) -> &str {
    request
        .find("\r\n\r\n")
        .map(|i| &request[i + 4..])
        .unwrap_or("")
}

fn parse_body<'de, T: Deserialize<'de>>(body: &'de str) -> Result<T> {
    Ok(serde_json::from_str(body)?)
}

/// Route one raw HTTP request and render the full response.
pub async fn handle_request(state: &ApiState, request: &str) -> String {
    let Some(request_line) = request.lines().next() else {
        return create_response(400, "Bad Request", "{}");
    };
    let parts: Vec<&str> = request_line.split_whitespace().collect();
    if parts.len() < 2 {
        return create_response(400, "Bad Request", "{}");
    }

    let method = parts[0];
    let path_str = parts[1].split('?').next().unwrap_or("/");
    let mut path = path_str.trim_end_matches('/');
    if path.is_empty() {
        path = "/";
    }
    let body = request_body(request);
    debug!("Request: {} {}", method, path);

    if method == "OPTIONS" {
        return create_response(204, "No Content", "");
    }

    match (method, path) {
        ("GET", "/health") => json_response(
            200,
            "OK",
            json!({
                "status": "ok",
                "service": "nl2sqlite",
                "language": state.settings.language,
                "timestamp": chrono::Utc::now().to_rfc3339(),
            }),
        ),
        ("GET", "/tables") => match state.db.list_tables() {
            Ok(tables) => json_response(200, "OK", json!({ "tables": tables })),
            Err(e) => error_response(&e),
        },
        ("GET", p) if p.starts_with("/describe/") => {
            let name = percent_decode(&p["/describe/".len()..]);
            match state.db.describe_table(&name) {
                Ok(table) => json_response(200, "OK", json!(table)),
                Err(e) => json_response(404, "Not Found", json!({ "error": e.to_string() })),
            }
        }
        ("POST", "/compile") => match parse_body::<CompileRequest>(body) {
            Ok(req) => {
                let compilation = state.engine.lock().await.compile_detailed(&req.nl);
                json_response(200, "OK", json!(compilation))
            }
            Err(e) => error_response(&e),
        },
        ("POST", "/execute_nl") => match parse_body::<ExecuteNlRequest>(body) {
            Ok(req) => execute_nl(state, &req.nl, req.allow_write).await,
            Err(e) => error_response(&e),
        },
        ("POST", "/execute_sql") => match parse_body::<ExecuteSqlRequest>(body) {
            Ok(req) => execute_sql(state, &req.sql, req.allow_write).await,
            Err(e) => error_response(&e),
        },
        _ => json_response(
            404,
            "Not Found",
            json!({ "error": format!("ruta no encontrada: {} {}", method, path) }),
        ),
    }
}

async fn execute_nl(state: &ApiState, nl: &str, allow_write: bool) -> String {
    let compilation = state.engine.lock().await.compile_detailed(nl);
    if !compilation.ok {
        return json_response(
            400,
            "Bad Request",
            json!({
                "nl": nl,
                "sql": compilation.sql,
                "error": compilation.error,
            }),
        );
    }

    match state.db.execute_sql(&compilation.sql, allow_write) {
        Ok(outcome) => {
            state.after_execute(&outcome).await;
            json_response(
                200,
                "OK",
                json!({
                    "nl": nl,
                    "sql": compilation.sql,
                    "intent": compilation.intent,
                    "result": outcome,
                }),
            )
        }
        Err(e) => error_response(&e),
    }
}

async fn execute_sql(state: &ApiState, sql: &str, allow_write: bool) -> String {
    match state.db.execute_sql(sql, allow_write) {
        Ok(outcome) => {
            state.after_execute(&outcome).await;
            json_response(200, "OK", json!({ "sql": sql, "result": outcome }))
        }
        Err(e) => error_response(&e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state() -> ApiState {
        ApiState::with_database(Database::open_in_memory().unwrap(), Settings::default()).unwrap()
    }

    fn post(path: &str, body: &str) -> String {
        format!(
            "POST {} HTTP/1.1\r\nHost: localhost\r\nContent-Type: application/json\r\nContent-Length: {}\r\n\r\n{}",
            path,
            body.len(),
            body
        )
    }

    fn body_json(response: &str) -> serde_json::Value {
        serde_json::from_str(request_body(response)).unwrap()
    }

    #[test]
    fn test_percent_decode() {
        assert_eq!(percent_decode("mis%20tablas"), "mis tablas");
        assert_eq!(percent_decode("categor%C3%ADas"), "categorías");
        assert_eq!(percent_decode("100%"), "100%");
    }

    #[test]
    fn test_content_length() {
        assert_eq!(extract_content_length(&post("/compile", "{}")), Some(2));
    }

    #[tokio::test]
    async fn test_health_and_options() {
        let state = state();
        let response = handle_request(&state, "GET /health HTTP/1.1\r\n\r\n").await;
        assert!(response.starts_with("HTTP/1.1 200 OK"));
        assert_eq!(body_json(&response)["status"], "ok");

        let response = handle_request(&state, "OPTIONS /compile HTTP/1.1\r\n\r\n").await;
        assert!(response.starts_with("HTTP/1.1 204"));
    }

    #[tokio::test]
    async fn test_compile_route() {
        let state = state();
        let response = handle_request(&state, &post("/compile", r#"{"nl":"Dame el precio máximo de los productos"}"#)).await;
        let body = body_json(&response);
        assert_eq!(body["ok"], true);
        assert_eq!(body["sql"], "SELECT MAX(precio) FROM productos;");
        assert_eq!(body["action"], "SELECT");
    }

    #[tokio::test]
    async fn test_ddl_then_query_through_nl() {
        let state = state();
        let create = post(
            "/execute_nl",
            r#"{"nl":"Crear la tabla productos con id, nombre, categoría y precio","allow_write":true}"#,
        );
        assert!(handle_request(&state, &create).await.starts_with("HTTP/1.1 200"));

        let insert = post("/execute_nl", r#"{"nl":"Agregar en productos: lápiz, oficina, 2","allow_write":true}"#);
        assert!(handle_request(&state, &insert).await.starts_with("HTTP/1.1 200"));

        let tables = body_json(&handle_request(&state, "GET /tables HTTP/1.1\r\n\r\n").await);
        assert_eq!(tables["tables"], json!(["productos"]));

        let select = post("/execute_nl", r#"{"nl":"Mostrar los productos con precio menor a 5"}"#);
        let body = body_json(&handle_request(&state, &select).await);
        assert_eq!(body["result"]["rows"], json!([[1, "lápiz", "oficina", 2.0]]));
    }

    #[tokio::test]
    async fn test_write_without_permission_is_forbidden() {
        let state = state();
        let response = handle_request(
            &state,
            &post("/execute_sql", r#"{"sql":"CREATE TABLE t (id INTEGER PRIMARY KEY);"}"#),
        )
        .await;
        assert!(response.starts_with("HTTP/1.1 403"));
    }

    #[tokio::test]
    async fn test_unknown_route_and_table() {
        let state = state();
        let response = handle_request(&state, "GET /nada HTTP/1.1\r\n\r\n").await;
        assert!(response.starts_with("HTTP/1.1 404"));
        let response = handle_request(&state, "GET /describe/pedidos HTTP/1.1\r\n\r\n").await;
        assert!(response.starts_with("HTTP/1.1 404"));
    }
}
