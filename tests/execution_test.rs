use nl2sqlite::api::{handle_request, ApiState};
use nl2sqlite::demo::DEMO_QUERIES;
use nl2sqlite::sql::StatementKind;
use nl2sqlite::{Database, EngineBuilder, Nl2SqlEngine, Nl2SqlError, Settings};
use serde_json::json;
use tempfile::TempDir;

fn temp_db() -> Result<(TempDir, Database), Box<dyn std::error::Error>> {
    let dir = TempDir::new()?;
    let db = Database::open(dir.path().join("demo.db"))?;
    Ok((dir, db))
}

#[test]
fn test_demo_runs_against_sqlite() -> Result<(), Box<dyn std::error::Error>> {
    let (_dir, db) = temp_db()?;
    let engine = Nl2SqlEngine::new("es", false, "protected")?;

    for query in DEMO_QUERIES {
        let sql = engine.compile(query);
        db.execute_sql(&sql, true)
            .map_err(|e| format!("{} -> {}: {}", query, sql, e))?;
    }

    assert_eq!(db.list_tables()?, vec!["productos", "usuarios"]);

    let users = db.execute_sql("SELECT nombre, email FROM usuarios;", false)?;
    assert_eq!(users.rows, vec![vec![json!("Ana"), json!("ana.nueva@empresa.com")]]);

    let total = db.execute_sql(&engine.compile(DEMO_QUERIES[12]), false)?;
    assert_eq!(total.kind, StatementKind::Query);
    assert_eq!(total.rows, vec![vec![json!(1500.0)]]);

    let adults = db.execute_sql(&engine.compile(DEMO_QUERIES[8]), false)?;
    assert_eq!(adults.rows.len(), 1);
    Ok(())
}

#[test]
fn test_catalog_tables_become_known() -> Result<(), Box<dyn std::error::Error>> {
    let (_dir, db) = temp_db()?;
    db.execute_sql(
        "CREATE TABLE clientes (id INTEGER PRIMARY KEY, nombre TEXT, saldo REAL);",
        true,
    )?;
    db.execute_sql("INSERT INTO clientes (nombre, saldo) VALUES ('Rosa', 250.5);", true)?;

    let engine = EngineBuilder::new().catalog(db.catalog()?).build()?;
    let sql = engine.compile("Mostrar los clientes con saldo mayor a 100");
    assert_eq!(sql, "SELECT * FROM clientes WHERE saldo > 100;");

    let out = db.execute_sql(&sql, false)?;
    assert_eq!(out.columns, vec!["id", "nombre", "saldo"]);
    assert_eq!(out.rows, vec![vec![json!(1), json!("Rosa"), json!(250.5)]]);
    Ok(())
}

#[test]
fn test_read_only_execution_rejects_writes() -> Result<(), Box<dyn std::error::Error>> {
    let (_dir, db) = temp_db()?;
    let engine = Nl2SqlEngine::new("es", false, "protected")?;
    let err = db
        .execute_sql(&engine.compile(DEMO_QUERIES[0]), false)
        .unwrap_err();
    assert!(matches!(err, Nl2SqlError::WriteNotAllowed));
    assert!(db.list_tables()?.is_empty());
    Ok(())
}

#[tokio::test]
async fn test_api_refreshes_engine_after_ddl() -> Result<(), Box<dyn std::error::Error>> {
    let (_dir, db) = temp_db()?;
    let state = ApiState::with_database(db, Settings::default())?;

    let body = r#"{"sql":"CREATE TABLE pedidos (id INTEGER PRIMARY KEY, cliente TEXT, importe REAL);","allow_write":true}"#;
    let request = format!(
        "POST /execute_sql HTTP/1.1\r\nContent-Length: {}\r\n\r\n{}",
        body.len(),
        body
    );
    assert!(handle_request(&state, &request).await.starts_with("HTTP/1.1 200"));

    let body = r#"{"nl":"Mostrar los pedidos con importe menor a 20"}"#;
    let request = format!(
        "POST /compile HTTP/1.1\r\nContent-Length: {}\r\n\r\n{}",
        body.len(),
        body
    );
    let response = handle_request(&state, &request).await;
    assert!(response.contains("SELECT * FROM pedidos WHERE importe < 20;"));

    let response = handle_request(&state, "GET /describe/pedidos HTTP/1.1\r\n\r\n").await;
    assert!(response.starts_with("HTTP/1.1 200"));
    assert!(response.contains("\"cliente\""));
    Ok(())
}
