use thiserror::Error;

#[derive(Error, Debug)]
pub enum Nl2SqlError {
    #[error("texto vacío")]
    EmptyInput,

    #[error("idioma no soportado: {0}")]
    UnsupportedLanguage(String),

    #[error("modo de reducción desconocido: {0}")]
    UnknownReductionMode(String),

    #[error("no se identificó la tabla para {0}")]
    MissingTable(String),

    #[error("no se identificaron columnas: {0}")]
    MissingColumns(String),

    #[error("falta un valor: {0}")]
    MissingValue(String),

    #[error("condición ambigua: {0}")]
    AmbiguousCondition(String),

    #[error("operación insegura: {0}")]
    UnsafeStatement(String),

    #[error("SQL inválido: {0}")]
    InvalidSql(String),

    #[error("error de ontología: {0}")]
    Ontology(String),

    #[error("error de base de datos: {0}")]
    Database(String),

    #[error("la sentencia modifica datos y allow_write está desactivado")]
    WriteNotAllowed,

    #[error("error de configuración: {0}")]
    Config(String),

    #[error("error interno: {0}")]
    Internal(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl From<rusqlite::Error> for Nl2SqlError {
    fn from(err: rusqlite::Error) -> Self {
        Nl2SqlError::Database(err.to_string())
    }
}

impl From<sqlparser::parser::ParserError> for Nl2SqlError {
    fn from(err: sqlparser::parser::ParserError) -> Self {
        Nl2SqlError::InvalidSql(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Nl2SqlError>;
