use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use std::borrow::Cow;

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("Bad Request: {0}")]
    BadRequest(Cow<'static, str>),
    #[error("Not Found: {0}")]
    NotFound(Cow<'static, str>),
    #[error("Conflict: {0}")]
    Conflict(Cow<'static, str>),
    #[error("Internal Server Error")]
    InternalServer,
}

#[derive(serde::Serialize)]
pub struct ErrorBody {
    pub kind: &'static str,
    pub message: Cow<'static, str>,
}

impl Error {
    pub fn bad_request(msg: impl Into<Cow<'static, str>>) -> Self {
        Self::BadRequest(msg.into())
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Error::BadRequest(_) => "INVALID_PARAMETERS",
            Error::NotFound(_) => "NOT_FOUND",
            Error::Conflict(_) => "CONFLICT",
            Error::InternalServer => "INTERNAL",
        }
    }
}

impl ResponseError for Error {
    fn status_code(&self) -> StatusCode {
        match *self {
            Error::BadRequest(_) => StatusCode::BAD_REQUEST,
            Error::NotFound(_) => StatusCode::NOT_FOUND,
            Error::Conflict(_) => StatusCode::CONFLICT,
            Error::InternalServer => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let mut res = HttpResponse::build(self.status_code());

        match self {
            // Has Message
            Error::NotFound(msg) | Error::Conflict(msg) | Error::BadRequest(msg) => {
                res.json(ErrorBody { kind: self.kind(), message: msg.clone() })
            }
            // No Message
            Error::InternalServer => {
                res.json(ErrorBody { kind: self.kind(), message: "Internal Server Error".into() })
            }
        }
    }
}

#[derive(thiserror::Error, Debug)]
pub enum SystemError {
    // sqlx errors
    #[error("Database Error : {0}")]
    DatabaseError(Cow<'static, str>),
    #[error("Migration Error")]
    MigrateError(#[from] sqlx::migrate::MigrateError),
    // unique violation that slipped past an upsert or an in-transaction check
    #[error("Storage Race: {0:?}")]
    StorageRace(Option<DbErrorMeta>),
    // business rule errors
    #[error("Invalid Parameters: {0}")]
    InvalidParameters(Cow<'static, str>),
    #[error("Not Found: {0}")]
    NotFound(Cow<'static, str>),
    #[error("Conflict: {0}")]
    Conflict(Cow<'static, str>),
    #[error("Internal System Error: {0}")]
    InternalError(Box<dyn std::error::Error + Send + Sync>),
}

fn conflict_message(meta: &Option<DbErrorMeta>) -> Cow<'static, str> {
    let Some(m) = meta else {
        return "Duplicate value".into();
    };

    match m.constraint.as_deref() {
        Some("requests_pending_pair_key") => "Request pending".into(),
        Some("relationships_from_to_type_key") => "Relationship already exists".into(),
        _ => "Duplicate value".into(),
    }
}

#[derive(Debug)]
pub struct DbErrorMeta {
    pub constraint: Option<String>,
}

impl From<SystemError> for Error {
    fn from(value: SystemError) -> Self {
        match value {
            SystemError::InvalidParameters(msg) => Error::BadRequest(msg),
            SystemError::NotFound(msg) => Error::NotFound(msg),
            SystemError::Conflict(msg) => Error::Conflict(msg),
            SystemError::StorageRace(meta) => Error::Conflict(conflict_message(&meta)),
            _ => {
                tracing::error!("Internal Server Error: {:?}", value);
                Error::InternalServer
            }
        }
    }
}

impl From<sqlx::Error> for SystemError {
    fn from(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db_err) = &err {
            return match db_err.code().as_deref() {
                Some("23505") => SystemError::StorageRace(Some(DbErrorMeta {
                    constraint: db_err.constraint().map(|s| s.to_string()),
                })),
                _ => {
                    tracing::error!("Unhandled DB error: {:?}", db_err);
                    SystemError::DatabaseError(db_err.message().to_string().into())
                }
            };
        }
        tracing::error!("{:?}", err);
        SystemError::InternalError(Box::new(err))
    }
}

impl SystemError {
    pub fn invalid_parameters(msg: impl Into<Cow<'static, str>>) -> Self {
        Self::InvalidParameters(msg.into())
    }

    pub fn not_found(msg: impl Into<Cow<'static, str>>) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn conflict(msg: impl Into<Cow<'static, str>>) -> Self {
        Self::Conflict(msg.into())
    }

    /// True when a unique violation came from the given constraint.
    pub fn is_race_on(&self, constraint: &str) -> bool {
        matches!(
            self,
            SystemError::StorageRace(Some(DbErrorMeta { constraint: Some(c) })) if c == constraint
        )
    }
}
