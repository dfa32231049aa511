use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use diesel::result::{DatabaseErrorKind, Error as DieselError};
use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

#[derive(Error, Debug)]
pub(crate) enum ServiceError {
    #[error("{0} not found")]
    NotFound(String),

    #[error("already exists: {0}")]
    Conflict(String),

    #[error("invalid input: {0}")]
    Validation(String),

    #[error("an X-User-Id header is required for this request")]
    Unauthorized,

    #[error("only the owner may change this {0}")]
    Forbidden(&'static str),

    #[error("composition error: {0}")]
    Composition(#[from] crate::composition::CompositionError),

    #[error("stored data is inconsistent: {0}")]
    Integrity(String),

    #[error("database is not responding")]
    Unavailable,

    #[error("configuration error: {0}")]
    Config(String),

    #[error("database error: {0}")]
    Database(DieselError),

    #[error("connection pool error: {0}")]
    Pool(#[from] diesel::r2d2::PoolError),

    #[error("cache error: {0}")]
    Cache(String),

    #[error("blocking task failed")]
    Blocking(#[from] actix_web::error::BlockingError),
}

/// MySQL client messages for a connection that dropped or never came up.
const CONNECTION_LOST: [&str; 3] = [
    "server has gone away",
    "Lost connection to MySQL server",
    "Can't connect to MySQL server",
];

impl ServiceError {
    /// Whether the error means the database itself is unreachable. Only these
    /// are counted against the circuit breaker; a rejected statement is not.
    pub(crate) fn is_outage(&self) -> bool {
        match self {
            ServiceError::Pool(_) => true,
            ServiceError::Database(DieselError::DatabaseError(kind, info)) => match kind {
                DatabaseErrorKind::UnableToSendCommand => true,
                DatabaseErrorKind::UniqueViolation | DatabaseErrorKind::ForeignKeyViolation => {
                    false
                }
                _ => CONNECTION_LOST
                    .iter()
                    .any(|needle| info.message().contains(needle)),
            },
            _ => false,
        }
    }

    fn code(&self) -> &'static str {
        match self {
            ServiceError::NotFound(_) => "RESOURCE_NOT_FOUND",
            ServiceError::Conflict(_) => "RESOURCE_ALREADY_EXISTS",
            ServiceError::Validation(_) => "INVALID_INPUT",
            ServiceError::Unauthorized => "AUTH_REQUIRED",
            ServiceError::Forbidden(_) => "PERMISSION_DENIED",
            ServiceError::Composition(_) => "INVALID_COMPOSITION",
            ServiceError::Integrity(_) => "DATA_INTEGRITY",
            ServiceError::Unavailable => "DATABASE_UNAVAILABLE",
            ServiceError::Config(_) => "CONFIG_ERROR",
            ServiceError::Database(_) => "DATABASE_ERROR",
            ServiceError::Pool(_) => "DATABASE_ERROR",
            ServiceError::Cache(_) => "CACHE_ERROR",
            ServiceError::Blocking(_) => "INTERNAL_ERROR",
        }
    }
}

impl From<DieselError> for ServiceError {
    fn from(error: DieselError) -> Self {
        match error {
            DieselError::NotFound => ServiceError::NotFound("record".to_string()),
            DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, info) => {
                ServiceError::Conflict(info.message().to_string())
            }
            other => ServiceError::Database(other),
        }
    }
}

#[derive(Serialize)]
struct ErrorBody<'a> {
    error: String,
    code: &'a str,
    error_id: Uuid,
}

impl ResponseError for ServiceError {
    fn status_code(&self) -> StatusCode {
        match self {
            ServiceError::NotFound(_) => StatusCode::NOT_FOUND,
            ServiceError::Conflict(_) => StatusCode::CONFLICT,
            ServiceError::Validation(_) => StatusCode::BAD_REQUEST,
            ServiceError::Unauthorized => StatusCode::UNAUTHORIZED,
            ServiceError::Forbidden(_) => StatusCode::FORBIDDEN,
            ServiceError::Composition(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ServiceError::Unavailable => StatusCode::SERVICE_UNAVAILABLE,
            ServiceError::Config(_)
            | ServiceError::Integrity(_)
            | ServiceError::Database(_)
            | ServiceError::Pool(_)
            | ServiceError::Cache(_)
            | ServiceError::Blocking(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let error_id = Uuid::new_v4();
        let status = self.status_code();
        if status.is_server_error() {
            log::error!("request failed [{error_id}]: {self}");
        } else {
            log::debug!("request rejected [{error_id}]: {self}");
        }

        // internals stay in the log
        let error = if status == StatusCode::INTERNAL_SERVER_ERROR {
            "internal server error".to_string()
        } else {
            self.to_string()
        };

        HttpResponse::build(status).json(ErrorBody {
            error,
            code: self.code(),
            error_id,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_codes() {
        assert_eq!(
            ServiceError::NotFound("ingredient".into()).status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ServiceError::Conflict("slug".into()).status_code(),
            StatusCode::CONFLICT
        );
        assert_eq!(ServiceError::Unauthorized.status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            ServiceError::Unavailable.status_code(),
            StatusCode::SERVICE_UNAVAILABLE
        );
    }

    #[test]
    fn diesel_not_found_maps_to_not_found() {
        let error: ServiceError = DieselError::NotFound.into();
        assert!(matches!(error, ServiceError::NotFound(_)));
        assert!(!error.is_outage());
    }

    fn mysql_error(kind: DatabaseErrorKind, message: &str) -> DieselError {
        DieselError::DatabaseError(kind, Box::new(String::from(message)))
    }

    #[test]
    fn duplicate_slug_maps_to_conflict() {
        let error: ServiceError =
            mysql_error(DatabaseErrorKind::UniqueViolation, "Duplicate entry").into();
        assert!(matches!(error, ServiceError::Conflict(_)));
        assert_eq!(error.status_code(), StatusCode::CONFLICT);
        assert_eq!(error.error_response().status(), StatusCode::CONFLICT);
        assert!(!error.is_outage());
    }

    #[test]
    fn only_lost_connections_trip_the_breaker() {
        let gone: ServiceError =
            mysql_error(DatabaseErrorKind::__Unknown, "MySQL server has gone away").into();
        assert!(gone.is_outage());
        let unsent: ServiceError =
            mysql_error(DatabaseErrorKind::UnableToSendCommand, "broken pipe").into();
        assert!(unsent.is_outage());

        let out_of_range: ServiceError = mysql_error(
            DatabaseErrorKind::__Unknown,
            "Out of range value for column 'serving' at row 1",
        )
        .into();
        assert!(matches!(out_of_range, ServiceError::Database(_)));
        assert!(!out_of_range.is_outage());
        let orphan: ServiceError =
            mysql_error(DatabaseErrorKind::ForeignKeyViolation, "Cannot add or update").into();
        assert!(!orphan.is_outage());

        assert!(!ServiceError::Database(DieselError::RollbackTransaction).is_outage());
        assert!(!ServiceError::Validation("bad".into()).is_outage());
        assert!(!ServiceError::Conflict("slug".into()).is_outage());
    }

    #[test]
    fn error_body_hides_internal_details() {
        let response =
            ServiceError::Database(DieselError::RollbackTransaction).error_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
