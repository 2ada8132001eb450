use std::fmt;

use anyhow::anyhow;

use actix_web::{
    HttpResponse,
    ResponseError,
    http::StatusCode
};
use serde_json::json;

use crate::model::EntityId;


#[derive(Debug)]
pub struct Error {
    status_code: StatusCode,
    err: anyhow::Error,
}

impl Error {
    fn internal(err: anyhow::Error) -> Self {
        Self {
            status_code: StatusCode::INTERNAL_SERVER_ERROR,
            err,
        }
    }
    fn not_found(err: anyhow::Error) -> Self {
        Self {
            status_code: StatusCode::NOT_FOUND,
            err
        }
    }
    fn bad_request(err: anyhow::Error) -> Self {
        Self {
            status_code: StatusCode::BAD_REQUEST,
            err
        }
    }
    fn conflict(err: anyhow::Error) -> Self {
        Self {
            status_code: StatusCode::CONFLICT,
            err
        }
    }
}

pub fn entity_not_found(kind: &str, id: EntityId) -> Error {
    Error::not_found(anyhow!("{0} {1} not found", kind, id))
}
pub fn duplicate_entity(kind: &str, existing: EntityId) -> Error {
    Error::conflict(anyhow!("{0} with the same content already exists as {1}", kind, existing))
}
pub fn invalid_request<E: fmt::Display>(err: E) -> Error {
    Error::bad_request(anyhow!("{}", err))
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.err.fmt(f)
    }
}

impl<E: Into<anyhow::Error> + Send> From<E> for Error {
    fn from(err: E) -> Self {
        Self::internal(err.into())
    }
}

impl ResponseError for Error {
    fn status_code(&self) -> StatusCode {
        self.status_code
    }

    fn error_response(&self) -> HttpResponse {
        let status_code = self.status_code();
        if status_code.is_server_error() {
            log::error!("{:#}", self.err);
        }
        HttpResponse::build(status_code).json(json!({
            "error": {
                "message": self.to_string(),
            }
        }))
    }
}
