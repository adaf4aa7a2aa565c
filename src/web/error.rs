use std::sync::Arc;

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use strum_macros::AsRefStr;

use crate::store;

pub type WebResult<T> = core::result::Result<T, Error>;

#[derive(Debug, AsRefStr, thiserror::Error)]
pub enum Error {
    #[error("request body rejected: {0}")]
    BodyRejected(#[from] JsonRejection),
    #[error("data parsing error: {0}")]
    DataParsing(#[from] super::types::DataParsingError),

    #[error("row store error: {0}")]
    Store(#[from] store::Error),
}

impl Error {
    pub fn status_code_and_client_error(&self) -> (StatusCode, ClientError) {
        use ClientError::*;

        match self {
            Error::BodyRejected(rejection) => (
                StatusCode::BAD_REQUEST,
                InvalidBody(rejection.body_text()),
            ),
            Error::DataParsing(data_er) => {
                (StatusCode::BAD_REQUEST, InvalidInput(data_er.to_string()))
            }
            Error::Store(store::Error::UniqueViolation(_)) => {
                (StatusCode::CONFLICT, AlreadySubscribed)
            }
            Error::Store(store::Error::Rejected { message, .. }) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                DatabaseError(message.clone()),
            ),
            Error::Store(_) => (StatusCode::INTERNAL_SERVER_ERROR, ServiceError),
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        tracing::debug!("{:<12} - into_response(Error: {self:?})", "INTO_RESP");

        // Construct a response
        let mut res = StatusCode::INTERNAL_SERVER_ERROR.into_response();

        // Insert the Error into response so that it can be retrieved later.
        res.extensions_mut().insert(Arc::new(self));

        res
    }
}

/// The error as the client gets to see it.
#[derive(Debug, AsRefStr, derive_more::Display)]
pub enum ClientError {
    #[display("Invalid request body")]
    InvalidBody(String),
    #[display("{_0}")]
    InvalidInput(String),
    #[display("This email or phone number is already subscribed")]
    AlreadySubscribed,
    #[display("Database error")]
    DatabaseError(String),
    #[display("Unexpected server error")]
    ServiceError,
}

impl ClientError {
    /// Extra information for the client, if there is any worth sending.
    pub fn details(&self) -> Option<&str> {
        match self {
            ClientError::InvalidBody(details) | ClientError::DatabaseError(details) => {
                Some(details)
            }
            _ => None,
        }
    }

    pub fn body(&self) -> ClientErrorBody<'_> {
        ClientErrorBody {
            success: false,
            message: self.to_string(),
            details: self.details(),
        }
    }
}

/// `{ "success": false, "message": .., "details": .. }`
#[derive(Debug, Serialize)]
pub struct ClientErrorBody<'a> {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<&'a str>,
}
