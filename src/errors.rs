// Copyright (c) 2022 Unfolded Circle ApS, Markus Zehnder <markus.z@unfoldedcircle.com>
// SPDX-License-Identifier: MPL-2.0

//! Custom application error with conversions from actix and vendor API errors.

use crate::vendor::ApiError;
use actix::MailboxError;
use derive_more::Display;

#[derive(Debug, Display, PartialEq)]
pub enum ServiceError {
    #[display("Internal server error: {_0}")]
    InternalServerError(String),

    #[display("BadRequest: {_0}")]
    BadRequest(String),

    #[display("Not found: {_0}")]
    NotFound(String),

    /// The account could not be reached, setup should be retried later.
    #[display("Not ready: {_0}")]
    NotReady(String),

    #[display("Authentication failed")]
    AuthenticationFailed,

    #[display("Error communicating with API: {_0}")]
    UpdateFailed(String),

    ServiceUnavailable(String),
}

impl From<MailboxError> for ServiceError {
    fn from(e: MailboxError) -> Self {
        ServiceError::InternalServerError(format!("Internal message error: {:?}", e))
    }
}

impl From<ApiError> for ServiceError {
    fn from(e: ApiError) -> Self {
        match e {
            ApiError::Connection(msg) => ServiceError::NotReady(msg),
            ApiError::AuthenticationFailed => ServiceError::AuthenticationFailed,
            ApiError::PermissionDenied(msg) => ServiceError::ServiceUnavailable(msg),
        }
    }
}
