use thiserror::Error;
use uuid::Uuid;

use crate::error::{ErrorMessage, HttpError};

#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("Chat {0} not found")]
    ChatNotFound(Uuid),

    #[error("User {0} not found")]
    UserNotFound(Uuid),

    #[error("Message {0} not found")]
    MessageNotFound(Uuid),

    #[error("chatId not provided")]
    MissingChatId,

    #[error("Invalid chatId: {0}")]
    InvalidChatId(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Bridge error: {0}")]
    Bridge(String),
}

impl From<ServiceError> for HttpError {
    fn from(error: ServiceError) -> Self {
        match error {
            ServiceError::ChatNotFound(_) => HttpError::not_found(ErrorMessage::ChatNotFound.to_string()),
            ServiceError::UserNotFound(_) => HttpError::not_found(ErrorMessage::UserNotFound.to_string()),
            ServiceError::MessageNotFound(_) => {
                HttpError::not_found(ErrorMessage::MessageNotFound.to_string())
            }

            ServiceError::MissingChatId | ServiceError::InvalidChatId(_) => {
                HttpError::bad_request(error.to_string())
            }

            ServiceError::Database(_) | ServiceError::Bridge(_) => {
                HttpError::server_error(error.to_string())
            }
        }
    }
}
