pub mod bridge;
pub mod chat_state;
pub mod error;
pub mod realtime;
pub mod sync_service;
