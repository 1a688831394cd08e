pub mod auth;
pub mod bridge;
pub mod chats;
pub mod messages;
pub mod realtime;
pub mod users;
