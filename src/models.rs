pub mod usermodel;
pub mod chatmodel;
pub mod messagemodel;
