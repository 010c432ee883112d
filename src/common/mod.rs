pub mod cache;
pub mod error;
pub mod extract;
pub mod response;
pub mod retry;
pub mod security;
pub mod upload;
