pub mod auth;
pub mod compositor;
pub mod jobs;
pub mod storage;
pub mod variants;
