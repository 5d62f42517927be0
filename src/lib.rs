//! Square image job service
//!
//! Accepts an uploaded image on behalf of an authenticated owner, derives the
//! variants requested by the job kind (the untouched original, a square
//! padded to the longer side, and a fixed 256px square), stores them, and
//! serves job metadata and image bytes back to the owner.

pub mod app_state;
pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod routes;
pub mod services;
