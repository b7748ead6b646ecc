//! studytrack - learning-tracker backend
//!
//! Topics and categories seeded from a JSON catalog, users, study progress and
//! study sessions, persisted as JSON documents keyed by collection and id.

pub mod api;
pub mod config;
pub mod db;
pub mod models;
pub mod services;
