//! Common library for the Vidstream application
//!
//! This crate provides shared functionality used across different services
//! in the Vidstream application, including database connectivity and error
//! handling.

pub mod database;
pub mod error;
