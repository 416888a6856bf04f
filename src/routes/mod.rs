//! HTTP route handlers

pub mod auth;
pub mod catalog;
pub mod health;
