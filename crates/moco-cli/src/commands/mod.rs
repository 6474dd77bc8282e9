//! Command handlers

pub mod article;
pub mod auth;
pub mod config;
pub mod sync;
