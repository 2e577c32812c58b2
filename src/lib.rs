//! folio - Multilingual portfolio backend
//!
//! This library provides the REST API behind a personal portfolio site:
//! blog, projects, resume, contacts and skills, each translated into
//! English, Russian and Uzbek, plus an authenticated admin API.

pub mod api;
pub mod config;
pub mod db;
pub mod models;
pub mod services;
