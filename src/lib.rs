pub mod catalog;
pub mod config;
pub mod domain;
pub mod error;
pub mod guard;
pub mod models;
pub mod services;
pub mod store;
