// src/lib.rs

pub mod cli;
pub mod config;
pub mod csv_io;
pub mod employee_service;
pub mod error;
pub mod events;
pub mod middleware;
pub mod models;
pub mod projection;
pub mod query;
pub mod rate_limit;
pub mod snapshot;
pub mod store;
pub mod web;
