//! Backend for a small freight brokerage: load listings, driver approval
//! and proof-of-delivery receipts.

pub mod api;
pub mod config;
pub mod database;
pub mod middleware;
pub mod models;
pub mod seeds;
pub mod services;
pub mod session;
pub mod state;
pub mod utils;
