//! Donation Tracker - fundraising events with hosted checkout and
//! idempotent payment reconciliation.
//!
//! This library provides the HTTP handlers, persistence, payment gateway
//! integration and token handling used by the `donation-tracker` binary.

pub mod config;
pub mod crypto;
pub mod db;
pub mod error;
pub mod extractors;
pub mod handlers;
pub mod id;
pub mod jwt;
pub mod middleware;
pub mod models;
pub mod pagination;
pub mod payments;
pub mod util;
