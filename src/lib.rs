//! # Membership API Library
//!
//! This library provides the core functionality for the Membership API
//! service: registration intake and review workflows, the organization
//! reassignment workflow, and the supporting HTTP surface.

pub mod approval;
pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod identity;
pub mod mail;
pub mod models;
pub mod reassignment;
pub mod repositories;
pub mod server;
pub mod telemetry;
pub use migration;
