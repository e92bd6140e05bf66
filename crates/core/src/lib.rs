//! feedme Core - Shared domain library.
//!
//! This crate provides the domain model used across all feedme components:
//! - `client` - Async REST client, session manager, order tracking workflow
//! - `cli` - Command-line dashboards for admins, providers and customers
//!
//! # Architecture
//!
//! The core crate contains only types and pure logic - no I/O, no HTTP
//! clients. Everything here can be exercised without a backend, which is
//! where the order stage model, meal discovery filtering and the review
//! normalization adapter live.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for IDs, prices, emails, stages and roles
//! - [`order`] - Orders, tracking updates and current-stage resolution
//! - [`meal`] - Meals and provider references
//! - [`review`] - Review records and multi-shape rating normalization
//! - [`discovery`] - Meal filtering and page-window computation
//! - [`stats`] - Dashboard tallies over orders and users
//! - [`user`] - Users, bearer tokens and sessions
//! - [`blog`] - Blog posts and newsletter subscribers

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod blog;
mod de;
pub mod discovery;
pub mod meal;
pub mod order;
pub mod review;
pub mod stats;
pub mod types;
pub mod user;

pub use types::*;
pub use user::{BearerToken, Session, User};
