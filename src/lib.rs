//! Swipe onboarding: multi-step intake wizard and submission dispatcher.

pub mod config;
pub mod dispatch;
pub mod error;
pub mod form;
pub mod routes;
