//! # domainmap-api
//!
//! [`DomainService`] composes the store and the distance engine into the
//! listing pipeline; [`RestApi`] serves it over HTTP with actix-web.

pub mod rest;
pub mod service;

pub use rest::RestApi;
pub use service::{DomainListing, DomainService};
