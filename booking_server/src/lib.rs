//! # Booking management server
//! This crate hosts the HTTP surface of the booking management system. It is responsible for:
//! Authenticating staff with email/password credentials and issuing access tokens.
//! Resolving the identity behind every `/api` request, including identities issued by an
//! external provider, and enforcing role and permission guards on the resource routes.
//! Exposing the store, staff, customer, booking and role operations of
//! [`booking_engine`] over REST.
//!
//! ## Configuration
//! The server is configured via environment variables. See [config](config/index.html) for more information.
//!
//! ## Routes
//! The server exposes the following routes:
//! * `/health`: A health check route that returns a 200 OK response.
//! * `/auth/*`: Login, logout and the password reset flow.
//! * `/api/*`: The guarded resource surface. See [routes](routes/index.html).

pub mod auth;
pub mod cli;
pub mod config;
pub mod data_objects;
pub mod errors;

pub mod middleware;
pub mod routes;
pub mod server;

#[cfg(test)]
mod endpoint_tests;
