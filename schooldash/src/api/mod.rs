//! HTTP layer: page handlers, form models and request middleware.
//!
//! - **[`handlers`]**: Axum handlers for the dashboard, the four record pages and static assets
//! - **[`models`]**: Query strings, form bodies and the view rows templates render
//! - **[`middleware`]**: Resolves the database connection before a page handler runs
//!
//! # Page Structure
//!
//! Every record page (`/students`, `/teachers`, `/classes`, `/announcements`) follows one pattern:
//!
//! - `GET /{page}` lists records with search, category filter and sort, and the add/edit form
//! - `POST /{page}/add` and `POST /{page}/update/{id}` redirect back to the list on success, or
//!   re-render it with a message and the submitted values on failure
//! - `POST /{page}/delete/{id}` always redirects back to the list

pub mod handlers;
pub mod middleware;
pub mod models;
