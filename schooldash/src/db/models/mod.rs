//! Database record models matching table schemas.
//!
//! Each entity has a create request, an update request and a response type. Responses derive
//! `sqlx::FromRow` and are what repositories return; the API layer converts them into view rows.
//!
//! - [`students`]: enrolled students and the class whose seat they hold
//! - [`teachers`]: teaching staff
//! - [`classes`]: classes with a seat capacity
//! - [`announcements`]: notices, events, campaigns and reminders

pub mod announcements;
pub mod classes;
pub mod students;
pub mod teachers;
