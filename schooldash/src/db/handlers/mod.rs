//! Repository implementations for database access.
//!
//! Each repository wraps a `&mut PgConnection` (a pooled connection or an open transaction) and
//! implements the [`Repository`] trait for its table, plus the aggregates its list page shows.
//!
//! # Available Repositories
//!
//! - [`Students`], [`Teachers`], [`Classes`], [`Announcements`]: per-table CRUD and listing
//! - [`Seats`]: capacity-aware seat allocation on `classes`
//! - [`uniqueness`]: case-insensitive duplicate checks on identifying fields
//!
//! # Common Pattern
//!
//! ```ignore
//! use schooldash::db::handlers::{Repository, Students};
//!
//! let mut conn = pool.acquire().await?;
//! let mut repo = Students::new(&mut conn);
//! let students = repo.list(&filter).await?;
//! ```

pub mod announcements;
pub mod classes;
pub mod repository;
pub mod seats;
pub mod students;
pub mod teachers;
pub mod uniqueness;

pub use announcements::Announcements;
pub use classes::Classes;
pub use repository::Repository;
pub use seats::Seats;
pub use students::Students;
pub use teachers::Teachers;
pub use uniqueness::UniqueField;
