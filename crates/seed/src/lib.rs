//! The database seeding pipeline.
//!
//! Creates the dashboard tables and fills them with fixed seed data. Every
//! step is idempotent, so the pipeline can be re-run against a seeded
//! database without duplicating rows.

pub mod data;
pub mod error;
pub mod hasher;
pub mod mock;
pub mod seeder;

pub use data::SeedData;
pub use error::{HashError, RecordFailure, SeedError};
pub use hasher::{Argon2Hasher, PasswordHasher};
pub use seeder::{SeedReport, Seeder, TableReport};
