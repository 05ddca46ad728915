#![forbid(unsafe_code)]

pub mod repository;
pub mod rest;
pub mod sqlite;

pub use repository::{
    CatalogRepository, EnrollmentRepository, InMemoryRepository, ProgressRepository, Storage,
    StorageError,
};
