pub mod aggregates;
pub mod handlers;
pub mod repo;
pub mod validation;
