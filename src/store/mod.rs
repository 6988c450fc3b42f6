// Persistence layer: each submodule owns one slice of the schema.

pub mod catalog;
pub mod relations;
pub mod users;
