pub mod memory;
pub mod objects;
pub mod repository;
pub mod sqlite;
