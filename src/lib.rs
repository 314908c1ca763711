pub mod config;
pub mod function;
pub mod relay;
pub mod routes;
pub mod types;
