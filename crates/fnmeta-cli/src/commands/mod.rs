pub mod aggregate;
pub mod config;
pub mod generate;
pub mod hash;
pub mod validate;
