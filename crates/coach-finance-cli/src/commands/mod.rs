pub mod investment;
pub mod lending;
