pub mod errors;
pub mod target;
