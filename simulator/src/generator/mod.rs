pub mod input;
pub mod profile;
