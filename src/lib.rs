pub mod api;
pub mod core;
pub mod prompt;
pub mod results;
pub mod viewer;
