pub mod config;
pub mod fetch;
pub mod list;
pub mod run;
pub mod upload;
