pub mod advise;
pub mod auth;
pub mod coach;
pub mod config;
pub mod demo;
pub mod history;
pub mod timer;
