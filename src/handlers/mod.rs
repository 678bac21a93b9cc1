// src/handlers/mod.rs

pub mod admin;
pub mod auth;
pub mod papers;
pub mod results;
pub mod submissions;
