// src/models/mod.rs

pub mod attempt;
pub mod paper;
pub mod user;
