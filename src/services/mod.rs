// src/services/mod.rs

pub mod grading;
pub mod reporting;
pub mod scoring;
pub mod submissions;
pub mod uploads;
