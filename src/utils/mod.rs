// src/utils/mod.rs

pub mod credentials;
pub mod extract;
pub mod hash;
pub mod html;
pub mod jwt;
