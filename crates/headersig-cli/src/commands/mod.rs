//! Command handlers

pub mod aggregate;
pub mod combine;
pub mod sign;
pub mod wallet;
