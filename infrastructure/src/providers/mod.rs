//! Backend client adapters

pub mod openrouter;
