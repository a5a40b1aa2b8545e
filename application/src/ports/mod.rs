//! Port definitions (interfaces to infrastructure and presentation)

pub mod backend_client;
pub mod clock;
