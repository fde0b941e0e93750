/// Gallery domain module
///
/// This module owns the client-side data model and the service that
/// mediates between the UI and the backend collaborator:
/// - Shared data structures (data.rs)
/// - Listing, upload and delete flows plus the listing cache (service.rs)

pub mod data;
pub mod service;
