// ==========================================
// SiteTrak - API Layer
// ==========================================
// Responsibility: business API surface for UI and CLI callers
// ==========================================

pub mod error;
pub mod import_api;

// Re-export the core types
pub use error::{ApiError, ApiResult};
pub use import_api::{
    BatchListResponse, ImportApi, ImportApiResponse, MappingPreviewResponse,
};
