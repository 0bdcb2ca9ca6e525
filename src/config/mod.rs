// ==========================================
// SiteTrak - Configuration Layer
// ==========================================
// Responsibility: runtime configuration for the import pipeline
// Storage: config_kv table
// ==========================================

pub mod config_manager;
pub mod import_config_trait;

// Re-export the core configuration surface
pub use config_manager::{config_keys, ConfigManager};
pub use import_config_trait::ImportConfigReader;
