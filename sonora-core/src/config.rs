//! Centralized configuration for Sonora.
//!
//! All tunable parameters and settings are defined here to avoid
//! hard-coded values scattered throughout the codebase.

use std::net::{Ipv4Addr, SocketAddr};
use std::path::PathBuf;

/// Central configuration for all Sonora components.
///
/// Supports environment variable overrides for runtime customization.
#[derive(Debug, Clone, Default)]
pub struct SonoraConfig {
    pub server: ServerConfig,
    pub storage: StorageConfig,
}

/// HTTP server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address the API server listens on
    pub bind_addr: SocketAddr,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from((Ipv4Addr::LOCALHOST, 3000)),
        }
    }
}

/// Catalog and media storage configuration.
#[derive(Debug, Clone)]
pub struct StorageConfig {
    /// Directory catalog storage paths are relative to
    pub media_root: PathBuf,
    /// JSON catalog manifest to load at startup
    pub catalog_path: Option<PathBuf>,
    /// Upper bound on bytes read from disk per body chunk
    pub read_buffer_size: usize,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            media_root: PathBuf::from("."),
            catalog_path: None,
            read_buffer_size: 65536, // 64 KiB
        }
    }
}

impl SonoraConfig {
    /// Creates configuration with environment variable overrides.
    ///
    /// Unparseable values are ignored and the default is kept.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(addr) = std::env::var("SONORA_BIND_ADDR")
            && let Ok(addr) = addr.parse::<SocketAddr>()
        {
            config.server.bind_addr = addr;
        }

        if let Ok(root) = std::env::var("SONORA_MEDIA_ROOT") {
            config.storage.media_root = PathBuf::from(root);
        }

        if let Ok(catalog) = std::env::var("SONORA_CATALOG") {
            config.storage.catalog_path = Some(PathBuf::from(catalog));
        }

        if let Ok(size) = std::env::var("SONORA_READ_BUFFER_SIZE")
            && let Ok(bytes) = size.parse::<usize>()
            && bytes > 0
        {
            config.storage.read_buffer_size = bytes;
        }

        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_values() {
        let config = SonoraConfig::default();

        assert_eq!(config.server.bind_addr.to_string(), "127.0.0.1:3000");
        assert_eq!(config.storage.media_root, PathBuf::from("."));
        assert_eq!(config.storage.catalog_path, None);
        assert_eq!(config.storage.read_buffer_size, 65536);
    }

    #[test]
    fn test_env_override() {
        unsafe {
            std::env::set_var("SONORA_BIND_ADDR", "0.0.0.0:8080");
            std::env::set_var("SONORA_MEDIA_ROOT", "/srv/media");
            std::env::set_var("SONORA_CATALOG", "/srv/catalog.json");
            std::env::set_var("SONORA_READ_BUFFER_SIZE", "not-a-number");
        }

        let config = SonoraConfig::from_env();

        assert_eq!(config.server.bind_addr.port(), 8080);
        assert_eq!(config.storage.media_root, PathBuf::from("/srv/media"));
        assert_eq!(
            config.storage.catalog_path,
            Some(PathBuf::from("/srv/catalog.json"))
        );
        assert_eq!(config.storage.read_buffer_size, 65536);

        // Cleanup
        unsafe {
            std::env::remove_var("SONORA_BIND_ADDR");
            std::env::remove_var("SONORA_MEDIA_ROOT");
            std::env::remove_var("SONORA_CATALOG");
            std::env::remove_var("SONORA_READ_BUFFER_SIZE");
        }
    }
}
