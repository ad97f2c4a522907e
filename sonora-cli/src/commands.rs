//! CLI command implementations

use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::{Context, bail};
use clap::Subcommand;
use sonora_core::SonoraConfig;
use sonora_core::catalog::{CatalogManifest, check_integrity};
use sonora_core::storage::LocalMediaStorage;
use tracing::info;

/// Available CLI commands
#[derive(Subcommand)]
pub enum Commands {
    /// Start the streaming server
    Serve {
        /// Catalog manifest (JSON)
        #[arg(long)]
        catalog: Option<PathBuf>,
        /// Directory catalog storage paths are relative to
        #[arg(long)]
        media_root: Option<PathBuf>,
        /// Host to bind to
        #[arg(long)]
        host: Option<String>,
        /// Port to bind to
        #[arg(short, long)]
        port: Option<u16>,
    },
    /// Check that every catalogued encoding exists in media storage
    Verify {
        /// Catalog manifest (JSON)
        #[arg(long)]
        catalog: PathBuf,
        /// Directory catalog storage paths are relative to
        #[arg(long)]
        media_root: Option<PathBuf>,
    },
}

/// Handle the CLI command
///
/// # Errors
/// Returns the failure of the command that ran
pub async fn handle_command(command: Commands) -> anyhow::Result<()> {
    match command {
        Commands::Serve {
            catalog,
            media_root,
            host,
            port,
        } => serve(catalog, media_root, host, port).await,
        Commands::Verify {
            catalog,
            media_root,
        } => verify(catalog, media_root).await,
    }
}

/// Start the server; flags override environment, environment overrides defaults
async fn serve(
    catalog: Option<PathBuf>,
    media_root: Option<PathBuf>,
    host: Option<String>,
    port: Option<u16>,
) -> anyhow::Result<()> {
    let config = apply_serve_flags(SonoraConfig::from_env(), catalog, media_root, host, port)?;

    sonora_web::run_server(config).await.map_err(|e| {
        let message = e.user_message();
        anyhow::Error::new(e).context(message)
    })
}

/// Layers the `serve` flags over `config`. A host without a port keeps the
/// configured port.
fn apply_serve_flags(
    mut config: SonoraConfig,
    catalog: Option<PathBuf>,
    media_root: Option<PathBuf>,
    host: Option<String>,
    port: Option<u16>,
) -> anyhow::Result<SonoraConfig> {
    if let Some(catalog) = catalog {
        config.storage.catalog_path = Some(catalog);
    }
    if let Some(root) = media_root {
        config.storage.media_root = root;
    }
    if let Some(host) = host {
        let port = port.unwrap_or(config.server.bind_addr.port());
        config.server.bind_addr = format!("{host}:{port}")
            .parse::<SocketAddr>()
            .with_context(|| format!("invalid bind address {host}:{port}"))?;
    } else if let Some(port) = port {
        config.server.bind_addr.set_port(port);
    }

    Ok(config)
}

/// Report every catalogued encoding missing from storage
async fn verify(catalog: PathBuf, media_root: Option<PathBuf>) -> anyhow::Result<()> {
    let config = SonoraConfig::from_env();
    let media_root = media_root.unwrap_or(config.storage.media_root);

    let manifest = CatalogManifest::load(&catalog)
        .await
        .with_context(|| format!("could not load catalog {}", catalog.display()))?;
    let (catalog, _accounts) = manifest.into_stores()?;
    let storage = LocalMediaStorage::new(media_root, config.storage.read_buffer_size);

    let report = check_integrity(&catalog, &storage).await;

    for song_id in &report.without_variants {
        println!("{song_id}: no stored encoding");
    }
    for missing in &report.missing {
        println!(
            "{}: {} encoding missing at {} ({})",
            missing.asset_id,
            missing.tier,
            missing.storage_path.display(),
            missing.error
        );
    }

    info!(
        "Verified {} encodings under {}",
        report.verified,
        storage.root().display()
    );

    if !report.is_consistent() {
        bail!("{} catalogued encodings missing from storage", report.missing.len());
    }

    println!("Catalog consistent: {} encodings present", report.verified);
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;

    fn base_config() -> SonoraConfig {
        let mut config = SonoraConfig::default();
        config.server.bind_addr = "10.0.0.5:4000".parse().unwrap();
        config.storage.media_root = PathBuf::from("/env/media");
        config.storage.catalog_path = Some(PathBuf::from("/env/catalog.json"));
        config
    }

    #[test]
    fn test_no_flags_keep_environment() {
        let config = apply_serve_flags(base_config(), None, None, None, None).unwrap();

        assert_eq!(config.server.bind_addr.to_string(), "10.0.0.5:4000");
        assert_eq!(config.storage.media_root, PathBuf::from("/env/media"));
        assert_eq!(
            config.storage.catalog_path,
            Some(PathBuf::from("/env/catalog.json"))
        );
    }

    #[test]
    fn test_flags_override_environment() {
        let config = apply_serve_flags(
            base_config(),
            Some(PathBuf::from("cli.json")),
            Some(PathBuf::from("cli-media")),
            None,
            None,
        )
        .unwrap();

        assert_eq!(config.storage.catalog_path, Some(PathBuf::from("cli.json")));
        assert_eq!(config.storage.media_root, PathBuf::from("cli-media"));
    }

    #[test]
    fn test_bind_address_flags() {
        let port_only = apply_serve_flags(base_config(), None, None, None, Some(9000)).unwrap();
        assert_eq!(port_only.server.bind_addr.to_string(), "10.0.0.5:9000");

        let host_only =
            apply_serve_flags(base_config(), None, None, Some("0.0.0.0".to_string()), None)
                .unwrap();
        assert_eq!(host_only.server.bind_addr.to_string(), "0.0.0.0:4000");

        let both = apply_serve_flags(
            base_config(),
            None,
            None,
            Some("127.0.0.1".to_string()),
            Some(8080),
        )
        .unwrap();
        assert_eq!(both.server.bind_addr.to_string(), "127.0.0.1:8080");
    }

    #[test]
    fn test_invalid_host_rejected() {
        let result = apply_serve_flags(
            base_config(),
            None,
            None,
            Some("not a host".to_string()),
            Some(8080),
        );
        assert!(result.is_err());
    }

    fn write_library(present: &[&str]) -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("catalog.json"),
            r#"{
                "songs": [
                    { "id": "s1", "title": "One", "duration": 10, "artist": "a1",
                      "file_path": "s1.flac", "file_path_lossy": "s1.opus" }
                ],
                "users": [ { "id": "u1", "preference": "flac" } ]
            }"#,
        )
        .unwrap();
        for name in present {
            fs::write(dir.path().join(name), b"audio").unwrap();
        }
        dir
    }

    #[tokio::test]
    async fn test_verify_consistent_catalog() {
        let dir = write_library(&["s1.flac", "s1.opus"]);

        let result = verify(dir.path().join("catalog.json"), Some(dir.path().to_path_buf())).await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_verify_fails_on_missing_encoding() {
        let dir = write_library(&["s1.flac"]);

        let result = verify(dir.path().join("catalog.json"), Some(dir.path().to_path_buf())).await;
        let err = result.unwrap_err();
        assert!(err.to_string().contains("1 catalogued encodings missing"), "{err}");
    }

    #[tokio::test]
    async fn test_verify_missing_catalog() {
        let dir = tempfile::tempdir().unwrap();

        let result = verify(dir.path().join("absent.json"), Some(dir.path().to_path_buf())).await;
        assert!(result.is_err());
    }
}
