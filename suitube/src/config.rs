use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use anyhow::{anyhow, Result};
use axum::http::{HeaderValue, Method};
use serde_json::Value;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tube_axum::middlewares::MultipartConfig;
use tube_blob::{WalrusConfig, TESTNET_AGGREGATOR, TESTNET_PUBLISHER};
use tube_core::TubeApp;

use crate::services::TubeParams;
use crate::sui::SuiConfig;

/// Populate the app config from the environment. `.env` is loaded by `main`.
pub fn config(app: &TubeApp<Value, TubeParams>) -> Result<()> {
    configure_http(app)?;
    configure_walrus(app)?;
    configure_sui(app)?;
    configure_storage(app)?;
    configure_pagination(app);
    Ok(())
}

fn env_or(key: &str, default: &str) -> String {
    env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| default.to_string())
}

/// Like [`env_or`], but the value must parse as `T`.
fn env_parsed<T: FromStr>(key: &str, default: &str) -> Result<String> {
    let value = env_or(key, default);
    value
        .parse::<T>()
        .map_err(|_| anyhow!("Invalid {key}: {value:?}"))?;
    Ok(value)
}

fn configure_http(app: &TubeApp<Value, TubeParams>) -> Result<()> {
    app.set("http.host", env_or("HTTP_HOST", "127.0.0.1"));
    app.set("http.port", env_parsed::<u16>("PORT", "3001")?);
    app.set("cors.origin", env_or("CORS_ORIGIN", "http://localhost:5173"));
    Ok(())
}

fn configure_walrus(app: &TubeApp<Value, TubeParams>) -> Result<()> {
    app.set(
        "walrus.publisherUrl",
        env_or("WALRUS_PUBLISHER_URL", TESTNET_PUBLISHER),
    );
    app.set(
        "walrus.aggregatorUrl",
        env_or("WALRUS_AGGREGATOR_URL", TESTNET_AGGREGATOR),
    );
    app.set("walrus.epochs", env_parsed::<u32>("WALRUS_EPOCHS", "1")?);
    app.set("walrus.timeoutSecs", env_parsed::<u64>("WALRUS_TIMEOUT_SECS", "300")?);
    Ok(())
}

fn configure_sui(app: &TubeApp<Value, TubeParams>) -> Result<()> {
    let defaults = SuiConfig::default();

    app.set("sui.graphqlUrl", env_or("SUI_GRAPHQL_URL", &defaults.graphql_url));
    app.set("sui.network", env_or("SUI_NETWORK", &defaults.network));
    app.set("sui.packageId", env_or("SUI_PACKAGE_ID", ""));
    app.set("sui.platformId", env_or("SUI_PLATFORM_ID", ""));

    if app.get("sui.packageId").unwrap_or_default().is_empty() {
        tracing::warn!("SUI_PACKAGE_ID is not set, chain reads will return nothing");
    }
    Ok(())
}

fn configure_storage(app: &TubeApp<Value, TubeParams>) -> Result<()> {
    app.set("registry.path", env_or("REGISTRY_PATH", "./data/walrus-videos.json"));
    app.set(
        "upload.dir",
        env_or("UPLOAD_DIR", &env::temp_dir().to_string_lossy()),
    );
    app.set(
        "upload.maxFileSizeMb",
        env_parsed::<u64>("UPLOAD_MAX_FILE_SIZE_MB", "500")?,
    );
    Ok(())
}

fn configure_pagination(app: &TubeApp<Value, TubeParams>) {
    app.set("paginate.default", "50");
    app.set("paginate.max", "100");
}

pub fn walrus_config(app: &TubeApp<Value, TubeParams>) -> WalrusConfig {
    let cfg = app.config_snapshot();
    let mut walrus = WalrusConfig::new()
        .with_timeout(Duration::from_secs(cfg.get_u64("walrus.timeoutSecs").unwrap_or(300)))
        .with_default_epochs(cfg.get_parsed("walrus.epochs").unwrap_or(1));

    if let Some(url) = cfg.get("walrus.publisherUrl") {
        walrus = walrus.with_publisher_url(url);
    }
    if let Some(url) = cfg.get("walrus.aggregatorUrl") {
        walrus = walrus.with_aggregator_url(url);
    }
    walrus
}

pub fn sui_config(app: &TubeApp<Value, TubeParams>) -> SuiConfig {
    let cfg = app.config_snapshot();
    let defaults = SuiConfig::default();

    SuiConfig {
        graphql_url: cfg.get_string("sui.graphqlUrl").unwrap_or(defaults.graphql_url),
        network: cfg.get_string("sui.network").unwrap_or(defaults.network),
        package_id: cfg.get_string("sui.packageId").unwrap_or_default(),
        platform_id: cfg.get_string("sui.platformId").unwrap_or_default(),
        timeout: defaults.timeout,
    }
}

pub fn registry_path(app: &TubeApp<Value, TubeParams>) -> PathBuf {
    app.get("registry.path")
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("./data/walrus-videos.json"))
}

/// `video` and `thumbnail` are streamed to `upload.dir`.
pub fn multipart_config(app: &TubeApp<Value, TubeParams>) -> MultipartConfig {
    let cfg = app.config_snapshot();
    let max_mb = cfg.get_u64("upload.maxFileSizeMb").unwrap_or(500);
    let dir = cfg
        .get("upload.dir")
        .map(PathBuf::from)
        .unwrap_or_else(env::temp_dir);

    MultipartConfig::new()
        .max_file_size(max_mb * 1024 * 1024)
        .file_field("video")
        .file_field("thumbnail")
        .allow_content_type("video/*")
        .allow_content_type("image/*")
        .allow_content_type("application/octet-stream")
        .upload_dir(dir)
}

/// `cors.origin` is a comma separated list; `*` allows any origin.
pub fn cors_layer(app: &TubeApp<Value, TubeParams>) -> CorsLayer {
    let origins = app.get("cors.origin").unwrap_or_default();

    let allow_origin = if origins.split(',').any(|o| o.trim() == "*") {
        AllowOrigin::any()
    } else {
        AllowOrigin::list(
            origins
                .split(',')
                .map(str::trim)
                .filter(|o| !o.is_empty())
                .filter_map(|o| HeaderValue::from_str(o).ok()),
        )
    };

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods([Method::GET, Method::POST, Method::DELETE, Method::OPTIONS])
        .allow_headers(Any)
        .expose_headers([axum::http::header::CONTENT_RANGE, axum::http::header::CONTENT_LENGTH])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn typed_configs_follow_app_values() {
        let app: TubeApp<Value, TubeParams> = TubeApp::new();
        app.set("walrus.publisherUrl", "http://127.0.0.1:9000/");
        app.set("walrus.epochs", "3");
        app.set("sui.packageId", "0xpkg");
        app.set("upload.maxFileSizeMb", "2");
        app.set("upload.dir", "/tmp/suitube-uploads");

        let walrus = walrus_config(&app);
        assert_eq!(walrus.publisher_url, "http://127.0.0.1:9000");
        assert_eq!(walrus.default_epochs, Some(3));
        assert_eq!(walrus.timeout, Duration::from_secs(300));

        let sui = sui_config(&app);
        assert_eq!(sui.package_id, "0xpkg");
        assert!(sui.platform_id.is_empty());

        let multipart = multipart_config(&app);
        assert_eq!(multipart.max_file_size, Some(2 * 1024 * 1024));
        assert_eq!(multipart.upload_dir, PathBuf::from("/tmp/suitube-uploads"));
        assert!(multipart.file_fields.contains("thumbnail"));
    }
}
