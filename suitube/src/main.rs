use anyhow::Result;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("suitube=info,tube_axum=info,tower_http=info")),
        )
        .init();

    let ax = suitube::build().await?;

    let host = ax
        .app
        .get("http.host")
        .unwrap_or_else(|| "127.0.0.1".to_string());

    let port = ax.app.get("http.port").unwrap_or_else(|| "3001".to_string());

    let addr = format!("{host}:{port}");

    tracing::info!(
        network = %ax.app.get("sui.network").unwrap_or_default(),
        "suitube listening on http://{addr}"
    );

    ax.listen(addr).await?;

    Ok(())
}
