//! Fetch the Steam app list and print how many apps it contains
//!
//! ```sh
//! STEAM_API_KEY=... cargo run --example app_list
//! ```

use steamy::{Settings, Steam};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("steamy=info")),
        )
        .init();

    let steam = Steam::new(steamy::Credentials::from_env(), Settings::from_env()?)?;
    let session = steam.session()?;

    let info = session.api_key_info().await;
    println!("{}", serde_json::to_string_pretty(&info)?);

    let body = session
        .get("ISteamApps", "GetAppList", "v2", &steamy::Params::new())
        .await?;
    let count = body["applist"]["apps"].as_array().map_or(0, Vec::len);
    println!("Steam lists {count} applications");
    Ok(())
}
