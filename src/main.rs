use std::sync::Arc;

use anyhow::Result;
use chrono::Utc;
use chrono_tz::America::New_York;
use dotenv::dotenv;
use tracing::{error, info};

use earnings_board::config::AppConfig;
use earnings_board::service::calendar::selector::{selectable_weeks, SelectorConfig};
use earnings_board::service::calendar::{bucket_by_week, render};
use earnings_board::service::datasource::http::{HttpApiClient, HttpApiConfig};
use earnings_board::service::datasource::EntriesSource;
use earnings_board::service::favorites::local_store::LocalFavoritesStore;
use earnings_board::service::favorites::sync::SessionSync;
use earnings_board::service::favorites::FavoritesReconciler;

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();
    tracing_subscriber::fmt::init();

    let config = AppConfig::from_env()?;

    let client = Arc::new(HttpApiClient::new(HttpApiConfig {
        base_url: config.api_base_url.clone(),
        bearer_token: config.api_bearer.clone(),
        timeout: config.http_timeout,
    })?);

    let local = LocalFavoritesStore::new(&config.favorites_path);
    let mut reconciler = FavoritesReconciler::new(local, client.clone());
    let mut sync = SessionSync::new(client.clone(), client.clone());

    if let Some(identity) = &config.identity {
        info!("Identity established: {identity}");
        sync.on_identity_established(identity, &mut reconciler).await;
    }

    // Fetch failures degrade to an empty calendar instead of crashing.
    let entries = match client.fetch_entries(config.identity.as_deref()).await {
        Ok(entries) => entries,
        Err(err) => {
            error!("Failed to fetch earnings entries: {err}");
            Vec::new()
        }
    };

    let weeks = bucket_by_week(entries);

    let today = Utc::now().with_timezone(&New_York).date_naive();
    let keys = selectable_weeks(
        &weeks,
        today,
        &SelectorConfig {
            show_last_week: config.show_last_week,
        },
    );

    if keys.is_empty() {
        println!("No upcoming earnings.");
        return Ok(());
    }

    for key in keys {
        if let Some(bucket) = weeks.get(&key) {
            println!("{}\n", render::format_week(key, bucket, reconciler.favorites()));
        }
    }

    Ok(())
}
