use core_lib::{AppIdentity, TokenEndpoints};
use meta::{yesterday, MetaProvider, Record, TokenLifecycle};
use serde_json::Value;
use store::EnvFileStore;

const CONFIG_PATH: &str = "config.env";
const TOKEN_KEY: &str = "ACCESS_TOKEN_META";

fn field(record: &Record, name: &str) -> String {
    match record.get(name) {
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
        None => "-".to_string(),
    }
}

/// Picks the id of the first record in a listing, logging when the
/// listing came back empty.
fn first_id<'a>(records: &'a [Record], id_field: &str, what: &str) -> Option<&'a str> {
    let id = records
        .first()
        .and_then(|r| r.get(id_field))
        .and_then(Value::as_str);
    if id.is_none() {
        log::warn!("no {what} available, stopping here");
    }
    id
}

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    dotenv::from_path(CONFIG_PATH).ok();

    let (app_id, app_secret) = match (
        std::env::var("META_APP_ID"),
        std::env::var("META_APP_SECRET"),
    ) {
        (Ok(id), Ok(secret)) => (id, secret),
        _ => {
            log::error!("META_APP_ID / META_APP_SECRET not set in {CONFIG_PATH}");
            return;
        }
    };

    let provider = MetaProvider::new();
    let lifecycle = TokenLifecycle::new(
        provider.clone(),
        EnvFileStore::new(CONFIG_PATH),
        TOKEN_KEY,
        AppIdentity::new(app_id, app_secret),
    );

    // Without a usable credential none of the reads below may run.
    let credential = match lifecycle.ensure_valid_credential().await {
        Ok(credential) => credential,
        Err(err) => {
            log::error!("no usable credential: {err}");
            return;
        }
    };

    match provider.whoami(&credential.value).await {
        Ok(id) => log::info!("authenticated as {id}"),
        Err(err) => log::warn!("identity probe failed: {err}"),
    }

    // Each read degrades to an empty listing rather than aborting the run.
    let accounts = provider
        .list_ad_accounts(&credential.value)
        .await
        .unwrap_or_else(|err| {
            log::warn!("account listing failed: {err}");
            Vec::new()
        });
    println!("# Ad accounts");
    for (i, account) in accounts.iter().enumerate() {
        println!(
            "> [{i}] Account ID: {}, Name: {}",
            field(account, "account_id"),
            field(account, "name")
        );
    }

    let Some(account_id) = first_id(&accounts, "account_id", "ad accounts") else {
        return;
    };

    let campaigns = provider
        .list_campaigns(&credential.value, account_id)
        .await
        .unwrap_or_else(|err| {
            log::warn!("campaign listing failed: {err}");
            Vec::new()
        });
    println!("# Campaigns for account {account_id}");
    for (i, campaign) in campaigns.iter().enumerate() {
        println!(
            "> [{i}] Campaign ID: {}, Name: {}, Status: {}, Effective Status: {}, Objective: {}",
            field(campaign, "id"),
            field(campaign, "name"),
            field(campaign, "status"),
            field(campaign, "effective_status"),
            field(campaign, "objective")
        );
    }

    let Some(campaign_id) = first_id(&campaigns, "id", "campaigns") else {
        return;
    };

    let ads = provider
        .list_ads(&credential.value, campaign_id)
        .await
        .unwrap_or_else(|err| {
            log::warn!("ad listing failed: {err}");
            Vec::new()
        });
    println!("# Ads for campaign {campaign_id}");
    for (i, ad) in ads.iter().enumerate() {
        println!(
            "> [{i}] Ad ID: {}, Name: {}, Status: {}",
            field(ad, "id"),
            field(ad, "name"),
            field(ad, "status")
        );
    }

    let Some(ad_id) = first_id(&ads, "id", "ads") else {
        return;
    };

    let window = yesterday();
    let records = provider
        .ad_insights(&credential.value, ad_id, &window, &window)
        .await
        .unwrap_or_else(|err| {
            log::warn!("insight read failed: {err}");
            Vec::new()
        });

    match stats::to_table(&records) {
        Ok(table) => {
            println!("# Insights for ad {ad_id} ({window})");
            println!("{}", table.columns.join(" | "));
            for row in &table.rows {
                let cells: Vec<String> = table
                    .columns
                    .iter()
                    .map(|column| match row.get(column) {
                        Some(Value::String(s)) => s.clone(),
                        Some(other) => other.to_string(),
                        None => "-".to_string(),
                    })
                    .collect();
                println!("{}", cells.join(" | "));
            }
        }
        Err(err) => log::warn!("no insights to tabulate for ad {ad_id}: {err}"),
    }
}
