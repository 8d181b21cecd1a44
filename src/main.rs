//! privacy-compliance CLI

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use privacy_compliance::compliance::{FieldMap, MinimizationPolicy};
use privacy_compliance::config::ConfigLoader;
use privacy_compliance::logging::init_logging;
use privacy_compliance::ComplianceEngine;
use serde_json::{json, Value};
use std::path::PathBuf;
use tracing::info;

#[derive(Parser)]
#[command(name = "privacy-compliance")]
#[command(about = "Data-protection compliance engine demo")]
struct Args {
    /// Configuration file (defaults to ./privacy-compliance.toml if present)
    #[arg(short, long, env = "PRIVACY_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the consent / access / minimization / erasure walkthrough
    Demo {
        /// Data subject identifier
        #[arg(short, long, default_value = "user123")]
        user: String,
    },
    /// Print the data protection policy and minimization rules
    Policy,
    /// Run the walkthrough without erasure and print the activity log as CSV
    Export {
        /// Data subject identifier
        #[arg(short, long, default_value = "user123")]
        user: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config = ConfigLoader::new()
        .load_from_file(args.config)
        .load_from_env()
        .build()?;
    init_logging(&config.log)?;

    let engine = ComplianceEngine::from_config(config).context("Failed to create engine")?;

    match args.command {
        Command::Demo { user } => {
            let report = run_scenario(&engine, &user, true).await?;
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        Command::Policy => {
            let minimization = MinimizationPolicy::new();
            let report = json!({
                "policy": engine.policy_details(),
                "minimization_rules": minimization.rules(),
            });
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        Command::Export { user } => {
            run_scenario(&engine, &user, false).await?;
            print!("{}", engine.export_logs_csv(Some(&user)).await?);
        }
    }

    Ok(())
}

/// 一連の操作を実行し、各段階の結果を JSON にまとめる
async fn run_scenario(engine: &ComplianceEngine, user: &str, erase: bool) -> Result<Value> {
    info!(user, "running compliance walkthrough");

    let mut personal = FieldMap::new();
    personal.insert("email".to_string(), json!(format!("{}@b.com", user)));
    personal.insert("phone".to_string(), json!("5551234"));
    personal.insert("address".to_string(), json!("1 Main St"));
    engine.store_personal_data(user, personal).await?;

    let consent_updated = engine.update_consent(user, "data_processing", true).await;
    let marketing_updated = engine.update_consent(user, "marketing", false).await;

    let access = engine.process_data_access_request(user).await;

    let mut form = FieldMap::new();
    form.insert("username".to_string(), json!(user));
    form.insert("email".to_string(), json!(format!("{}@b.com", user)));
    form.insert("phone".to_string(), json!("5551234"));
    let minimized = engine
        .process_minimized(user, "authentication", &form)
        .await;

    let logs_before_erasure = engine.get_logs(Some(user)).await?;

    let mut report = json!({
        "consent_updated": consent_updated && marketing_updated,
        "consents": engine.list_consents(user).await?,
        "access_request": access,
        "minimization": minimized,
        "activity_log": logs_before_erasure,
    });

    if erase {
        let erasure = engine.right_to_be_forgotten(user).await;
        report["erasure"] = serde_json::to_value(&erasure)?;
        report["logs_after_erasure"] = json!(engine.get_logs(Some(user)).await?.len());
    }

    report["stats"] = serde_json::to_value(engine.stats().await?)?;
    Ok(report)
}
