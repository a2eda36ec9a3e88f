//! `schema`: show the model's feature manifest

use anyhow::{Context, Result};
use console::style;

use crate::pipeline::FeatureManifest;
use crate::service::{ScoringService, ServiceError, ServicePaths};

pub fn run_schema(paths: &ServicePaths, required: bool, json: bool) -> Result<()> {
    let (manifest, required_columns) = if required {
        let service = ScoringService::load(paths).map_err(ServiceError::from)?;
        (service.schema().clone(), Some(service.required_columns().to_vec()))
    } else {
        (FeatureManifest::load(&paths.manifest).map_err(ServiceError::from)?, None)
    };

    if json {
        let body = match &required_columns {
            Some(columns) => serde_json::json!({
                "features": manifest.features(),
                "required_columns": columns,
            }),
            None => serde_json::json!({ "features": manifest.features() }),
        };
        let text = serde_json::to_string_pretty(&body).context("Failed to serialize schema")?;
        println!("{}", text);
        return Ok(());
    }

    println!();
    println!(
        "    {} {}",
        style("Model features").white().bold(),
        style(format!("({})", manifest.len())).dim()
    );
    for (i, feature) in manifest.features().iter().enumerate() {
        println!("      {:>3}. {}", i + 1, feature);
    }

    if let Some(columns) = required_columns {
        println!();
        println!(
            "    {} {}",
            style("Required input columns").white().bold(),
            style(format!("({})", columns.len())).dim()
        );
        for column in columns {
            println!("      {} {}", style("•").dim(), column);
        }
    }
    println!();
    Ok(())
}
