//! `predict`: score JSON records and print a JSON response

use std::io::Read;
use std::path::Path;

use anyhow::{Context, Result};

use crate::service::{ScoringService, ServiceError, ServicePaths};

pub fn run_predict(paths: &ServicePaths, input: Option<&Path>, strict: bool) -> Result<()> {
    let body = match input {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read request file: {}", path.display()))?,
        None => {
            let mut body = String::new();
            std::io::stdin()
                .read_to_string(&mut body)
                .context("Failed to read request from stdin")?;
            body
        }
    };

    let service = ScoringService::load(paths).map_err(ServiceError::from)?.with_strict(strict);

    match service.predict_json(&body) {
        Ok(response) => {
            let json = serde_json::to_string_pretty(&response)
                .context("Failed to serialize prediction response")?;
            println!("{}", json);
            Ok(())
        }
        Err(err) => {
            println!("{}", serde_json::json!({ "error": err.to_string() }));
            Err(err.into())
        }
    }
}
