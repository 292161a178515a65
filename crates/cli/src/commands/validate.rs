//! `validate` command implementation.

use anyhow::{Context, Result};
use contracts::{EmitterConfig, TransportKind, DEFAULT_MAX_PAYLOAD_LEN};
use serde::Serialize;
use tracing::info;

use crate::cli::ValidateArgs;

/// Validation result for JSON output
#[derive(Serialize)]
struct ValidationResult {
    valid: bool,
    config_path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    warnings: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    summary: Option<ConfigSummary>,
}

#[derive(Serialize)]
struct ConfigSummary {
    endpoint: String,
    kind: String,
    codec: String,
    queue_size: usize,
    flush_interval_ms: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    prefix: Option<String>,
}

/// Execute the `validate` command
pub fn run_validate(args: &ValidateArgs) -> Result<()> {
    info!(config = %args.config.display(), "Validating configuration");

    let result = validate_config(args);

    if args.json {
        let json = serde_json::to_string_pretty(&result)
            .context("Failed to serialize validation result")?;
        println!("{json}");
    } else {
        print_validation_result(&result);
    }

    if result.valid {
        Ok(())
    } else {
        anyhow::bail!("Configuration validation failed")
    }
}

fn validate_config(args: &ValidateArgs) -> ValidationResult {
    let config_path = args.config.display().to_string();

    if !args.config.exists() {
        return ValidationResult {
            valid: false,
            config_path,
            error: Some(format!("File not found: {}", args.config.display())),
            warnings: None,
            summary: None,
        };
    }

    match config_loader::ConfigLoader::load_from_path(&args.config) {
        Ok(config) => {
            let warnings = collect_warnings(&config);
            ValidationResult {
                valid: true,
                config_path,
                error: None,
                warnings: (!warnings.is_empty()).then_some(warnings),
                summary: Some(ConfigSummary {
                    endpoint: config.transport.endpoint(),
                    kind: format!("{:?}", config.transport.kind),
                    codec: format!("{:?}", config.transport.codec),
                    queue_size: config.dispatcher.queue_size,
                    flush_interval_ms: config.dispatcher.flush_interval_ms,
                    prefix: config.prefix,
                }),
            }
        }
        Err(e) => ValidationResult {
            valid: false,
            config_path,
            error: Some(e.to_string()),
            warnings: None,
            summary: None,
        },
    }
}

/// Collect configuration warnings (non-fatal issues)
fn collect_warnings(config: &EmitterConfig) -> Vec<String> {
    let mut warnings = Vec::new();
    let dispatcher = &config.dispatcher;

    if let Some(max) = dispatcher.max_batch_size {
        if max > dispatcher.queue_size {
            warnings.push(format!(
                "max_batch_size ({max}) exceeds queue_size ({}) and has no effect",
                dispatcher.queue_size
            ));
        }
    }

    if config.transport.kind == TransportKind::Tcp
        && config.transport.max_payload_len != DEFAULT_MAX_PAYLOAD_LEN
    {
        warnings.push("max_payload_len only applies to the udp transport".to_string());
    }

    if dispatcher.flush_interval_ms >= dispatcher.shutdown_timeout_ms {
        warnings.push(
            "flush_interval_ms >= shutdown_timeout_ms - close may time out mid-batch".to_string(),
        );
    }

    warnings
}

fn print_validation_result(result: &ValidationResult) {
    if result.valid {
        println!("✓ Configuration is valid: {}", result.config_path);

        if let Some(ref summary) = result.summary {
            println!("\n  Endpoint: {} ({}, {})", summary.endpoint, summary.kind, summary.codec);
            println!("  Queue size: {}", summary.queue_size);
            println!("  Flush interval: {} ms", summary.flush_interval_ms);
            if let Some(ref prefix) = summary.prefix {
                println!("  Prefix: {prefix}");
            }
        }

        if let Some(ref warnings) = result.warnings {
            println!("\n⚠ Warnings:");
            for warning in warnings {
                println!("  - {warning}");
            }
        }
    } else {
        println!("✗ Configuration is invalid: {}", result.config_path);
        if let Some(ref error) = result.error {
            println!("\n  Error: {error}");
        }
    }
}
