//! Resolve the effective emitter configuration from file, env and flags.

use config_loader::ConfigLoader;
use contracts::{CodecKind, EmitterConfig, TransportKind};
use tracing::debug;

use crate::cli::EmitterArgs;
use crate::error::{CliError, Result};

/// Build the configuration used by sending commands
///
/// Flags override the config file; the merged result is validated again.
pub fn resolve(args: &EmitterArgs) -> Result<EmitterConfig> {
    let mut config = match &args.config {
        Some(path) => {
            if !path.exists() {
                return Err(CliError::config_not_found(path.display().to_string()));
            }
            ConfigLoader::load_from_path(path)?
        }
        None => EmitterConfig::default(),
    };

    apply_overrides(&mut config, args);
    ConfigLoader::validate(&config)?;

    debug!(
        endpoint = %config.transport.endpoint(),
        kind = ?config.transport.kind,
        codec = ?config.transport.codec,
        queue_size = config.dispatcher.queue_size,
        "Resolved emitter configuration"
    );
    Ok(config)
}

fn apply_overrides(config: &mut EmitterConfig, args: &EmitterArgs) {
    if let Some(host) = &args.host {
        config.transport.host = host.clone();
    }
    if let Some(port) = args.port {
        config.transport.port = port;
    }
    if args.udp {
        config.transport.kind = TransportKind::Udp;
    }
    if args.gzip {
        config.transport.codec = CodecKind::Gzip;
    }
    if let Some(queue_size) = args.queue_size {
        config.dispatcher.queue_size = queue_size;
    }
    if let Some(flush_interval_ms) = args.flush_interval_ms {
        config.dispatcher.flush_interval_ms = flush_interval_ms;
    }
    if let Some(prefix) = &args.prefix {
        config.prefix = Some(prefix.clone());
    }
}
