//! hel engine binary.
//!
//! Reads newline-delimited JSON policy contexts on stdin and writes one JSON
//! decision per line on stdout. Config path comes from `HEL_CONFIG`
//! (default `hel.yaml`); logs go to stderr, filtered by `RUST_LOG`.

use serde_json::{json, Value};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing_subscriber::{fmt, EnvFilter};

use hel_core::error::{HelError, Result};
use hel_engine::{config, TenantEngines};

#[tokio::main]
async fn main() -> Result<()> {
    fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let path = std::env::var("HEL_CONFIG").unwrap_or_else(|_| "hel.yaml".into());
    let cfg = config::load_from_file(&path)?;
    let engines = TenantEngines::from_config(&cfg)?;
    tracing::info!(config = %path, tenants = cfg.tenants.len(), profile = %cfg.engine.profile, "hel-engine ready");

    let mut input = BufReader::new(tokio::io::stdin());
    let mut stdout = tokio::io::stdout();
    let mut line = Vec::new();

    loop {
        line.clear();
        if input.read_until(b'\n', &mut line).await? == 0 {
            break;
        }
        if line.iter().all(u8::is_ascii_whitespace) {
            continue;
        }
        // Bytes, not `lines()`: a non-UTF-8 line is a bad context, not a dead stream.
        let out = match serde_json::from_slice::<Value>(&line) {
            Ok(ctx) => match engines.evaluate(&ctx).await {
                Ok(decision) => serde_json::to_value(&decision)?,
                Err(e) => error_line(&e),
            },
            Err(e) => error_line(&HelError::InvalidPolicyContext(format!("not json: {e}"))),
        };
        let mut buf = serde_json::to_vec(&out)?;
        buf.push(b'\n');
        stdout.write_all(&buf).await?;
        stdout.flush().await?;
    }

    Ok(())
}

fn error_line(e: &HelError) -> Value {
    json!({ "error": e.code().as_str(), "message": e.to_string() })
}
