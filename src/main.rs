//! proxy-tool local runtime.
//!
//! Serves a few demo scripts over HTTP. Configuration is read from the
//! JSON file named by `PROXY_TOOL_CONFIG` when set.

use proxy_tool::prelude::*;
use std::collections::HashMap;
use tracing_subscriber::EnvFilter;

/// Echoes the request body back, tagged with the correlation id.
#[proxy_script(name = "echo", kind = "http-request", description = "Echo the request body")]
async fn echo(tool: &ProxyTool) -> Result<(), ScriptError> {
    let request = tool
        .request()
        .ok_or_else(|| ScriptError::bad_request("no request attached"))?;

    let headers = HashMap::from([("X-Request-Id".to_string(), request.id.clone())]);
    tool.done(Completion::with_headers(
        request.text().unwrap_or_default(),
        headers,
    ));
    Ok(())
}

/// Counts invocations in persistent storage.
#[proxy_script(name = "counter", kind = "http-request")]
async fn counter(tool: &ProxyTool) -> Result<(), ScriptError> {
    let count = tool
        .get_storage("counter")
        .and_then(|v| v.parse::<u64>().ok())
        .unwrap_or(0)
        + 1;

    if !tool.set_storage("counter", &count.to_string()) {
        return Err(ScriptError::new("failed to persist counter"));
    }

    tool.done(serde_json::json!({ "count": count }).to_string());
    Ok(())
}

/// Reports environment facts and the GeoIP country of `X-Client-IP`.
#[proxy_script(name = "whereami", kind = "http-request")]
async fn whereami(tool: &ProxyTool) -> Result<(), ScriptError> {
    let ip = tool
        .request()
        .and_then(|r| r.get_header("X-Client-IP").cloned())
        .unwrap_or_default();
    let env = tool.environment();
    let script = tool.script();

    let body = serde_json::json!({
        "script": script.name,
        "type": script.script_type,
        "system": env.system,
        "version": env.host_version,
        "ip": ip,
        "country": tool.geoip(&ip),
        "aso": tool.ipaso(&ip),
    });
    tool.done(body.to_string());
    Ok(())
}

/// Fetches the URL in `X-Target` and returns its body.
#[proxy_script(name = "relay", kind = "http-request", timeout = 15)]
async fn relay(tool: &ProxyTool) -> Result<(), ScriptError> {
    let target = tool
        .request()
        .and_then(|r| r.get_header("X-Target").cloned())
        .ok_or_else(|| ScriptError::bad_request("missing X-Target header"))?;

    let result = tool
        .fetch(target.as_str(), None, FetchOptions::new().binary_mode(true))
        .await?;

    if let Some(status) = result.response.status.filter(|s| !s.is_success()) {
        tool.notify(
            "Relay",
            &target,
            &format!("upstream answered {}", status.0),
            NotifyOptions::new().auto_dismiss(5),
        );
    }

    let bytes = result
        .body
        .map(Body::into_bytes)
        .unwrap_or_default();
    let body = match result.response.get_header("content-encoding") {
        Some(encoding) if encoding.eq_ignore_ascii_case("gzip") => {
            tool.ungzip(&bytes).unwrap_or(bytes)
        }
        _ => bytes,
    };

    tool.done(String::from_utf8_lossy(&body).into_owned());
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    tracing::info!("Starting proxy-tool runtime...");

    let config = RuntimeConfig::from_env()?;
    let server = ScriptServer::new(config)?;

    server
        .register_script("echo", Box::new(EchoScript::new()))
        .await?;
    server
        .register_script("counter", Box::new(CounterScript::new()))
        .await?;
    server
        .register_script("whereami", Box::new(WhereamiScript::new()))
        .await?;
    server
        .register_script("relay", Box::new(RelayScript::new()))
        .await?;

    tracing::info!("Registered scripts: echo, counter, whereami, relay");
    tracing::info!("Try: curl -X POST -d 'test' http://127.0.0.1:6170/echo");
    tracing::info!("Try: curl http://127.0.0.1:6170/counter");
    tracing::info!("Scripts: curl http://127.0.0.1:6170/_scripts");

    server.run().await
}
