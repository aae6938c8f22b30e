//! Bootstraps a service manager from a JSON configuration and resolves
//! a few delegated bindings.
//!
//! Logs registration and resolution at `debug`; override with `RUST_LOG`.

use std::sync::Arc;

use tracing::info;
use tracing_subscriber::EnvFilter;
use wakil::prelude::*;

const CONFIG: &str = r#"{
    "wakil": {
        "build_delegator": {
            "keys": ["mail.transport"],
            "strict": true
        }
    },
    "mail": {
        "transport": {
            "default": "mail.smtp",
            "bulk": {"service": "mail.smtp", "options": {"host": "bulk.example.org", "port": 2525}}
        }
    }
}"#;

#[derive(Debug)]
struct SmtpTransport {
    host: String,
    port: i64,
}

fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("wakil_container=debug")),
        )
        .init();

    let config: ConfigValue = serde_json::from_str(CONFIG)?;
    let module = BuildDelegatorModule::new(Arc::new(config))?;

    let manager = ServiceManager::builder()
        .factory("mail.smtp", |_, options| {
            let host = options
                .and_then(|o| o.get("host"))
                .and_then(ConfigValue::as_str)
                .unwrap_or("localhost");
            let port = match options.and_then(|o| o.get("port")) {
                Some(ConfigValue::Integer(port)) => *port,
                _ => 25,
            };
            Ok(SmtpTransport { host: host.to_string(), port })
        })
        .add_module(&module)
        .build()?;

    info!(services = ?manager.names(), "Service manager ready");

    for name in ["mail.transport.default", "mail.transport.bulk"] {
        let transport: Arc<SmtpTransport> = get_as(&manager, name)?;
        println!("{name} -> {}:{}", transport.host, transport.port);
    }

    match manager.get("mail.transport.fallback") {
        Ok(_) => println!("mail.transport.fallback unexpectedly resolved"),
        Err(err) => println!("{err}"),
    }

    Ok(())
}
