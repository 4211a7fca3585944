//! Sends one sample alert through the configured transport (log-only when no SMTP relay is set).

use disaster_alerts::config::{load_config_default, Secrets};
use disaster_alerts::notify::{Dispatcher, EmailTransport, LogTransport, MessageTransport};
use disaster_alerts::{AlertEvent, Severity, SourceId};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();
    tracing_subscriber::fmt().with_target(false).init();

    let cfg = load_config_default()?;
    cfg.validate()?;
    let secrets = Secrets::from_env();

    let transport: Box<dyn MessageTransport> = match (&cfg.notify.smtp_host, &cfg.notify.from) {
        (Some(host), Some(from)) => Box::new(EmailTransport::new(
            host,
            cfg.notify.smtp_port,
            from,
            secrets.smtp_credentials(),
        )?),
        _ => Box::new(LogTransport),
    };
    let dispatcher = Dispatcher::new(transport, cfg.notify.recipients.clone());

    let ev = AlertEvent {
        severity: Severity::Warning,
        source_id: SourceId::Seismic,
        subject: "[TEST] Mild Earthquake Warning".into(),
        body: "A mild earthquake of magnitude 3.4 has been detected at Test Bay.".into(),
        rule: "notify-demo".into(),
    };
    let summary = dispatcher.notify_all(std::slice::from_ref(&ev)).await;

    println!(
        "notify-demo done via {}: delivered={} failed={}",
        dispatcher.transport_name(),
        summary.delivered,
        summary.failed
    );
    Ok(())
}
