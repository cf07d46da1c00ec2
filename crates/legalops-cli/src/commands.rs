//! Subcommand handlers and their output formats.

use anyhow::{Context, Result};
use legalops_client::LegalOpsClient;
use legalops_client::events::types::{RiskLevel, modules};
use legalops_client::events::{EventType, LinkEndpoint, LinkType, ModuleLinkage, NewLinkage, Notification};
use legalops_client::remote::ChannelState;
use legalops_core::LinkageId;
use serde_json::{Value, json};
use tokio::sync::broadcast::error::RecvError;

use crate::WatchTarget;

/// Expand `module` targets to every event type, dropping duplicate pairs.
pub(crate) fn subscription_pairs(targets: &[WatchTarget]) -> Vec<(String, String)> {
    let mut pairs = Vec::new();
    for target in targets {
        let events: Vec<String> = match &target.event {
            Some(event) => vec![event.clone()],
            None => EventType::ALL.iter().map(|e| e.as_str().to_owned()).collect(),
        };
        for event in events {
            let pair = (target.module.clone(), event);
            if !pairs.contains(&pair) {
                pairs.push(pair);
            }
        }
    }
    pairs
}

/// One event as a JSON line.
pub(crate) fn event_line(module: &str, event: &str, data: &Value) -> String {
    json!({ "module": module, "event": event, "data": data }).to_string()
}

/// Symmetric relationships read the same from both ends and get a two-way arrow.
pub(crate) fn linkage_line(linkage: &ModuleLinkage) -> String {
    let (head, tail) = if linkage.link_type.is_symmetric() {
        ("<-", "->")
    } else {
        ("-", "->")
    };
    format!(
        "{}  {}/{} {head}[{}]{tail} {}/{}",
        linkage.id,
        linkage.source_module,
        linkage.source_id,
        linkage.link_type,
        linkage.target_module,
        linkage.target_id
    )
}

pub(crate) fn notification_line(notification: &Notification) -> String {
    let marker = if notification.read { ' ' } else { '*' };
    let mut line = format!(
        "{marker} {}  {}  [{}] {}: {}",
        notification.timestamp, notification.id, notification.kind, notification.title, notification.message
    );
    if let Some(url) = &notification.action_url {
        line.push_str("  -> ");
        line.push_str(url);
    }
    line
}

pub(crate) async fn watch(client: &LegalOpsClient, targets: &[WatchTarget]) -> Result<()> {
    if !client.credentials().is_present() {
        anyhow::bail!("watch needs a session token (--token or LEGALOPS_TOKEN)");
    }

    let handles: Vec<_> = subscription_pairs(targets)
        .into_iter()
        .map(|(module, event)| {
            let (m, e) = (module.clone(), event.clone());
            client.bus().subscribe(module, event, move |data| {
                println!("{}", event_line(&m, &e, data));
                Ok(())
            })
        })
        .collect();
    tracing::info!(subscriptions = handles.len(), "watching");

    let mut arrivals = client.inbox().subscribe();
    let mut state = client.channel().watch_state();
    client.open();

    loop {
        tokio::select! {
            signal = tokio::signal::ctrl_c() => {
                signal.context("Failed to listen for ctrl-c")?;
                break;
            }
            arrival = arrivals.recv() => match arrival {
                Ok(notification) => println!("{}", notification_line(&notification)),
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "notification output fell behind");
                }
                Err(RecvError::Closed) => break,
            },
            changed = state.changed() => {
                if changed.is_err() {
                    break;
                }
                let current = *state.borrow_and_update();
                tracing::info!(state = ?current, "event stream state changed");
                if current == ChannelState::Idle {
                    anyhow::bail!("event stream stopped: session token is no longer present");
                }
            }
        }
    }

    tracing::info!("Shutting down...");
    client.close();
    let stats = client.channel().stats();
    tracing::info!(
        received = stats.messages_received,
        malformed = stats.malformed_messages,
        attempts = stats.connect_attempts,
        "event stream closed"
    );
    drop(handles);
    Ok(())
}

pub(crate) async fn links(client: &LegalOpsClient, module: &str, entity: Option<&str>) -> Result<()> {
    let linkages = client
        .linkages()
        .get_linkages(module, entity)
        .await
        .context("Failed to fetch linkages")?;
    for linkage in &linkages {
        println!("{}", linkage_line(linkage));
    }
    Ok(())
}

pub(crate) async fn link(
    client: &LegalOpsClient,
    source: LinkEndpoint,
    target: LinkEndpoint,
    link_type: LinkType,
    metadata: Option<Value>,
) -> Result<()> {
    let mut linkage = NewLinkage::new(
        source.module,
        source.entity_id,
        target.module,
        target.entity_id,
        link_type,
    );
    linkage.metadata = metadata;
    let created = client
        .linkages()
        .create_linkage(linkage)
        .await
        .context("Failed to create linkage")?;
    client.bus().flush_forwards().await;
    println!("{}", linkage_line(&created));
    Ok(())
}

pub(crate) async fn unlink(client: &LegalOpsClient, id: String) -> Result<()> {
    let id = LinkageId::from(id);
    client
        .linkages()
        .remove_linkage(&id)
        .await
        .with_context(|| format!("Failed to remove linkage {id}"))?;
    println!("removed {id}");
    Ok(())
}

pub(crate) async fn inbox(client: &LegalOpsClient, mark_all_read: bool, unread_only: bool) -> Result<()> {
    let inbox = client.inbox();
    let _ = inbox.refresh().await.context("Failed to fetch notifications")?;
    for notification in inbox.notifications().iter().filter(|n| !unread_only || !n.read) {
        println!("{}", notification_line(notification));
    }
    println!("{} unread", inbox.unread_count());

    if mark_all_read {
        inbox
            .mark_all_read()
            .await
            .context("Failed to mark notifications read")?;
        println!("all notifications marked read");
    }
    Ok(())
}

pub(crate) async fn flag_risk(
    client: &LegalOpsClient,
    record: &LinkEndpoint,
    level: RiskLevel,
    details: Option<Value>,
) -> Result<()> {
    client
        .publisher()
        .risk_assessment_required(
            &record.module,
            &record.entity_id,
            level,
            details.unwrap_or_else(|| json!({})),
        )
        .context("Failed to encode risk flag")?;
    client.bus().flush_forwards().await;
    println!(
        "flagged {}/{} as {level} risk for {}",
        record.module,
        record.entity_id,
        modules::RISK_MANAGEMENT
    );
    Ok(())
}
