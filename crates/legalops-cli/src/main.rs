//! # legalops
//!
//! Command-line client for the legalops service: watch the event stream,
//! manage module linkages, read the inbox and raise risk flags.

#![deny(unsafe_code)]

mod commands;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use legalops_client::events::{LinkEndpoint, LinkType};
use legalops_client::events::types::RiskLevel;
use legalops_client::remote::SessionCredentials;
use legalops_client::settings::{LegalOpsSettings, load_settings};
use legalops_client::LegalOpsClient;
use serde_json::Value;

/// legalops command-line client.
#[derive(Parser, Debug)]
#[command(name = "legalops", about = "legalops event stream, linkage and inbox client")]
struct Cli {
    /// Session token.
    #[arg(long, global = true, env = "LEGALOPS_TOKEN", hide_env_values = true)]
    token: Option<String>,

    /// API base URL (overrides settings).
    #[arg(long, global = true)]
    api_url: Option<String>,

    /// Log level (overrides settings; `RUST_LOG` still wins).
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print events and notifications as they arrive, until Ctrl-C.
    Watch {
        /// `module:event` pairs, or a bare `module` for every known event type.
        #[arg(required = true, value_parser = parse_watch_target)]
        targets: Vec<WatchTarget>,
    },
    /// List linkages touching a module or one of its records.
    Links {
        /// Module name.
        module: String,
        /// Restrict to one record.
        #[arg(long)]
        entity: Option<String>,
    },
    /// Link two records, given as `module/id`.
    Link {
        /// Source record.
        #[arg(value_parser = parse_endpoint)]
        source: LinkEndpoint,
        /// Target record.
        #[arg(value_parser = parse_endpoint)]
        target: LinkEndpoint,
        /// Relationship kind.
        #[arg(long = "type", default_value = "reference")]
        link_type: LinkType,
        /// JSON metadata attached to the edge.
        #[arg(long, value_parser = parse_json)]
        metadata: Option<Value>,
    },
    /// Remove a linkage by id.
    Unlink {
        /// Linkage id.
        id: String,
    },
    /// Show the notification inbox.
    Inbox {
        /// Mark every notification read after listing.
        #[arg(long)]
        mark_all_read: bool,
        /// Only list unread notifications.
        #[arg(long)]
        unread: bool,
    },
    /// Ask risk management to assess a record, given as `module/id`.
    FlagRisk {
        /// Record to assess.
        #[arg(value_parser = parse_endpoint)]
        record: LinkEndpoint,
        /// Assessed risk level.
        #[arg(long, default_value = "medium")]
        level: RiskLevel,
        /// JSON details for the assessor.
        #[arg(long, value_parser = parse_json)]
        details: Option<Value>,
    },
}

/// One `watch` argument.
#[derive(Clone, Debug, PartialEq, Eq)]
struct WatchTarget {
    module: String,
    /// `None` means every event type in the taxonomy.
    event: Option<String>,
}

fn parse_watch_target(raw: &str) -> Result<WatchTarget, String> {
    let (module, event) = match raw.split_once(':') {
        Some((module, event)) => (module, Some(event)),
        None => (raw, None),
    };
    if module.is_empty() || event.is_some_and(str::is_empty) {
        return Err(format!("expected `module` or `module:event`, got `{raw}`"));
    }
    Ok(WatchTarget {
        module: module.to_owned(),
        event: event.map(str::to_owned),
    })
}

fn parse_endpoint(raw: &str) -> Result<LinkEndpoint, String> {
    match raw.split_once('/') {
        Some((module, entity_id)) if !module.is_empty() && !entity_id.is_empty() => Ok(LinkEndpoint {
            module: module.to_owned(),
            entity_id: entity_id.to_owned(),
        }),
        _ => Err(format!("expected `module/id`, got `{raw}`")),
    }
}

fn parse_json(raw: &str) -> Result<Value, String> {
    serde_json::from_str(raw).map_err(|e| format!("invalid JSON: {e}"))
}

fn resolve_settings(cli: &Cli, loaded: Option<LegalOpsSettings>) -> LegalOpsSettings {
    let mut settings = loaded.unwrap_or_default();
    if let Some(url) = &cli.api_url {
        settings.api.base_url.clone_from(url);
    }
    if let Some(level) = &cli.log_level {
        settings.logging.level.clone_from(level);
    }
    settings
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let loaded = load_settings();
    let settings = resolve_settings(&cli, loaded.as_ref().ok().cloned());
    if settings.logging.json {
        legalops_core::logging::init_json_subscriber(&settings.logging.level);
    } else {
        legalops_core::logging::init_subscriber(&settings.logging.level);
    }
    if let Err(e) = &loaded {
        tracing::warn!(error = %e, "failed to load settings, using defaults");
    }

    let credentials = cli
        .token
        .clone()
        .map_or_else(SessionCredentials::new, SessionCredentials::with_token);
    let client = LegalOpsClient::new(&settings, credentials).context("Failed to build client")?;
    tracing::debug!(base_url = %client.api().base_url(), "client ready");

    match cli.command {
        Command::Watch { targets } => commands::watch(&client, &targets).await,
        Command::Links { module, entity } => commands::links(&client, &module, entity.as_deref()).await,
        Command::Link {
            source,
            target,
            link_type,
            metadata,
        } => commands::link(&client, source, target, link_type, metadata).await,
        Command::Unlink { id } => commands::unlink(&client, id).await,
        Command::Inbox {
            mark_all_read,
            unread,
        } => commands::inbox(&client, mark_all_read, unread).await,
        Command::FlagRisk {
            record,
            level,
            details,
        } => commands::flag_risk(&client, &record, level, details).await,
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_watch_targets() {
        let cli = Cli::try_parse_from([
            "legalops",
            "watch",
            "risk_management:risk_assessment_required",
            "contracts",
        ])
        .unwrap();
        assert_matches!(cli.command, Command::Watch { targets } => {
            assert_eq!(targets[0].module, "risk_management");
            assert_eq!(targets[0].event.as_deref(), Some("risk_assessment_required"));
            assert_eq!(targets[1], WatchTarget { module: "contracts".into(), event: None });
        });
    }

    #[test]
    fn watch_requires_a_target() {
        assert!(Cli::try_parse_from(["legalops", "watch"]).is_err());
        assert!(Cli::try_parse_from(["legalops", "watch", ":entity_created"]).is_err());
        assert!(Cli::try_parse_from(["legalops", "watch", "contracts:"]).is_err());
    }

    #[test]
    fn parses_link_with_defaults() {
        let cli = Cli::try_parse_from(["legalops", "link", "contracts/C-1", "disputes/D-9"]).unwrap();
        assert_matches!(cli.command, Command::Link { source, target, link_type, metadata } => {
            assert_eq!(source.module, "contracts");
            assert_eq!(source.entity_id, "C-1");
            assert_eq!(target.module, "disputes");
            assert_eq!(target.entity_id, "D-9");
            assert_eq!(link_type, LinkType::Reference);
            assert!(metadata.is_none());
        });
    }

    #[test]
    fn parses_link_type_and_metadata() {
        let cli = Cli::try_parse_from([
            "legalops",
            "link",
            "tasks/T-1",
            "matters/M-2",
            "--type",
            "dependency",
            "--metadata",
            r#"{"note":"blocks filing"}"#,
        ])
        .unwrap();
        assert_matches!(cli.command, Command::Link { link_type, metadata, .. } => {
            assert_eq!(link_type, LinkType::Dependency);
            assert_eq!(metadata.unwrap()["note"], "blocks filing");
        });
    }

    #[test]
    fn rejects_bad_endpoints_and_json() {
        assert!(Cli::try_parse_from(["legalops", "link", "contracts", "disputes/D-9"]).is_err());
        assert!(Cli::try_parse_from(["legalops", "link", "contracts/", "disputes/D-9"]).is_err());
        assert!(
            Cli::try_parse_from(["legalops", "link", "a/1", "b/2", "--metadata", "{not json"]).is_err()
        );
        assert!(Cli::try_parse_from(["legalops", "link", "a/1", "b/2", "--type", "cousin"]).is_err());
    }

    #[test]
    fn entity_ids_may_contain_slashes() {
        let endpoint = parse_endpoint("documents/2026/brief.pdf").unwrap();
        assert_eq!(endpoint.module, "documents");
        assert_eq!(endpoint.entity_id, "2026/brief.pdf");
    }

    #[test]
    fn parses_flag_risk() {
        let cli = Cli::try_parse_from([
            "legalops",
            "flag-risk",
            "contracts/C-1",
            "--level",
            "high",
            "--details",
            r#"{"reason":"missing indemnity"}"#,
        ])
        .unwrap();
        assert_matches!(cli.command, Command::FlagRisk { record, level, details } => {
            assert_eq!(record.entity_id, "C-1");
            assert_eq!(level, RiskLevel::High);
            assert_eq!(details.unwrap()["reason"], "missing indemnity");
        });
    }

    #[test]
    fn flag_risk_defaults_to_medium() {
        let cli = Cli::try_parse_from(["legalops", "flag-risk", "contracts/C-1"]).unwrap();
        assert_matches!(cli.command, Command::FlagRisk { level: RiskLevel::Medium, .. });
    }

    #[test]
    fn global_flags_follow_subcommands() {
        let cli = Cli::try_parse_from([
            "legalops",
            "inbox",
            "--mark-all-read",
            "--token",
            "tok",
            "--api-url",
            "http://api.test/v1",
        ])
        .unwrap();
        assert_eq!(cli.token.as_deref(), Some("tok"));
        assert_matches!(cli.command, Command::Inbox { mark_all_read: true, unread: false });

        let settings = resolve_settings(&cli, None);
        assert_eq!(settings.api.base_url, "http://api.test/v1");
        assert_eq!(settings.logging.level, "warn");
    }

    #[test]
    fn overrides_apply_over_loaded_settings() {
        let cli = Cli::try_parse_from(["legalops", "--log-level", "debug", "unlink", "lnk-1"]).unwrap();
        let mut loaded = LegalOpsSettings::default();
        loaded.api.base_url = "http://from-file/api".into();
        let settings = resolve_settings(&cli, Some(loaded));
        assert_eq!(settings.api.base_url, "http://from-file/api");
        assert_eq!(settings.logging.level, "debug");
    }
}
