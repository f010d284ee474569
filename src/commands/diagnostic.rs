//! Owner-only introspection menu, reached through the `>`, `=>`, `eval`,
//! `$` and `exec` tokens. Each action reports one piece of bot state; no
//! input is ever evaluated or executed.

use super::info::{format_bytes, format_duration};
use super::{CommandContext, CommandResult, DIAGNOSTIC_PREFIXES};
use tracing::warn;

/// Fixed set of introspection actions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum Action {
    Uptime,
    Memory,
    Lists,
    Busy,
    Config,
    Group,
    Quoted,
    Help,
}

impl Action {
    fn parse(name: &str) -> Self {
        match name.to_lowercase().as_str() {
            "uptime" => Self::Uptime,
            "memory" | "mem" => Self::Memory,
            "lists" | "list" => Self::Lists,
            "busy" => Self::Busy,
            "config" => Self::Config,
            "group" => Self::Group,
            "quoted" | "raw" => Self::Quoted,
            _ => Self::Help,
        }
    }
}

/// Action named by the command: the rest of the token (`>uptime`),
/// else the first argument (`> uptime`). `zayden` dumps the quote.
pub(super) fn action_of(command: &str, args: &[String]) -> Action {
    if command == "zayden" {
        return Action::Quoted;
    }
    let rest = DIAGNOSTIC_PREFIXES
        .iter()
        .find_map(|p| command.strip_prefix(p))
        .unwrap_or_default();
    match (rest, args.first()) {
        ("", Some(arg)) => Action::parse(arg),
        ("", None) => Action::Help,
        (name, _) => Action::parse(name),
    }
}

pub(super) async fn run(ctx: &CommandContext<'_>) -> CommandResult {
    if !ctx.facts.is_owner {
        // Silent: non-owners learn nothing about this surface.
        warn!(
            "diagnostic token '{}' ignored for non-owner {}",
            ctx.parsed.command, ctx.msg.sender_id
        );
        return Ok(());
    }

    let report = match action_of(&ctx.parsed.command, &ctx.parsed.args) {
        Action::Uptime => format!("Uptime: {}", format_duration(ctx.uptime.elapsed().as_secs())),
        Action::Memory => memory_report(),
        Action::Lists => format!(
            "premium: {}\nusers: {}\nantilink: {}\npinterest rules: {}",
            ctx.lists.premium.len().await,
            ctx.lists.users.len().await,
            ctx.lists.antilink.len().await,
            ctx.lists.pinterest.len().await,
        ),
        Action::Busy => {
            let busy = ctx.busy.snapshot();
            if busy.is_empty() {
                "No commands in flight.".to_string()
            } else {
                busy.iter()
                    .map(|(class, sender)| format!("{class}: {sender}"))
                    .collect::<Vec<_>>()
                    .join("\n")
            }
        }
        Action::Config => {
            let cfg = ctx.config;
            format!(
                "name: {}\nprefix: {}\nself_mode: {}\ndata_dir: {}\nservices: {}\nffmpeg: {}",
                cfg.bot.name,
                cfg.bot.prefix,
                cfg.bot.self_mode,
                cfg.data_dir().display(),
                cfg.services.base_url,
                cfg.media.ffmpeg_path,
            )
        }
        Action::Group => match ctx.group {
            Some(meta) => format!(
                "{} ({})\nparticipants: {}\nadmins: {}\nbot admin: {}",
                meta.subject,
                meta.id,
                meta.participants.len(),
                meta.participants
                    .iter()
                    .filter(|p| meta.is_admin(&p.id))
                    .count(),
                ctx.facts.is_bot_group_admin,
            ),
            None => ctx.config.replies.group_only.clone(),
        },
        Action::Quoted => {
            let dump = match ctx.msg.quoted {
                Some(ref q) => ctx.messenger.describe_message(&q.id).await,
                None => None,
            };
            dump.unwrap_or_else(|| "Reply to a message that is still cached.".to_string())
        }
        Action::Help => format!(
            "Diagnostics: {}> uptime | memory | lists | busy | config | group | quoted",
            ctx.prefix()
        ),
    };
    ctx.reply(&report).await
}

fn memory_report() -> String {
    let mut sys = sysinfo::System::new();
    sys.refresh_memory();
    let pid = sysinfo::get_current_pid().ok();
    if let Some(pid) = pid {
        sys.refresh_processes_specifics(
            sysinfo::ProcessesToUpdate::Some(&[pid]),
            false,
            sysinfo::ProcessRefreshKind::nothing().with_memory(),
        );
    }
    let process = pid
        .and_then(|p| sys.process(p))
        .map(|p| p.memory())
        .unwrap_or(0);
    format!(
        "process: {}\nsystem: {} / {}",
        format_bytes(process),
        format_bytes(sys.used_memory()),
        format_bytes(sys.total_memory())
    )
}
