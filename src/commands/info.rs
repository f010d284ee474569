//! Information handlers: owner, menu, thanks, license, ping.

use super::{CommandContext, CommandResult};
use zayden_core::message::Contact;

/// Menu categories and the commands listed under each.
const MENU: &[(&str, &[&str])] = &[
    ("main", &["menu", "owner", "ping", "tqto", "license"]),
    (
        "downloader",
        &[
            "ig <url>",
            "igstory <username>",
            "mediafire <url>",
            "tiktok <url>",
            "spotify <query>",
            "play <query>",
            "ytdl <url>",
            "pinterest <query>|<count>",
        ],
    ),
    (
        "tools",
        &[
            "ai <prompt>",
            "remini",
            "whatmusic",
            "tourl",
            "shorturl <url>",
            "fetch <url>",
            "khodam <name>",
        ],
    ),
    (
        "converter",
        &["sticker [pack|author]", "toimg", "tomp3", "qc <text>", "ttp <text>", "attp <text>", "rvo"],
    ),
    (
        "group",
        &["antilink on|off", "hidetag <text>", "kick @user", "add <number>", "delete"],
    ),
    (
        "owner",
        &["addprem <number>", "delprem <number>", "listprem", "addpinrule <text>", "delpinrule <text>"],
    ),
];

const CREDITS: &[&str] = &["Muhammad Adriansyah", "Zayden"];

const LICENSE: &str = "MIT License\n\n\
Permission is hereby granted, free of charge, to any person obtaining a copy \
of this software and associated documentation files (the \"Software\"), to deal \
in the Software without restriction, including without limitation the rights \
to use, copy, modify, merge, publish, distribute, sublicense, and/or sell \
copies of the Software, and to permit persons to whom the Software is \
furnished to do so, subject to the following conditions:\n\n\
The above copyright notice and this permission notice shall be included in all \
copies or substantial portions of the Software.\n\n\
THE SOFTWARE IS PROVIDED \"AS IS\", WITHOUT WARRANTY OF ANY KIND, EXPRESS OR \
IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY, \
FITNESS FOR A PARTICULAR PURPOSE AND NONINFRINGEMENT. IN NO EVENT SHALL THE \
AUTHORS OR COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM, DAMAGES OR OTHER \
LIABILITY, WHETHER IN AN ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING FROM, \
OUT OF OR IN CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN THE \
SOFTWARE.";

pub(super) async fn owner(ctx: &CommandContext<'_>) -> CommandResult {
    let contacts: Vec<Contact> = ctx
        .config
        .owner
        .numbers
        .iter()
        .map(|number| Contact {
            name: ctx.config.owner.name.clone(),
            number: number.clone(),
        })
        .collect();
    if contacts.is_empty() {
        return ctx.reply(&ctx.config.replies.not_found).await;
    }
    ctx.messenger
        .send_contacts(&ctx.msg.chat_id, &contacts, Some(&ctx.msg.key()))
        .await?;
    Ok(())
}

pub(super) async fn menu(ctx: &CommandContext<'_>) -> CommandResult {
    ctx.reply(&render_menu(&ctx.msg.push_name, ctx.prefix(), &ctx.config.bot.name))
        .await
}

pub(super) fn render_menu(push_name: &str, prefix: &str, bot_name: &str) -> String {
    let mut txt = format!("Hello {push_name} 👋🏻\n");
    for (category, items) in MENU {
        txt.push_str(&format!("\n*{}*\n", category.to_uppercase()));
        for item in *items {
            txt.push_str(&format!("- {prefix}{item}\n"));
        }
    }
    txt.push_str(&format!("\n_{bot_name}_"));
    txt
}

pub(super) async fn thanks_to(ctx: &CommandContext<'_>) -> CommandResult {
    let mut txt = "*Thanks To:*\n\n".to_string();
    for name in CREDITS {
        txt.push_str(&format!("- {name}\n"));
    }
    ctx.reply(txt.trim_end()).await
}

pub(super) async fn license(ctx: &CommandContext<'_>) -> CommandResult {
    ctx.reply(LICENSE).await
}

pub(super) async fn ping(ctx: &CommandContext<'_>) -> CommandResult {
    let latency_ms = (chrono::Utc::now() - ctx.msg.timestamp)
        .num_milliseconds()
        .max(0);
    let uptime = format_duration(ctx.uptime.elapsed().as_secs());
    let server = tokio::task::spawn_blocking(server_report)
        .await
        .unwrap_or_else(|e| format!("server info unavailable: {e}"));

    let txt = format!("*Response speed:* {latency_ms} ms\n*Runtime:* {uptime}\n\n{server}");
    ctx.reply(txt.trim_end()).await
}

/// RAM and CPU summary of the host and this process.
fn server_report() -> String {
    let mut sys = sysinfo::System::new();
    sys.refresh_memory();
    sys.refresh_cpu_usage();
    std::thread::sleep(sysinfo::MINIMUM_CPU_UPDATE_INTERVAL);
    sys.refresh_cpu_usage();

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

    let mut out = format!(
        "💻 *Server*\nRAM: {} / {}\nProcess: {}\n",
        format_bytes(sys.used_memory()),
        format_bytes(sys.total_memory()),
        format_bytes(process),
    );

    let cpus = sys.cpus();
    if let Some(first) = cpus.first() {
        out.push_str(&format!(
            "\n*CPU* {} ({} MHz), {} core(s)\nTotal usage: {:.2}%\n",
            first.brand().trim(),
            first.frequency(),
            cpus.len(),
            sys.global_cpu_usage()
        ));
        for (i, cpu) in cpus.iter().enumerate() {
            out.push_str(&format!("{}. {:.2}%\n", i + 1, cpu.cpu_usage()));
        }
    }
    out
}

/// `3d 4h 5m 6s`, skipping leading zero units.
pub(super) fn format_duration(secs: u64) -> String {
    let days = secs / 86_400;
    let hours = (secs % 86_400) / 3600;
    let minutes = (secs % 3600) / 60;
    let seconds = secs % 60;
    match (days, hours, minutes) {
        (0, 0, 0) => format!("{seconds}s"),
        (0, 0, _) => format!("{minutes}m {seconds}s"),
        (0, _, _) => format!("{hours}h {minutes}m {seconds}s"),
        _ => format!("{days}d {hours}h {minutes}m {seconds}s"),
    }
}

pub(super) fn format_bytes(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["B", "KB", "MB", "GB"];
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{bytes} B")
    } else {
        format!("{value:.1} {}", UNITS[unit])
    }
}
