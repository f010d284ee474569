//! Bot commands: alias table, per-message context, and handler dispatch.

mod diagnostic;
mod download;
mod group;
mod info;
mod media;
mod owner;
mod tools;


use std::time::Instant;
use tracing::{error, warn};
use zayden_core::{
    busy::BusyRegistry,
    command::ParsedCommand,
    config::Config,
    error::ZaydenError,
    group::GroupMetadata,
    message::{CanonicalMessage, MediaInfo, MessageKey, OutgoingMedia},
    permissions::{PermissionFacts, Role},
    traits::{MediaConverter, Messenger, Scraper},
};
use zayden_store::Lists;

/// Everything a handler may touch while serving one message.
pub struct CommandContext<'a> {
    pub msg: &'a CanonicalMessage,
    pub parsed: &'a ParsedCommand,
    pub facts: PermissionFacts,
    pub group: Option<&'a GroupMetadata>,
    /// The bot's own JID, once the channel knows it.
    pub own_id: Option<&'a str>,
    pub config: &'a Config,
    pub lists: &'a Lists,
    pub messenger: &'a dyn Messenger,
    pub scraper: &'a dyn Scraper,
    pub converter: &'a dyn MediaConverter,
    pub busy: &'a BusyRegistry,
    pub uptime: &'a Instant,
}

/// Why a handler stopped early.
#[derive(Debug)]
pub enum CommandError {
    /// Missing or malformed argument; the text is the hint to show.
    Usage(String),
    PermissionDenied(Role),
    Downstream(ZaydenError),
}

impl From<ZaydenError> for CommandError {
    fn from(e: ZaydenError) -> Self {
        Self::Downstream(e)
    }
}

pub type CommandResult = Result<(), CommandError>;

/// Known bot commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Owner,
    Menu,
    ThanksTo,
    License,
    Ping,
    ShortUrl,
    Fetch,
    Ai,
    Enhance,
    WhatMusic,
    Pinterest,
    AddPinRule,
    DelPinRule,
    Instagram,
    InstagramStory,
    Mediafire,
    Tiktok,
    TiktokVideo,
    TiktokAudio,
    Spotify,
    SpotifyDownload,
    YoutubePlay,
    Youtube,
    YoutubeMp3,
    YoutubeMp4,
    Antilink,
    Hidetag,
    Kick,
    Add,
    ReadViewOnce,
    Delete,
    ToUrl,
    Quotely,
    TextSticker,
    Sticker,
    ToAudio,
    ToImage,
    Khodam,
    AddPremium,
    DelPremium,
    ListPremium,
    /// Owner-only introspection menu.
    Diagnostic,
}

/// Token prefixes routed to the diagnostic menu.
pub const DIAGNOSTIC_PREFIXES: [&str; 5] = ["=>", ">", "eval", "$", "exec"];

impl Command {
    /// Look up a command token (already lower-cased by the parser).
    ///
    /// Returns `None` for unknown tokens, which the router ignores.
    pub fn from_token(token: &str) -> Option<Self> {
        let token = token.to_lowercase();
        let cmd = match token.as_str() {
            "owner" | "creator" | "author" => Self::Owner,
            "menu" | "allmenu" | "help" => Self::Menu,
            "tqto" | "thanksto" | "thankto" | "terimakasihkepada" => Self::ThanksTo,
            "license" | "licensi" => Self::License,
            "ping" | "botstatus" | "statusbot" => Self::Ping,
            "short" | "shorturl" => Self::ShortUrl,
            "get" | "fetch" => Self::Fetch,
            "ai" | "openai" => Self::Ai,
            "remini" | "hdr" | "hd" | "upscale" => Self::Enhance,
            "whatmusic" => Self::WhatMusic,
            "pin" | "pinterest" => Self::Pinterest,
            "addpinrule" | "addrulespin" => Self::AddPinRule,
            "delpinrule" | "delrulespin" => Self::DelPinRule,
            "ig" | "igdl" | "instagram" => Self::Instagram,
            "igstory" | "igstalker" => Self::InstagramStory,
            "mf" | "mediafire" => Self::Mediafire,
            "tiktok" => Self::Tiktok,
            "tiktokdl" | "ttdl" | "tt" => Self::TiktokVideo,
            "tiktokaudiodl" | "tiktokmusic" => Self::TiktokAudio,
            "spotify" => Self::Spotify,
            "spotifydl" => Self::SpotifyDownload,
            "play" | "ytplay" => Self::YoutubePlay,
            "ytdl" | "yt" | "youtube" => Self::Youtube,
            "ytmp3" => Self::YoutubeMp3,
            "ytmp4" => Self::YoutubeMp4,
            "antilink" => Self::Antilink,
            "hidetag" => Self::Hidetag,
            "kick" | "remove" => Self::Kick,
            "add" | "invite" => Self::Add,
            "rvo" | "readviewonce" => Self::ReadViewOnce,
            "delete" | "del" => Self::Delete,
            "tourl" => Self::ToUrl,
            "qc" | "quotely" | "qoute" | "fakechat" => Self::Quotely,
            "ttp" | "attp" => Self::TextSticker,
            "s" | "sticker" | "swm" | "imgtosticker" => Self::Sticker,
            "tomp3" | "toaudio" => Self::ToAudio,
            "toimg" | "toimage" => Self::ToImage,
            "khodam" | "cekkhodam" => Self::Khodam,
            "addprem" | "addpremium" => Self::AddPremium,
            "delprem" | "delpremium" | "removeprem" => Self::DelPremium,
            "listprem" | "listpremium" => Self::ListPremium,
            "zayden" => Self::Diagnostic,
            other if DIAGNOSTIC_PREFIXES.iter().any(|p| other.starts_with(p)) => Self::Diagnostic,
            _ => return None,
        };
        Some(cmd)
    }
}

/// Run a handler and turn its failure into the matching reply.
///
/// Never returns an error: every failure ends as a log line and a reply.
pub async fn execute(cmd: Command, ctx: &CommandContext<'_>) {
    let result = match cmd {
        Command::Owner => info::owner(ctx).await,
        Command::Menu => info::menu(ctx).await,
        Command::ThanksTo => info::thanks_to(ctx).await,
        Command::License => info::license(ctx).await,
        Command::Ping => info::ping(ctx).await,
        Command::ShortUrl => tools::short_url(ctx).await,
        Command::Fetch => tools::fetch(ctx).await,
        Command::Ai => tools::ai(ctx).await,
        Command::Enhance => tools::enhance(ctx).await,
        Command::WhatMusic => tools::what_music(ctx).await,
        Command::ToUrl => tools::to_url(ctx).await,
        Command::Khodam => tools::khodam(ctx).await,
        Command::Pinterest => download::pinterest(ctx).await,
        Command::AddPinRule => download::add_pin_rule(ctx).await,
        Command::DelPinRule => download::del_pin_rule(ctx).await,
        Command::Instagram => download::instagram(ctx).await,
        Command::InstagramStory => download::instagram_story(ctx).await,
        Command::Mediafire => download::mediafire(ctx).await,
        Command::Tiktok => download::tiktok_menu(ctx).await,
        Command::TiktokVideo => download::tiktok_video(ctx).await,
        Command::TiktokAudio => download::tiktok_audio(ctx).await,
        Command::Spotify => download::spotify(ctx).await,
        Command::SpotifyDownload => download::spotify_download(ctx).await,
        Command::YoutubePlay => download::youtube_play(ctx).await,
        Command::Youtube => download::youtube(ctx).await,
        Command::YoutubeMp3 => download::youtube_file(ctx, zayden_core::traits::YoutubeFormat::Audio).await,
        Command::YoutubeMp4 => download::youtube_file(ctx, zayden_core::traits::YoutubeFormat::Video).await,
        Command::Antilink => group::antilink(ctx).await,
        Command::Hidetag => group::hidetag(ctx).await,
        Command::Kick => group::kick(ctx).await,
        Command::Add => group::add(ctx).await,
        Command::Delete => group::delete(ctx).await,
        Command::ReadViewOnce => media::read_view_once(ctx).await,
        Command::Quotely => media::quotely(ctx).await,
        Command::TextSticker => media::text_sticker(ctx).await,
        Command::Sticker => media::sticker(ctx).await,
        Command::ToAudio => media::to_audio(ctx).await,
        Command::ToImage => media::to_image(ctx).await,
        Command::AddPremium => owner::add_premium(ctx).await,
        Command::DelPremium => owner::del_premium(ctx).await,
        Command::ListPremium => owner::list_premium(ctx).await,
        Command::Diagnostic => diagnostic::run(ctx).await,
    };

    let reply = match result {
        Ok(()) => return,
        Err(CommandError::Usage(hint)) => hint,
        Err(CommandError::PermissionDenied(role)) => {
            warn!(
                "{:?} denied for {}: missing {role:?}",
                cmd, ctx.msg.sender_id
            );
            ctx.config.replies.denied(role).to_string()
        }
        Err(CommandError::Downstream(e)) => {
            error!("{cmd:?} failed for {}: {e}", ctx.msg.sender_id);
            ctx.config.replies.error.clone()
        }
    };

    if let Err(e) = ctx.reply(&reply).await {
        error!("failed to send reply for {cmd:?}: {e:?}");
    }
}

impl CommandContext<'_> {
    /// Text reply quoting the triggering message.
    pub async fn reply(&self, text: &str) -> CommandResult {
        self.messenger
            .send_text(&self.msg.chat_id, text, Some(&self.msg.key()))
            .await?;
        Ok(())
    }

    /// Media reply quoting the triggering message.
    pub async fn reply_media(&self, media: OutgoingMedia) -> CommandResult {
        self.messenger
            .send_media(&self.msg.chat_id, media, Some(&self.msg.key()))
            .await?;
        Ok(())
    }

    /// Fail with `PermissionDenied` unless the sender holds `role`.
    pub fn require(&self, role: Role) -> CommandResult {
        if self.facts.satisfies(role, self.msg.is_group) {
            Ok(())
        } else {
            Err(CommandError::PermissionDenied(role))
        }
    }

    /// Free-form argument text, or a usage error with `hint`.
    pub fn text_or(&self, hint: &str) -> Result<&str, CommandError> {
        match self.parsed.text.as_str() {
            "" => Err(CommandError::Usage(hint.to_string())),
            text => Ok(text),
        }
    }

    /// The quoted message's media, else the message's own media.
    pub fn target_media(&self) -> Option<(&str, &MediaInfo)> {
        self.msg.target_media()
    }

    /// Key of the quoted message, if any.
    pub fn quoted_key(&self) -> Option<MessageKey> {
        self.msg.quoted_key(self.own_id)
    }

    /// Configured command prefix, for building follow-up commands.
    pub fn prefix(&self) -> &str {
        &self.config.bot.prefix
    }
}
