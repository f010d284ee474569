//! Downloader handlers: Pinterest, Instagram, MediaFire, TikTok, Spotify, YouTube.

use super::{CommandContext, CommandError, CommandResult};
use tracing::debug;
use zayden_core::{
    message::{ListMenu, ListRow, ListSection, MediaKind, MediaSource, OutgoingMedia},
    permissions::Role,
    traits::YoutubeFormat,
};

/// Most images one Pinterest request may return.
pub(super) const MAX_PINTEREST_COUNT: usize = 10;

/// Split `query|count` into the query and a count in `1..=MAX`.
///
/// A missing or unparseable count means one image. `None` count signals
/// a request above the limit.
pub(super) fn parse_pinterest_args(text: &str) -> (String, Option<usize>) {
    let (query, count) = match text.split_once('|') {
        Some((q, c)) => (q.trim(), c.trim().parse::<usize>().unwrap_or(1)),
        None => (text.trim(), 1),
    };
    let count = (count <= MAX_PINTEREST_COUNT).then_some(count.max(1));
    (query.to_string(), count)
}

/// Whether `text` contains any blocked fragment.
pub(super) fn is_blocked(text: &str, rules: &[String]) -> bool {
    let lower = text.to_lowercase();
    rules
        .iter()
        .filter(|r| !r.is_empty())
        .any(|r| lower.contains(&r.to_lowercase()))
}

pub(super) async fn pinterest(ctx: &CommandContext<'_>) -> CommandResult {
    let replies = &ctx.config.replies;
    let text = ctx.text_or(&replies.need_query)?;
    if is_blocked(text, &ctx.lists.pinterest.list().await) {
        return ctx.reply(&replies.not_allowed).await;
    }
    let (query, count) = parse_pinterest_args(text);
    if query.is_empty() {
        return Err(CommandError::Usage(replies.need_query.clone()));
    }
    let Some(count) = count else {
        return Err(CommandError::Usage(format!(
            "Max {MAX_PINTEREST_COUNT} images per request."
        )));
    };

    let results = ctx.scraper.pinterest(&query).await?;
    if results.is_empty() {
        return ctx.reply(&replies.not_found).await;
    }
    for (i, url) in results.into_iter().take(count).enumerate() {
        let mut media = OutgoingMedia::new(MediaKind::Image, MediaSource::Url(url));
        if i == 0 {
            media = media.with_caption(format!("Pinterest: {}", query.to_uppercase()));
        }
        ctx.reply_media(media).await?;
    }
    Ok(())
}

pub(super) async fn add_pin_rule(ctx: &CommandContext<'_>) -> CommandResult {
    ctx.require(Role::Owner)?;
    let rule = ctx.text_or("Please enter the rule.")?;
    if ctx.lists.pinterest.add(rule).await? {
        ctx.reply("Rule added.").await
    } else {
        ctx.reply("Rule already exists.").await
    }
}

pub(super) async fn del_pin_rule(ctx: &CommandContext<'_>) -> CommandResult {
    ctx.require(Role::Owner)?;
    let rule = ctx.text_or("Please enter the rule.")?;
    if ctx.lists.pinterest.remove(rule).await? {
        ctx.reply("Rule removed.").await
    } else {
        ctx.reply("There is no such rule.").await
    }
}

/// Instagram CDN links ending in an image extension, or on the image host.
fn is_instagram_image(url: &str) -> bool {
    let path = url.split('?').next().unwrap_or(url).to_lowercase();
    url.contains("scontent.cdninstagram.com")
        || [".jpg", ".jpeg", ".png", ".webp", ".heic"]
            .iter()
            .any(|ext| path.ends_with(ext))
}

async fn send_instagram_media(ctx: &CommandContext<'_>, urls: Vec<String>) -> CommandResult {
    if urls.is_empty() {
        return ctx.reply(&ctx.config.replies.not_found).await;
    }
    for url in urls {
        let kind = if is_instagram_image(&url) {
            MediaKind::Image
        } else {
            MediaKind::Video
        };
        debug!("sending instagram {kind:?}: {url}");
        ctx.reply_media(OutgoingMedia::new(kind, MediaSource::Url(url)))
            .await?;
    }
    Ok(())
}

pub(super) async fn instagram(ctx: &CommandContext<'_>) -> CommandResult {
    let url = ctx.text_or(&ctx.config.replies.need_url)?;
    if !url.contains("instagram.com") {
        return Err(CommandError::Usage(ctx.config.replies.invalid_url.clone()));
    }
    let urls = ctx.scraper.instagram(url).await?;
    send_instagram_media(ctx, urls).await
}

pub(super) async fn instagram_story(ctx: &CommandContext<'_>) -> CommandResult {
    let username = ctx.text_or("Please send an Instagram username.")?;
    let username = username.trim_start_matches('@');
    let urls = ctx.scraper.instagram_stories(username).await?;
    send_instagram_media(ctx, urls).await
}

pub(super) async fn mediafire(ctx: &CommandContext<'_>) -> CommandResult {
    let url = ctx.text_or(&ctx.config.replies.need_url)?;
    if !url.to_lowercase().contains("mediafire.com") {
        return Err(CommandError::Usage(ctx.config.replies.invalid_url.clone()));
    }
    let file = ctx.scraper.mediafire(url).await?;
    let caption = format!(
        "*Name:* {}\n*Size:* {}\n*Download:* {}",
        file.name.as_deref().unwrap_or("-"),
        file.size.as_deref().unwrap_or("-"),
        file.url
    );
    let mut media = OutgoingMedia::new(MediaKind::Document, MediaSource::Url(file.url))
        .with_caption(caption);
    if let Some(mimetype) = file.mimetype {
        media = media.with_mimetype(mimetype);
    }
    ctx.reply_media(media).await
}

fn require_tiktok_url<'a>(ctx: &'a CommandContext<'_>) -> Result<&'a str, CommandError> {
    let url = ctx.text_or(&ctx.config.replies.need_url)?;
    if !url.contains("tiktok.com") {
        return Err(CommandError::Usage(ctx.config.replies.invalid_url.clone()));
    }
    Ok(url)
}

pub(super) async fn tiktok_menu(ctx: &CommandContext<'_>) -> CommandResult {
    let url = ctx.text_or(&ctx.config.replies.need_url)?;
    let prefix = ctx.prefix();
    let menu = ListMenu {
        title: "TikTok Downloader".into(),
        footer: ctx.config.bot.name.clone(),
        sections: vec![ListSection {
            title: "Choose one".into(),
            rows: vec![
                ListRow {
                    title: "TikTok video".into(),
                    description: "Download the video".into(),
                    command: format!("{prefix}tiktokdl {url}"),
                },
                ListRow {
                    title: "TikTok audio".into(),
                    description: "Download the audio".into(),
                    command: format!("{prefix}tiktokaudiodl {url}"),
                },
            ],
        }],
    };
    ctx.messenger
        .send_list(&ctx.msg.chat_id, &menu, Some(&ctx.msg.key()))
        .await?;
    Ok(())
}

pub(super) async fn tiktok_video(ctx: &CommandContext<'_>) -> CommandResult {
    let url = require_tiktok_url(ctx)?;
    let post = ctx.scraper.tiktok(url).await?;
    let Some(video) = post.video_url else {
        return ctx.reply(&ctx.config.replies.not_found).await;
    };
    let mut media = OutgoingMedia::new(MediaKind::Video, MediaSource::Url(video));
    if !post.caption.is_empty() {
        media = media.with_caption(post.caption);
    }
    ctx.reply_media(media).await
}

pub(super) async fn tiktok_audio(ctx: &CommandContext<'_>) -> CommandResult {
    let url = require_tiktok_url(ctx)?;
    let post = ctx.scraper.tiktok(url).await?;
    let Some(audio) = post.audio_url else {
        return ctx.reply(&ctx.config.replies.not_found).await;
    };
    let media =
        OutgoingMedia::new(MediaKind::Audio, MediaSource::Url(audio)).with_mimetype("audio/mp4");
    ctx.reply_media(media).await
}

pub(super) async fn spotify(ctx: &CommandContext<'_>) -> CommandResult {
    let query = ctx.text_or(&ctx.config.replies.need_query)?;
    let hits = ctx.scraper.spotify_search(query).await?;
    if hits.is_empty() {
        return ctx.reply(&ctx.config.replies.not_found).await;
    }
    let prefix = ctx.prefix();
    let menu = ListMenu {
        title: "Spotify Search".into(),
        footer: ctx.config.bot.name.clone(),
        sections: vec![ListSection {
            title: "Results".into(),
            rows: hits
                .into_iter()
                .map(|hit| ListRow {
                    title: hit.title.to_uppercase(),
                    description: hit.description.to_uppercase(),
                    command: format!("{prefix}spotifydl {}", hit.url),
                })
                .collect(),
        }],
    };
    ctx.messenger
        .send_list(&ctx.msg.chat_id, &menu, Some(&ctx.msg.key()))
        .await?;
    Ok(())
}

pub(super) async fn spotify_download(ctx: &CommandContext<'_>) -> CommandResult {
    let url = ctx.text_or(&ctx.config.replies.need_url)?;
    let file = ctx.scraper.spotify_download(url).await?;
    let media = OutgoingMedia::new(MediaKind::Audio, MediaSource::Url(file.url))
        .with_mimetype(file.mimetype.unwrap_or_else(|| "audio/mpeg".into()));
    ctx.reply_media(media).await
}

pub(super) async fn youtube_play(ctx: &CommandContext<'_>) -> CommandResult {
    let query = ctx.text_or(&ctx.config.replies.need_query)?;
    let hits = ctx.scraper.youtube_search(query).await?;
    if hits.is_empty() {
        return ctx.reply(&ctx.config.replies.not_found).await;
    }
    let prefix = ctx.prefix();
    let menu = ListMenu {
        title: "YouTube Search".into(),
        footer: ctx.config.bot.name.clone(),
        sections: vec![ListSection {
            title: "Results".into(),
            rows: hits
                .into_iter()
                .map(|hit| ListRow {
                    title: hit.title.to_uppercase(),
                    description: hit.description,
                    command: format!("{prefix}ytdl {}", hit.url),
                })
                .collect(),
        }],
    };
    ctx.messenger
        .send_list(&ctx.msg.chat_id, &menu, Some(&ctx.msg.key()))
        .await?;
    Ok(())
}

pub(super) async fn youtube(ctx: &CommandContext<'_>) -> CommandResult {
    let url = ctx.text_or(&ctx.config.replies.need_url)?;
    let info = ctx.scraper.youtube_info(url).await?;
    let heading = format!("*{}*\n\n{}", info.title.to_uppercase(), info.description);

    if let Some(thumbnail) = info.thumbnail {
        let media = OutgoingMedia::new(MediaKind::Image, MediaSource::Url(thumbnail))
            .with_caption(heading.clone());
        ctx.reply_media(media).await?;
    }

    let prefix = ctx.prefix();
    let menu = ListMenu {
        title: info.title,
        footer: ctx.config.bot.name.clone(),
        sections: vec![ListSection {
            title: "Choose a format".into(),
            rows: vec![
                ListRow {
                    title: "MP3".into(),
                    description: "Download as MP3 audio".into(),
                    command: format!("{prefix}ytmp3 {url}"),
                },
                ListRow {
                    title: "MP4".into(),
                    description: "Download as MP4 video".into(),
                    command: format!("{prefix}ytmp4 {url}"),
                },
            ],
        }],
    };
    ctx.messenger
        .send_list(&ctx.msg.chat_id, &menu, Some(&ctx.msg.key()))
        .await?;
    Ok(())
}

pub(super) async fn youtube_file(ctx: &CommandContext<'_>, format: YoutubeFormat) -> CommandResult {
    let url = ctx.text_or(&ctx.config.replies.need_url)?;
    ctx.reply(&ctx.config.replies.wait).await?;
    let file = ctx.scraper.youtube_download(url, format).await?;

    let (kind, default_mimetype) = match format {
        YoutubeFormat::Audio => (MediaKind::Audio, "audio/mpeg"),
        YoutubeFormat::Video => (MediaKind::Video, "video/mp4"),
    };
    let mut media = OutgoingMedia::new(kind, MediaSource::Url(file.url))
        .with_mimetype(file.mimetype.unwrap_or_else(|| default_mimetype.into()));
    if let (YoutubeFormat::Video, Some(name)) = (format, file.name) {
        media = media.with_caption(name);
    }
    ctx.reply_media(media).await
}
