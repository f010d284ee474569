//! Utility handlers backed by the scraper service.

use super::{CommandContext, CommandError, CommandResult};
use tracing::info;
use zayden_core::message::{MediaKind, MediaSource, OutgoingMedia};

/// Busy class shared by the image enhancer aliases.
pub(super) const ENHANCE_CLASS: &str = "enhance";

pub(super) async fn short_url(ctx: &CommandContext<'_>) -> CommandResult {
    let url = ctx.text_or(&ctx.config.replies.need_url)?;
    let short = ctx.scraper.shorten_url(url).await?;
    ctx.reply(&short).await
}

pub(super) async fn fetch(ctx: &CommandContext<'_>) -> CommandResult {
    let url = ctx.text_or(&ctx.config.replies.need_url)?;
    if !url.starts_with("http://") && !url.starts_with("https://") {
        return Err(CommandError::Usage(ctx.config.replies.invalid_url.clone()));
    }
    let fetched = ctx
        .scraper
        .fetch(url, ctx.config.media.max_fetch_bytes)
        .await?;

    let content_type = fetched
        .content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_lowercase();
    if content_type.contains("text") || content_type.contains("json") || content_type.is_empty() {
        let body = String::from_utf8_lossy(&fetched.body);
        return ctx.reply(&body).await;
    }

    let media = OutgoingMedia::new(
        MediaKind::from_mimetype(&content_type),
        MediaSource::Bytes(fetched.body),
    )
    .with_mimetype(content_type);
    ctx.reply_media(media).await
}

pub(super) async fn ai(ctx: &CommandContext<'_>) -> CommandResult {
    let prompt = ctx.text_or(&ctx.config.replies.need_prompt)?;
    let answer = ctx.scraper.chat(prompt).await?;
    ctx.reply(&answer).await
}

/// Enhance the quoted (or attached) image.
///
/// The size check comes first, then the per-sender busy guard; the guard
/// is held until this function returns.
pub(super) async fn enhance(ctx: &CommandContext<'_>) -> CommandResult {
    let replies = &ctx.config.replies;
    let Some((id, media)) = ctx.target_media() else {
        return Err(CommandError::Usage(replies.need_image.clone()));
    };
    if media.size > ctx.config.media.max_enhance_bytes {
        return ctx.reply(&replies.too_large).await;
    }
    let Some(_guard) = ctx.busy.try_acquire(ENHANCE_CLASS, &ctx.msg.sender_id) else {
        return ctx.reply(&replies.busy).await;
    };
    if !(media.mimetype.contains("image") || media.mimetype.contains("webp")) {
        return Err(CommandError::Usage(replies.need_image.clone()));
    }

    let data = ctx.messenger.download_media(id).await?;
    info!("enhancing {} bytes for {}", data.len(), ctx.msg.sender_id);
    let enhanced = ctx.scraper.enhance_image(data).await?;
    let out = OutgoingMedia::new(MediaKind::Image, MediaSource::Bytes(enhanced))
        .with_caption(replies.success.clone());
    ctx.reply_media(out).await
}

pub(super) async fn what_music(ctx: &CommandContext<'_>) -> CommandResult {
    let replies = &ctx.config.replies;
    let Some((id, media)) = ctx.target_media() else {
        return Err(CommandError::Usage(replies.need_audio.clone()));
    };
    if !(media.mimetype.starts_with("audio/") || media.mimetype.starts_with("video/")) {
        return Err(CommandError::Usage(replies.need_audio.clone()));
    }
    let data = ctx.messenger.download_media(id).await?;
    match ctx.scraper.identify_music(data).await? {
        Some(result) => ctx.reply(&result).await,
        None => ctx.reply(&replies.not_found).await,
    }
}

pub(super) async fn to_url(ctx: &CommandContext<'_>) -> CommandResult {
    let replies = &ctx.config.replies;
    let Some((id, media)) = ctx.target_media() else {
        return Err(CommandError::Usage(replies.need_media.clone()));
    };
    if media.size > ctx.config.media.max_upload_bytes {
        return ctx.reply(&replies.too_large).await;
    }
    let mimetype = media.mimetype.clone();
    let data = ctx.messenger.download_media(id).await?;
    let url = ctx.scraper.upload(data, &mimetype).await?;
    ctx.reply(&url).await
}

pub(super) async fn khodam(ctx: &CommandContext<'_>) -> CommandResult {
    let name = ctx.text_or("Please enter the name.")?;
    let result = ctx.scraper.khodam(name).await?;
    ctx.reply(&result).await
}
