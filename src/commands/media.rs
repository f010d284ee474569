//! Media conversion handlers: stickers, audio/image extraction, view-once.

use super::{CommandContext, CommandError, CommandResult};
use zayden_core::{
    message::{MediaKind, MediaSource, OutgoingMedia},
    traits::StickerPack,
};

/// Mimetype guessed from magic bytes, for renderer output.
pub(super) fn sniff_mimetype(data: &[u8]) -> &'static str {
    if data.starts_with(b"RIFF") && data.get(8..12) == Some(b"WEBP") {
        "image/webp"
    } else if data.starts_with(&[0x89, b'P', b'N', b'G']) {
        "image/png"
    } else if data.starts_with(&[0xFF, 0xD8, 0xFF]) {
        "image/jpeg"
    } else if data.starts_with(b"GIF8") {
        "image/gif"
    } else if data.get(4..8) == Some(b"ftyp") {
        "video/mp4"
    } else {
        "application/octet-stream"
    }
}

/// Pack metadata from `name|author` style text, else the configured one.
pub(super) fn sticker_pack(ctx: &CommandContext<'_>) -> StickerPack {
    let text = ctx.parsed.text.trim();
    if text.is_empty() {
        return default_pack(ctx);
    }
    let mut parts = text.splitn(2, [',', '|', '-', '+', '&']);
    StickerPack {
        name: parts.next().unwrap_or_default().trim().to_string(),
        publisher: parts.next().unwrap_or_default().trim().to_string(),
    }
}

fn default_pack(ctx: &CommandContext<'_>) -> StickerPack {
    StickerPack {
        name: ctx.config.bot.pack_name.clone(),
        publisher: ctx.config.bot.pack_author.clone(),
    }
}

async fn send_sticker(ctx: &CommandContext<'_>, webp: Vec<u8>) -> CommandResult {
    let media = OutgoingMedia::new(MediaKind::Sticker, MediaSource::Bytes(webp))
        .with_mimetype("image/webp");
    ctx.reply_media(media).await
}

pub(super) async fn sticker(ctx: &CommandContext<'_>) -> CommandResult {
    let replies = &ctx.config.replies;
    let Some((id, media)) = ctx.target_media() else {
        return Err(CommandError::Usage(replies.need_media.clone()));
    };
    let mimetype = media.mimetype.clone();
    if !(mimetype.starts_with("image/") || mimetype.starts_with("video/")) {
        return Err(CommandError::Usage(replies.need_image.clone()));
    }
    let data = ctx.messenger.download_media(id).await?;
    let webp = ctx
        .converter
        .to_sticker(data, &mimetype, &sticker_pack(ctx))
        .await?;
    send_sticker(ctx, webp).await
}

pub(super) async fn quotely(ctx: &CommandContext<'_>) -> CommandResult {
    let text = ctx.text_or("Please enter the message.")?;
    let name = match ctx.msg.push_name.as_str() {
        "" => ctx.msg.sender_id.split('@').next().unwrap_or_default(),
        name => name,
    };
    let image = ctx.scraper.quote_image(text, name, None).await?;
    let webp = ctx
        .converter
        .to_sticker(image.clone(), sniff_mimetype(&image), &default_pack(ctx))
        .await?;
    send_sticker(ctx, webp).await
}

pub(super) async fn text_sticker(ctx: &CommandContext<'_>) -> CommandResult {
    let text = ctx.text_or(&ctx.config.replies.need_text)?;
    let image = ctx.scraper.text_image(&ctx.parsed.command, text).await?;
    let mimetype = sniff_mimetype(&image);
    let webp = ctx
        .converter
        .to_sticker(image, mimetype, &default_pack(ctx))
        .await?;
    send_sticker(ctx, webp).await
}

pub(super) async fn to_audio(ctx: &CommandContext<'_>) -> CommandResult {
    let replies = &ctx.config.replies;
    let Some((id, media)) = ctx.target_media() else {
        return Err(CommandError::Usage(replies.need_media.clone()));
    };
    if !(media.mimetype.starts_with("video/") || media.mimetype.starts_with("audio/")) {
        return Err(CommandError::Usage(replies.need_media.clone()));
    }
    let data = ctx.messenger.download_media(id).await?;
    ctx.reply(&replies.wait).await?;
    let audio = ctx.converter.to_audio(data).await?;
    let out = OutgoingMedia::new(MediaKind::Audio, MediaSource::Bytes(audio))
        .with_mimetype("audio/mpeg");
    ctx.reply_media(out).await
}

pub(super) async fn to_image(ctx: &CommandContext<'_>) -> CommandResult {
    let replies = &ctx.config.replies;
    let Some((id, media)) = ctx.target_media() else {
        return Err(CommandError::Usage(replies.need_media.clone()));
    };
    if media.mimetype != "image/webp" {
        return Err(CommandError::Usage("Reply to a sticker.".into()));
    }
    let data = ctx.messenger.download_media(id).await?;
    let png = ctx.converter.to_image(data).await?;
    let out = OutgoingMedia::new(MediaKind::Image, MediaSource::Bytes(png))
        .with_mimetype("image/png");
    ctx.reply_media(out).await
}

/// Re-send quoted view-once media as a normal message.
pub(super) async fn read_view_once(ctx: &CommandContext<'_>) -> CommandResult {
    let quoted = ctx
        .msg
        .quoted
        .as_ref()
        .filter(|q| q.media.as_ref().is_some_and(|m| m.view_once));
    let (Some(q), Some(media)) = (quoted, quoted.and_then(|q| q.media.as_ref())) else {
        return Err(CommandError::Usage(format!(
            "Reply to a view-once message with {}rvo",
            ctx.prefix()
        )));
    };
    let data = ctx.messenger.download_media(&q.id).await?;
    let mut out = OutgoingMedia::new(
        MediaKind::from_mimetype(&media.mimetype),
        MediaSource::Bytes(data),
    )
    .with_mimetype(media.mimetype.clone());
    if !q.body.is_empty() {
        out = out.with_caption(q.body.clone());
    }
    ctx.reply_media(out).await
}
