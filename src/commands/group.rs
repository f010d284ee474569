//! Group moderation handlers.

use super::{CommandContext, CommandError, CommandResult};
use tracing::{info, warn};
use zayden_core::{message::ParticipantAction, permissions::Role, phone};

/// Admin-only group commands need all three roles, checked in this order.
fn require_group_admin(ctx: &CommandContext<'_>) -> CommandResult {
    ctx.require(Role::GroupChat)?;
    ctx.require(Role::GroupAdmin)?;
    ctx.require(Role::BotGroupAdmin)
}

pub(super) async fn antilink(ctx: &CommandContext<'_>) -> CommandResult {
    require_group_admin(ctx)?;
    let chat = &ctx.msg.chat_id;
    match ctx.parsed.args.first().map(|a| a.to_lowercase()).as_deref() {
        Some("on") => {
            if ctx.lists.antilink.add(chat).await? {
                info!("anti-link enabled in {chat}");
                ctx.reply("Anti-link enabled in this group.").await
            } else {
                ctx.reply("Anti-link is already enabled in this group.").await
            }
        }
        Some("off") => {
            if ctx.lists.antilink.remove(chat).await? {
                info!("anti-link disabled in {chat}");
                ctx.reply("Anti-link disabled in this group.").await
            } else {
                ctx.reply("Anti-link is already disabled in this group.").await
            }
        }
        _ => Err(CommandError::Usage(format!(
            "Usage: {}antilink on|off",
            ctx.prefix()
        ))),
    }
}

pub(super) async fn hidetag(ctx: &CommandContext<'_>) -> CommandResult {
    ctx.require(Role::GroupChat)?;
    if !(ctx.facts.is_group_admin || ctx.facts.is_owner) {
        return Err(CommandError::PermissionDenied(Role::GroupAdmin));
    }
    ctx.require(Role::BotGroupAdmin)?;

    let text = match (ctx.parsed.text.as_str(), ctx.msg.quoted.as_ref()) {
        ("", Some(q)) if !q.body.is_empty() => q.body.as_str(),
        ("", _) => return Err(CommandError::Usage("Please enter the message.".into())),
        (text, _) => text,
    };
    let mentions = ctx
        .group
        .map(|g| g.participant_ids())
        .unwrap_or_default();
    ctx.messenger
        .send_mentions(&ctx.msg.chat_id, text, &mentions)
        .await?;
    Ok(())
}

/// Target user of kick/add: first mention, else quoted author, else the
/// number typed as argument.
pub(super) fn target_user(ctx: &CommandContext<'_>) -> Option<String> {
    if let Some(first) = ctx.msg.mentioned.first() {
        return Some(first.clone());
    }
    if let Some(ref q) = ctx.msg.quoted {
        if !q.sender_id.is_empty() {
            return Some(q.sender_id.clone());
        }
    }
    let digits = phone::digits(&ctx.parsed.text);
    (!digits.is_empty()).then(|| phone::to_user_jid(&digits))
}

pub(super) async fn kick(ctx: &CommandContext<'_>) -> CommandResult {
    require_group_admin(ctx)?;
    let Some(user) = target_user(ctx) else {
        return Err(CommandError::Usage(
            "Please tag the person you want to kick.".into(),
        ));
    };
    if phone::same_user(&user, &ctx.msg.sender_id) {
        return ctx.reply("You can't kick yourself.").await;
    }
    match ctx
        .messenger
        .update_participants(&ctx.msg.chat_id, &[user.clone()], ParticipantAction::Remove)
        .await
    {
        Ok(()) => ctx.reply("Member removed.").await,
        Err(e) => {
            warn!("kick {user} from {} failed: {e}", ctx.msg.chat_id);
            ctx.reply("Failed to remove member.").await
        }
    }
}

pub(super) async fn add(ctx: &CommandContext<'_>) -> CommandResult {
    require_group_admin(ctx)?;
    let Some(user) = target_user(ctx) else {
        return Err(CommandError::Usage(
            "Please tag or type the number you want to add.".into(),
        ));
    };
    match ctx
        .messenger
        .update_participants(&ctx.msg.chat_id, &[user.clone()], ParticipantAction::Add)
        .await
    {
        Ok(()) => ctx.reply("Member added.").await,
        Err(e) => {
            warn!("add {user} to {} failed: {e}", ctx.msg.chat_id);
            ctx.reply("Failed to add member.").await
        }
    }
}

/// Delete the quoted message. The bot's own messages need no rights;
/// anyone else's need the bot and the sender to be admins.
pub(super) async fn delete(ctx: &CommandContext<'_>) -> CommandResult {
    let Some(key) = ctx.quoted_key() else {
        return Err(CommandError::Usage("Reply to the message to delete.".into()));
    };
    if !key.from_me {
        ctx.require(Role::BotGroupAdmin)?;
        ctx.require(Role::GroupAdmin)?;
    }
    ctx.messenger.delete_message(&key).await?;
    Ok(())
}
