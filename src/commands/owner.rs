//! Premium list management, owner only.

use super::{CommandContext, CommandError, CommandResult};
use tracing::info;
use zayden_core::{permissions::Role, phone};

/// Digits of the argument text (`+62 812-...` works), or a usage error.
fn number_arg(ctx: &CommandContext<'_>) -> Result<String, CommandError> {
    let digits = phone::digits(&ctx.parsed.text);
    if digits.is_empty() {
        return Err(CommandError::Usage("Please enter the number.".into()));
    }
    Ok(digits)
}

pub(super) async fn add_premium(ctx: &CommandContext<'_>) -> CommandResult {
    ctx.require(Role::Owner)?;
    let number = number_arg(ctx)?;
    if ctx.lists.premium.contains_number(&number).await {
        return ctx.reply("User is already premium.").await;
    }
    ctx.lists.premium.add(&number).await?;
    info!("premium added: {number}");
    ctx.reply("Premium added.").await
}

pub(super) async fn del_premium(ctx: &CommandContext<'_>) -> CommandResult {
    ctx.require(Role::Owner)?;
    let number = number_arg(ctx)?;
    if ctx.lists.premium.remove_number(&number).await? {
        info!("premium removed: {number}");
        ctx.reply("Premium removed.").await
    } else {
        ctx.reply("User is not premium.").await
    }
}

pub(super) async fn list_premium(ctx: &CommandContext<'_>) -> CommandResult {
    ctx.require(Role::Owner)?;
    let members = ctx.lists.premium.list().await;
    let mut txt = "*Premium Members*\n".to_string();
    if members.is_empty() {
        txt.push_str("\n(none)");
    }
    for (i, member) in members.iter().enumerate() {
        txt.push_str(&format!("\n{}. {}", i + 1, phone::digits(member)));
    }
    ctx.reply(&txt).await
}
