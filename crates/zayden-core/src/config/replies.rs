use serde::{Deserialize, Serialize};

use crate::permissions::Role;

/// User-facing reply strings. Every field can be overridden in `[replies]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Replies {
    pub wait: String,
    pub success: String,
    pub error: String,
    pub not_found: String,
    /// Query hit the Pinterest block-list.
    pub not_allowed: String,
    pub busy: String,
    pub too_large: String,
    pub invalid_url: String,

    pub owner_only: String,
    pub premium_only: String,
    pub group_only: String,
    pub admin_only: String,
    pub bot_admin_only: String,

    pub need_url: String,
    pub need_query: String,
    pub need_prompt: String,
    pub need_text: String,
    pub need_image: String,
    pub need_audio: String,
    pub need_media: String,
}

impl Default for Replies {
    fn default() -> Self {
        Self {
            wait: "Please wait, processing...".into(),
            success: "Done.".into(),
            error: "Something went wrong, please try again later.".into(),
            not_found: "Nothing found.".into(),
            not_allowed: "That query is not allowed.".into(),
            busy: "Please wait, there is still something in process.".into(),
            too_large: "The file is too large.".into(),
            invalid_url: "Invalid URL.".into(),
            owner_only: "This command is for the bot owner only.".into(),
            premium_only: "This command is for premium users only.".into(),
            group_only: "This command can only be used in groups.".into(),
            admin_only: "This command is for group admins only.".into(),
            bot_admin_only: "The bot must be a group admin to do that.".into(),
            need_url: "Please send a URL.".into(),
            need_query: "Please enter a search query.".into(),
            need_prompt: "Please enter a prompt.".into(),
            need_text: "Please enter the text.".into(),
            need_image: "Send or reply to an image.".into(),
            need_audio: "Send or reply to an audio message.".into(),
            need_media: "Send or reply to a media message.".into(),
        }
    }
}

impl Replies {
    /// Denial reply for a missing role.
    pub fn denied(&self, role: Role) -> &str {
        match role {
            Role::Owner => &self.owner_only,
            Role::Premium => &self.premium_only,
            Role::GroupChat => &self.group_only,
            Role::GroupAdmin => &self.admin_only,
            Role::BotGroupAdmin => &self.bot_admin_only,
        }
    }
}
