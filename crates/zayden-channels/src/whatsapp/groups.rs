//! Group queries and membership changes through the WhatsApp client.

use super::send::parse_jid;
use wacore_binary::jid::Jid;
use whatsapp_rust::client::Client;
use zayden_core::{
    error::ZaydenError,
    group::{GroupMetadata, Participant, ParticipantRole},
    message::ParticipantAction,
};

/// Fetch subject and participants of a group.
pub(super) async fn fetch_metadata(client: &Client, group: &str) -> Result<GroupMetadata, ZaydenError> {
    let jid = parse_jid(group)?;
    let info = client
        .groups()
        .get_metadata(&jid)
        .await
        .map_err(|e| ZaydenError::Channel(format!("group metadata for {group} failed: {e}")))?;

    let participants = info
        .participants
        .iter()
        .map(|p| Participant {
            id: p.jid.to_string(),
            role: if p.is_admin {
                ParticipantRole::Admin
            } else {
                ParticipantRole::Member
            },
        })
        .collect();

    Ok(GroupMetadata {
        id: group.to_string(),
        subject: info.subject.clone(),
        owner: None,
        participants,
    })
}

/// Add or remove participants. Returns nothing on partial success; the
/// server reports per-user failures that are only logged.
pub(super) async fn update_participants(
    client: &Client,
    group: &str,
    users: &[String],
    action: ParticipantAction,
) -> Result<(), ZaydenError> {
    let jid = parse_jid(group)?;
    let members: Vec<Jid> = users
        .iter()
        .map(|u| parse_jid(u))
        .collect::<Result<_, _>>()?;

    let result = match action {
        ParticipantAction::Add => client.groups().add_participants(&jid, &members).await,
        ParticipantAction::Remove => client.groups().remove_participants(&jid, &members).await,
    };
    result
        .map(|_| ())
        .map_err(|e| ZaydenError::Channel(format!("group {action:?} in {group} failed: {e}")))
}

/// The logged-in account's own JID, without device suffix.
pub(super) async fn own_jid(client: &Client) -> Option<String> {
    client
        .get_pn()
        .await
        .map(|jid| format!("{}@{}", jid.user, jid.server))
}
