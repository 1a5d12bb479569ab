//! Conversation authorization.
//!
//! Pure decisions over a chat's kind and the caller's (and target's)
//! participant records. Backends load the records inside their transaction
//! and apply the returned verdict; no rule here touches storage.
//!
//! A caller with no active participant record is always denied, whether or
//! not the chat exists, so non-members cannot probe chat IDs.

use uuid::Uuid;

use crate::{
  Entity, Error, Result,
  chat::{ChatKind, ChatRole, Participant},
};

/// Return the caller's record if it is active.
pub fn require_active(caller: Option<&Participant>) -> Result<&Participant> {
  match caller {
    Some(p) if p.is_active() => Ok(p),
    _ => Err(Error::forbidden("not a participant of this chat")),
  }
}

/// Reading the message history.
pub fn authorize_read(caller: Option<&Participant>) -> Result<()> {
  require_active(caller).map(|_| ())
}

/// Posting a message.
pub fn authorize_send(caller: Option<&Participant>) -> Result<()> {
  require_active(caller).map(|_| ())
}

/// Changing chat metadata (the title).
///
/// Direct chats have no admin concept, so any active participant may edit.
pub fn authorize_update(kind: ChatKind, caller: Option<&Participant>) -> Result<()> {
  let caller = require_active(caller)?;
  match kind {
    ChatKind::Direct => Ok(()),
    ChatKind::Group if caller.role.can_manage() => Ok(()),
    ChatKind::Group => Err(Error::forbidden(
      "only owners and admins may update a group chat",
    )),
  }
}

/// What adding a user to a chat should do to the target's record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddPlan {
  /// The target is already an active participant; nothing to write.
  AlreadyActive,
  /// The target left earlier; clear `left_at` on the existing record.
  Revive,
  /// The target was never a participant; insert a `member` record.
  Insert,
}

/// Adding `target` to a chat on behalf of `caller`.
pub fn authorize_add(
  kind: ChatKind,
  caller: Option<&Participant>,
  target: Option<&Participant>,
) -> Result<AddPlan> {
  let caller = require_active(caller)?;
  if kind == ChatKind::Direct {
    return Err(Error::invalid("cannot add participants to a direct chat"));
  }
  if !caller.role.can_manage() {
    return Err(Error::forbidden("only owners and admins may add participants"));
  }
  Ok(match target {
    Some(p) if p.is_active() => AddPlan::AlreadyActive,
    Some(_) => AddPlan::Revive,
    None => AddPlan::Insert,
  })
}

/// How a participant leaves a chat.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Removal {
  /// The caller removes themselves.
  Leave,
  /// The caller removes someone else.
  Kick,
}

/// Removing `target_id` from a chat on behalf of `caller_id`.
///
/// Leaving is always allowed for an active participant, whatever their role
/// and whatever the chat kind; a sole owner leaving leaves the chat ownerless.
/// Removing others needs a manager role, a group chat, and a non-owner target.
pub fn authorize_remove(
  kind: ChatKind,
  caller_id: Uuid,
  caller: Option<&Participant>,
  target_id: Uuid,
  target: Option<&Participant>,
) -> Result<Removal> {
  let caller = require_active(caller)?;
  if caller_id == target_id {
    return Ok(Removal::Leave);
  }
  if !caller.role.can_manage() {
    return Err(Error::forbidden(
      "only owners and admins may remove participants",
    ));
  }
  if kind == ChatKind::Direct {
    return Err(Error::invalid(
      "cannot remove participants from a direct chat",
    ));
  }
  let target = match target {
    Some(p) if p.is_active() => p,
    _ => return Err(Error::NotFound(Entity::Participant)),
  };
  if target.role == ChatRole::Owner {
    return Err(Error::invalid("the chat owner cannot be removed"));
  }
  Ok(Removal::Kick)
}

#[cfg(test)]
mod tests {
  use chrono::Utc;

  use super::*;

  fn participant(user_id: Uuid, role: ChatRole) -> Participant {
    Participant {
      chat_id: Uuid::nil(),
      user_id,
      role,
      joined_at: Utc::now(),
      left_at: None,
    }
  }

  fn left(mut p: Participant) -> Participant {
    p.left_at = Some(Utc::now());
    p
  }

  // ── Read / send ─────────────────────────────────────────────────────────

  #[test]
  fn non_participants_and_leavers_cannot_read_or_send() {
    let me = participant(Uuid::new_v4(), ChatRole::Member);
    assert!(authorize_read(Some(&me)).is_ok());
    assert!(authorize_send(Some(&me)).is_ok());

    assert!(matches!(authorize_read(None), Err(Error::Forbidden(_))));
    let gone = left(me);
    assert!(matches!(authorize_read(Some(&gone)), Err(Error::Forbidden(_))));
    assert!(matches!(authorize_send(Some(&gone)), Err(Error::Forbidden(_))));
  }

  // ── Update ──────────────────────────────────────────────────────────────

  #[test]
  fn group_update_needs_manager_role() {
    let member = participant(Uuid::new_v4(), ChatRole::Member);
    let admin = participant(Uuid::new_v4(), ChatRole::Admin);
    assert!(authorize_update(ChatKind::Group, Some(&admin)).is_ok());
    assert!(matches!(
      authorize_update(ChatKind::Group, Some(&member)),
      Err(Error::Forbidden(_))
    ));
  }

  #[test]
  fn direct_update_allows_any_active_participant() {
    let member = participant(Uuid::new_v4(), ChatRole::Member);
    assert!(authorize_update(ChatKind::Direct, Some(&member)).is_ok());
    assert!(authorize_update(ChatKind::Direct, None).is_err());
  }

  // ── Add ─────────────────────────────────────────────────────────────────

  #[test]
  fn adding_to_direct_chat_is_invalid() {
    let owner = participant(Uuid::new_v4(), ChatRole::Owner);
    assert!(matches!(
      authorize_add(ChatKind::Direct, Some(&owner), None),
      Err(Error::InvalidOperation(_))
    ));
  }

  #[test]
  fn add_plans_follow_target_state() {
    let owner = participant(Uuid::new_v4(), ChatRole::Owner);
    let target = participant(Uuid::new_v4(), ChatRole::Member);
    let add = |t: Option<&Participant>| authorize_add(ChatKind::Group, Some(&owner), t).unwrap();

    assert_eq!(add(None), AddPlan::Insert);
    assert_eq!(add(Some(&target)), AddPlan::AlreadyActive);
    assert_eq!(add(Some(&left(target.clone()))), AddPlan::Revive);
  }

  #[test]
  fn members_cannot_add() {
    let member = participant(Uuid::new_v4(), ChatRole::Member);
    assert!(matches!(
      authorize_add(ChatKind::Group, Some(&member), None),
      Err(Error::Forbidden(_))
    ));
  }

  // ── Remove ──────────────────────────────────────────────────────────────

  #[test]
  fn anyone_active_may_leave() {
    for kind in [ChatKind::Direct, ChatKind::Group] {
      for role in [ChatRole::Owner, ChatRole::Admin, ChatRole::Member] {
        let me = participant(Uuid::new_v4(), role);
        let verdict = authorize_remove(kind, me.user_id, Some(&me), me.user_id, Some(&me));
        assert_eq!(verdict.unwrap(), Removal::Leave);
      }
    }
  }

  #[test]
  fn member_removing_owner_is_denied_in_both_kinds() {
    let owner = participant(Uuid::new_v4(), ChatRole::Owner);
    let member = participant(Uuid::new_v4(), ChatRole::Member);
    for kind in [ChatKind::Direct, ChatKind::Group] {
      let verdict =
        authorize_remove(kind, member.user_id, Some(&member), owner.user_id, Some(&owner));
      assert!(matches!(verdict, Err(Error::Forbidden(_))));
    }
  }

  #[test]
  fn admin_cannot_remove_owner() {
    let owner = participant(Uuid::new_v4(), ChatRole::Owner);
    let admin = participant(Uuid::new_v4(), ChatRole::Admin);
    let verdict = authorize_remove(
      ChatKind::Group,
      admin.user_id,
      Some(&admin),
      owner.user_id,
      Some(&owner),
    );
    assert!(matches!(verdict, Err(Error::InvalidOperation(_))));
  }

  #[test]
  fn owner_kicks_member_from_group_but_not_direct() {
    let owner = participant(Uuid::new_v4(), ChatRole::Owner);
    let member = participant(Uuid::new_v4(), ChatRole::Member);
    let kick = |kind| {
      authorize_remove(kind, owner.user_id, Some(&owner), member.user_id, Some(&member))
    };
    assert_eq!(kick(ChatKind::Group).unwrap(), Removal::Kick);
    assert!(matches!(kick(ChatKind::Direct), Err(Error::InvalidOperation(_))));
  }

  #[test]
  fn removing_an_absent_target_is_not_found() {
    let owner = participant(Uuid::new_v4(), ChatRole::Owner);
    let gone = left(participant(Uuid::new_v4(), ChatRole::Member));
    let verdict = authorize_remove(
      ChatKind::Group,
      owner.user_id,
      Some(&owner),
      gone.user_id,
      Some(&gone),
    );
    assert!(matches!(verdict, Err(Error::NotFound(Entity::Participant))));
  }

  #[test]
  fn leavers_cannot_remove_anyone() {
    let owner = left(participant(Uuid::new_v4(), ChatRole::Owner));
    let member = participant(Uuid::new_v4(), ChatRole::Member);
    let verdict = authorize_remove(
      ChatKind::Group,
      owner.user_id,
      Some(&owner),
      member.user_id,
      Some(&member),
    );
    assert!(matches!(verdict, Err(Error::Forbidden(_))));
  }
}
