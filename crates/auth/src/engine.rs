//! The authorization engine: every access decision in one place.
//!
//! The rest of the system must not open-code role comparisons. Handlers fetch
//! the rows, then ask this module; the `AccessGuard` in the API crate owns the
//! lookup ordering (membership first, then existence/scope, then role).
//!
//! - No IO
//! - No panics
//! - No business logic beyond the access policy itself

use thiserror::Error;

use trackle_core::UserId;

use crate::{Membership, Role};

/// Structured denial reason.
///
/// Terminal for the calling operation. The API layer maps these to HTTP
/// statuses without re-deriving the reason:
/// `NotMember`/`InsufficientRole` → 403, `NotFoundInScope` → 404,
/// `InvalidAssignee` → 400.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum Deny {
    /// The principal has no membership row for the project. Returned even
    /// when the target id does not exist, so that project existence is never
    /// revealed to outsiders.
    #[error("not a member of this project")]
    NotMember,

    /// The resource does not exist, or belongs to a different scope than the
    /// one it was reached through. Only members ever see this.
    #[error("not found in this project")]
    NotFoundInScope,

    /// The principal is a member but lacks the role or ownership the action
    /// requires.
    #[error("insufficient role for this action")]
    InsufficientRole,

    /// A non-null assignee does not hold a membership in the project.
    #[error("assignee must be a project member")]
    InvalidAssignee,
}

/// Actions on a ticket.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TicketAction {
    Read,
    Update,
    /// Changing the assignee specifically. Stricter than `Update`.
    Reassign,
    Delete,
}

/// Actions on a comment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommentAction {
    Read,
    Create,
    Delete,
}

/// The facts about a ticket the policy needs.
///
/// A view rather than the domain type, so this crate stays decoupled from
/// `trackle-domain`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TicketRef {
    pub reporter_id: UserId,
    pub assignee_id: Option<UserId>,
}

/// The facts about a comment the policy needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommentRef {
    pub author_id: UserId,
}

/// Membership lookup result → ALLOW (the row) or DENY.
///
/// Absence is a denial, not a not-found: non-members must not learn whether
/// the project exists.
pub fn require_membership(membership: Option<&Membership>) -> Result<&Membership, Deny> {
    membership.ok_or(Deny::NotMember)
}

/// Require one of `allowed` roles on an established membership.
pub fn require_role(membership: &Membership, allowed: &[Role]) -> Result<(), Deny> {
    if allowed.contains(&membership.role) {
        Ok(())
    } else {
        Err(Deny::InsufficientRole)
    }
}

/// Decide a ticket action for a member.
///
/// - `Read`: any membership.
/// - `Update`: OWNER, reporter, or assignee.
/// - `Reassign`: OWNER or reporter.
/// - `Delete`: OWNER or reporter.
pub fn can_act_on_ticket(
    membership: &Membership,
    ticket: &TicketRef,
    user_id: UserId,
    action: TicketAction,
) -> Result<(), Deny> {
    let is_owner = membership.is_owner();
    let is_reporter = ticket.reporter_id == user_id;
    let is_assignee = ticket.assignee_id == Some(user_id);

    let allowed = match action {
        TicketAction::Read => true,
        TicketAction::Update => is_owner || is_reporter || is_assignee,
        TicketAction::Reassign => is_owner || is_reporter,
        TicketAction::Delete => is_owner || is_reporter,
    };

    if allowed {
        Ok(())
    } else {
        Err(Deny::InsufficientRole)
    }
}

/// Decide a comment action for a member.
///
/// - `Read`/`Create`: any membership.
/// - `Delete`: OWNER or the comment's author.
pub fn can_act_on_comment(
    membership: &Membership,
    comment: &CommentRef,
    user_id: UserId,
    action: CommentAction,
) -> Result<(), Deny> {
    let allowed = match action {
        CommentAction::Read | CommentAction::Create => true,
        CommentAction::Delete => membership.is_owner() || comment.author_id == user_id,
    };

    if allowed {
        Ok(())
    } else {
        Err(Deny::InsufficientRole)
    }
}

/// A non-null assignee must hold a membership in the same project.
///
/// Checked at ticket creation and at every update that changes the assignee.
pub fn validate_assignee(assignee_membership: Option<&Membership>) -> Result<(), Deny> {
    match assignee_membership {
        Some(_) => Ok(()),
        None => Err(Deny::InvalidAssignee),
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;
    use trackle_core::ProjectId;

    use super::*;

    fn membership(role: Role) -> Membership {
        Membership::new(ProjectId::new(), UserId::new(), role)
    }

    #[test]
    fn missing_membership_is_not_member_never_not_found() {
        assert_eq!(require_membership(None).unwrap_err(), Deny::NotMember);
    }

    #[test]
    fn require_role_checks_the_allowed_set() {
        let owner = membership(Role::Owner);
        let member = membership(Role::Member);

        assert!(require_role(&owner, &[Role::Owner]).is_ok());
        assert_eq!(
            require_role(&member, &[Role::Owner]).unwrap_err(),
            Deny::InsufficientRole
        );
        assert!(require_role(&member, &[Role::Owner, Role::Member]).is_ok());
    }

    #[test]
    fn any_member_can_read_tickets() {
        let member = membership(Role::Member);
        let ticket = TicketRef {
            reporter_id: UserId::new(),
            assignee_id: None,
        };
        assert!(can_act_on_ticket(&member, &ticket, member.user_id, TicketAction::Read).is_ok());
    }

    #[test]
    fn owner_can_do_everything_on_tickets() {
        let owner = membership(Role::Owner);
        let ticket = TicketRef {
            reporter_id: UserId::new(),
            assignee_id: None,
        };
        for action in [
            TicketAction::Read,
            TicketAction::Update,
            TicketAction::Reassign,
            TicketAction::Delete,
        ] {
            assert!(can_act_on_ticket(&owner, &ticket, owner.user_id, action).is_ok());
        }
    }

    #[test]
    fn reporter_can_update_reassign_and_delete() {
        let member = membership(Role::Member);
        let ticket = TicketRef {
            reporter_id: member.user_id,
            assignee_id: None,
        };
        for action in [
            TicketAction::Update,
            TicketAction::Reassign,
            TicketAction::Delete,
        ] {
            assert!(can_act_on_ticket(&member, &ticket, member.user_id, action).is_ok());
        }
    }

    #[test]
    fn assignee_can_update_but_not_reassign_or_delete() {
        let member = membership(Role::Member);
        let ticket = TicketRef {
            reporter_id: UserId::new(),
            assignee_id: Some(member.user_id),
        };

        assert!(can_act_on_ticket(&member, &ticket, member.user_id, TicketAction::Update).is_ok());
        assert_eq!(
            can_act_on_ticket(&member, &ticket, member.user_id, TicketAction::Reassign)
                .unwrap_err(),
            Deny::InsufficientRole
        );
        assert_eq!(
            can_act_on_ticket(&member, &ticket, member.user_id, TicketAction::Delete).unwrap_err(),
            Deny::InsufficientRole
        );
    }

    #[test]
    fn uninvolved_member_can_only_read() {
        let member = membership(Role::Member);
        let ticket = TicketRef {
            reporter_id: UserId::new(),
            assignee_id: Some(UserId::new()),
        };

        assert!(can_act_on_ticket(&member, &ticket, member.user_id, TicketAction::Read).is_ok());
        for action in [
            TicketAction::Update,
            TicketAction::Reassign,
            TicketAction::Delete,
        ] {
            assert_eq!(
                can_act_on_ticket(&member, &ticket, member.user_id, action).unwrap_err(),
                Deny::InsufficientRole
            );
        }
    }

    #[test]
    fn comment_delete_is_owner_or_author() {
        let owner = membership(Role::Owner);
        let member = membership(Role::Member);
        let author = UserId::new();
        let comment = CommentRef { author_id: author };

        assert!(can_act_on_comment(&owner, &comment, owner.user_id, CommentAction::Delete).is_ok());
        assert!(can_act_on_comment(&member, &comment, author, CommentAction::Delete).is_ok());
        assert_eq!(
            can_act_on_comment(&member, &comment, member.user_id, CommentAction::Delete)
                .unwrap_err(),
            Deny::InsufficientRole
        );
        assert!(can_act_on_comment(&member, &comment, member.user_id, CommentAction::Read).is_ok());
        assert!(
            can_act_on_comment(&member, &comment, member.user_id, CommentAction::Create).is_ok()
        );
    }

    #[test]
    fn assignee_must_be_a_member() {
        let m = membership(Role::Member);
        assert!(validate_assignee(Some(&m)).is_ok());
        assert_eq!(validate_assignee(None).unwrap_err(), Deny::InvalidAssignee);
    }

    proptest! {
        // Whatever the ticket looks like, a principal with no membership is
        // denied with NotMember before any ticket fact is consulted.
        #[test]
        fn no_membership_denies_everything(reporter_is_caller: bool, has_assignee: bool) {
            let caller = UserId::new();
            let _ticket = TicketRef {
                reporter_id: if reporter_is_caller { caller } else { UserId::new() },
                assignee_id: has_assignee.then(UserId::new),
            };
            prop_assert_eq!(require_membership(None).unwrap_err(), Deny::NotMember);
        }

        // Update permission is exactly owner ∨ reporter ∨ assignee.
        #[test]
        fn update_policy_matrix(is_owner: bool, is_reporter: bool, is_assignee: bool) {
            let role = if is_owner { Role::Owner } else { Role::Member };
            let m = membership(role);
            let ticket = TicketRef {
                reporter_id: if is_reporter { m.user_id } else { UserId::new() },
                assignee_id: if is_assignee { Some(m.user_id) } else { Some(UserId::new()) },
            };

            let decision = can_act_on_ticket(&m, &ticket, m.user_id, TicketAction::Update);
            prop_assert_eq!(decision.is_ok(), is_owner || is_reporter || is_assignee);
        }
    }
}
