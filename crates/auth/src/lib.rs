//! `trackle-auth` — pure authentication/authorization boundary.
//!
//! This crate is intentionally decoupled from HTTP and storage: the engine
//! decides over rows that have already been fetched, and the API layer owns
//! the lookups and their ordering.

pub mod claims;
pub mod engine;
pub mod membership;
pub mod password;
pub mod role;
pub mod token;

pub use claims::{validate_claims, JwtClaims, TokenValidationError};
pub use engine::{
    can_act_on_comment, can_act_on_ticket, require_membership, require_role, validate_assignee,
    CommentAction, CommentRef, Deny, TicketAction, TicketRef,
};
pub use membership::Membership;
pub use password::{hash_password, verify_password, PasswordHashError};
pub use role::Role;
pub use token::{Hs256TokenAuthority, TokenAuthority, TokenError};
