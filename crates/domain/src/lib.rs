//! `trackle-domain` — entities of the ticket tracker.
//!
//! Plain data types with validated constructors. Authorization policy lives in
//! `trackle-auth`; persistence lives in `trackle-store`.

pub mod comment;
pub mod project;
pub mod ticket;
pub mod user;

pub use comment::Comment;
pub use project::Project;
pub use ticket::{Ticket, TicketKind, TicketPatch, TicketPriority, TicketStatus};
pub use user::{normalize_email, User};
