//! Database repositories.

mod admin;
mod group;
mod member;
mod notification;
mod token;
mod user;

pub use admin::AdminRepository;
pub use group::GroupRepository;
pub use member::{MemberPage, MemberRepository, MemberSearch};
pub use notification::NotificationRepository;
pub use token::TokenRepository;
pub use user::UserRepository;
