//! Database entities.

pub mod access_token;
pub mod admin;
pub mod group;
pub mod group_member;
pub mod group_notification;
pub mod join_request;
pub mod member;
pub mod notification;
pub mod refresh_token;
pub mod user;

pub use access_token::Entity as AccessToken;
pub use access_token::PrincipalKind;
pub use admin::Entity as Admin;
pub use group::Entity as Group;
pub use group_member::Entity as GroupMember;
pub use group_notification::Entity as GroupNotification;
pub use join_request::Entity as JoinRequest;
pub use join_request::RequestStatus;
pub use member::Entity as Member;
pub use notification::Entity as Notification;
pub use notification::NotificationTarget;
pub use refresh_token::Entity as RefreshToken;
pub use user::Entity as User;
