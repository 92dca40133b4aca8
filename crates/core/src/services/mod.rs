//! Business logic services.

#![allow(missing_docs)]

pub mod auth;
pub mod event_publisher;
pub mod group;
pub mod member;
pub mod notification;
pub mod user;

pub(crate) mod password;

pub use auth::{
    AccessClaims, AuthScope, AuthService, Principal, RefreshClaims, RefreshOutcome, TokenPair,
};
pub use event_publisher::{EventPublisher, EventPublisherService, NoOpEventPublisher, NotificationEvent};
pub use group::{
    AvailableGroup, CreateGroupInput, GroupService, GroupWithMembers, JoinRequestDetail,
    MemberProfile, ResolveAction, UpdateGroupInput,
};
pub use member::{CreateMemberInput, MemberService, UpdateMemberInput};
pub use notification::{GroupBroadcastLog, NotificationService, NotifyChannel};
pub use user::{CreateUserInput, UpdateUserInput, UserService};
