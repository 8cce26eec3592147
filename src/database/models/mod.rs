pub mod account;
pub mod menu;
pub mod organization;
pub mod permission;
pub mod position;
pub mod role;

pub use account::{Account, AccountProfile};
pub use menu::{Menu, MenuAttributes};
pub use organization::Organization;
pub use permission::{Permission, PermissionAction};
pub use position::Position;
pub use role::{AccountRole, Role, RoleMenu};
