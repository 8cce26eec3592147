pub mod account;
pub mod error;
pub mod menu;
pub mod organization;
pub mod permission;
pub mod position;
pub mod role;
pub mod tree;
pub mod validate;

pub use account::AccountService;
pub use error::ServiceError;
pub use menu::MenuService;
pub use organization::OrganizationService;
pub use permission::PermissionService;
pub use position::PositionService;
pub use role::RoleService;
pub use tree::{NodeDetail, NodeListing, TreeService};
