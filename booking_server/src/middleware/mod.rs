mod acl;
mod identity;

pub use acl::{PermissionGuardFactory, PermissionGuardService, RoleGuardFactory, RoleGuardService};
pub use identity::{IdentityMiddlewareFactory, IdentityMiddlewareService};
