pub mod session;
pub mod rate_limit;
pub mod csrf;
pub mod rbac;
pub mod lifecycle;
pub mod gatekeeper;
