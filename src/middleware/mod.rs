pub mod authenticate;
pub mod authorize;
pub mod cors;
pub mod identity;
pub mod method_not_allowed;
pub mod metrics;
pub mod rate_limit;
pub mod recover;
pub mod response;

pub use authenticate::{authenticate, authenticate_request};
pub use authorize::{
    require_activated, require_activated_user, require_authenticated, require_permission,
    require_permission_for, PermissionGuard,
};
pub use cors::enable_cors;
pub use identity::Identity;
pub use method_not_allowed::method_not_allowed;
pub use metrics::{track_metrics, HttpMetrics};
pub use rate_limit::rate_limit;
pub use recover::{log_server_errors, recover_panic};
pub use response::{ApiResponse, ApiResult};
