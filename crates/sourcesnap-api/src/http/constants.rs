//! Shared HTTP constants (headers, routes, problem URIs).

pub(crate) const HEADER_CALLER_ID: &str = "x-sourcesnap-caller-id";
pub(crate) const HEADER_ORIGIN_TOKEN: &str = "x-sourcesnap-origin-token";
pub(crate) const HEADER_REQUEST_ID: &str = "x-request-id";

pub(crate) const ROUTE_SNAPSHOTS: &str = "/source-snapshots";
pub(crate) const ROUTE_HEALTH: &str = "/health";
pub(crate) const ROUTE_METRICS: &str = "/metrics";

pub(crate) const PROBLEM_INTERNAL: &str = "https://sourcesnap.dev/problems/internal";
pub(crate) const PROBLEM_UNAUTHORIZED: &str = "https://sourcesnap.dev/problems/unauthorized";
pub(crate) const PROBLEM_BAD_REQUEST: &str = "https://sourcesnap.dev/problems/bad-request";
pub(crate) const PROBLEM_CONFIG_INVALID: &str = "https://sourcesnap.dev/problems/config-invalid";
pub(crate) const PROBLEM_NOT_FOUND: &str = "https://sourcesnap.dev/problems/not-found";
pub(crate) const PROBLEM_RATE_LIMITED: &str = "https://sourcesnap.dev/problems/rate-limited";
pub(crate) const PROBLEM_ORIGIN_UNAVAILABLE: &str =
    "https://sourcesnap.dev/problems/origin-unavailable";
pub(crate) const PROBLEM_STORE_UNAVAILABLE: &str =
    "https://sourcesnap.dev/problems/store-unavailable";
pub(crate) const PROBLEM_TIMEOUT: &str = "https://sourcesnap.dev/problems/timeout";
