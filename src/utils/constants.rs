//! Shared constants and invariants

pub const DEFAULT_BASE_URL: &str = "https://di-api.drillinginfo.com";
pub const USER_AGENT: &str = "direct-access-rs";

pub const DEFAULT_RETRIES: u32 = 5;
pub const DEFAULT_BACKOFF_FACTOR: f64 = 1.0;
pub const DEFAULT_MAX_BACKOFF_SECS: u64 = 120;
/// Sleep between attempts when the token endpoint throttles with 403.
pub const DEFAULT_THROTTLE_BACKOFF_SECS: u64 = 60;

// Headers
pub const API_KEY_HEADER: &str = "X-API-KEY";
pub const RECORD_COUNT_HEADER: &str = "X-QUERY-RECORD-COUNT";

// Reserved query parameters
pub const PAGE_PARAM: &str = "page";
pub const PAGE_SIZE_PARAM: &str = "pagesize";
pub const DDL_PARAM: &str = "ddl";
pub const DOCS_PARAM: &str = "docs";

/// Longest serialized `in(...)` value sent in one request. Keeps the full URL
/// under the API's 2048 character ceiling once path and other params are added.
pub const IN_FILTER_MAX_LEN: usize = 1950;

pub const ENV_API_KEY: &str = "DIRECTACCESS_API_KEY";
pub const ENV_CLIENT_ID: &str = "DIRECTACCESS_CLIENT_ID";
pub const ENV_CLIENT_SECRET: &str = "DIRECTACCESS_CLIENT_SECRET";
pub const ENV_TOKEN: &str = "DIRECTACCESS_TOKEN";
