//! Transfer-wide constants.

/// Default size of one transfer chunk (1 MiB).
pub const DEFAULT_CHUNK_SIZE: usize = 1024 * 1024;

/// Upper bound accepted for a configured chunk size (8 MiB).
pub const MAX_CHUNK_SIZE: usize = 8 * 1024 * 1024;

/// Default number of files uploaded at the same time in a batch.
pub const DEFAULT_MAX_CONCURRENT_UPLOADS: usize = 4;

/// Default client-side timeout for a single remote request.
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 60;

/// Message attached to uploads refused because of group permissions.
pub const GROUP_NOT_AUTHORIZED_MESSAGE: &str = "You are not authorized in this group.";
