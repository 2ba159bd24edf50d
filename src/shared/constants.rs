// =============================================================================
// ROLE CONSTANTS
// =============================================================================

/// Teacher role - can browse and open the shared files
pub const ROLE_TEACHER: &str = "teacher";

/// Coordinator role - can also upload and delete files
pub const ROLE_COORDINATOR: &str = "coordinator";

/// User metadata key holding the role
pub const ROLE_METADATA_KEY: &str = "role";

/// User metadata key holding the full name
pub const NAME_METADATA_KEY: &str = "name";

// =============================================================================
// DISPLAY CONSTANTS
// =============================================================================

pub const BYTES_PER_MEGABYTE: f64 = 1_048_576.0;

/// Creation dates render as dd/mm/yyyy
pub const CREATED_DATE_FORMAT: &str = "%d/%m/%Y";

/// Links open in a new browsing context
pub const FILE_LINK_TARGET: &str = "_blank";
