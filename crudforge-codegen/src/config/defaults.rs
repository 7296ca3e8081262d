//! Default configuration values - single source of truth

/// Default include entities pattern (all entities)
pub const INCLUDE_ENTITIES: &str = "*";

/// Default exclude entities pattern (none)
pub const EXCLUDE_ENTITIES: &str = "";

/// Default output root
pub const OUTPUT_DIR: &str = "./generated";

/// Identity and audit properties left out of write-facing DTOs
pub const IGNORE_PROPERTIES: &[&str] = &["Id", "CreatedTime", "UpdatedTime", "IsDeleted", "TenantId"];

/// Strings with a max length at or above this are not offered as filters
pub const FILTER_MAX_LENGTH: u32 = 1000;

/// Default DTO directory, relative to the output root
pub const DTO_DIR: &str = "Share/Models";

/// Default DTO namespace suffix
pub const DTO_NAMESPACE: &str = "Share.Models";

/// Default manager directory
pub const MANAGER_DIR: &str = "Application/Managers";

/// Default manager namespace suffix
pub const MANAGER_NAMESPACE: &str = "Application.Managers";

/// Default controller directory
pub const CONTROLLER_DIR: &str = "Http.API/Controllers";

/// Default controller namespace suffix
pub const CONTROLLER_NAMESPACE: &str = "Http.API.Controllers";

/// Default client directory
pub const CLIENT_DIR: &str = "ClientServices";

/// Default client namespace suffix
pub const CLIENT_NAMESPACE: &str = "ClientServices";

/// Base class of generated C# filter DTOs
pub const FILTER_BASE_CLASS: &str = "FilterBase";

/// Key type used when a foreign key scalar has to be synthesized
pub const KEY_TYPE: &str = "Guid";

/// Module TypeScript DTOs import referenced enum and model types from
pub const TS_TYPES_IMPORT: &str = "../models";

/// Module path Rust DTOs import referenced types from
pub const RUST_TYPES_PATH: &str = "crate::models";

/// Whether existing files are overwritten by default
pub const FORCE: bool = false;

/// Whether to run in dry-run mode by default
pub const DRY_RUN: bool = false;
