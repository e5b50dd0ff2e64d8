//! Constants used across the Locklift workspace.

/// The filename for Locklift's project configuration.
pub const CONFIG_FILE: &str = "locklift.toml";

/// Default directory holding contract sources.
pub const DEFAULT_CONTRACTS_DIR: &str = "contracts";

/// Default directory receiving compiled artifacts.
pub const DEFAULT_BUILD_DIR: &str = "build";

/// Default compiler executable invoked by the build step.
pub const DEFAULT_COMPILER: &str = "sold";

/// Include directory handed to the compiler unless `--disable-include-path` is set.
pub const DEFAULT_INCLUDE_PATH: &str = "node_modules";

/// Suffix of compiled contract ABI files in the build directory.
pub const ABI_SUFFIX: &str = ".abi.json";
