/// Application name, used for environment variables and diagnostics.
pub const APP_NAME: &str = "qmlbridge";

/// Cache file written to the working directory after every rewritten file.
pub const CACHE_FILENAME: &str = ".qmlbridge_cache";

/// Optional project manifest in the working directory.
pub const PROJECT_MANIFEST_FILENAME: &str = "package.yml";

/// Manifest file name searched for under the QML installation root.
pub const MODULE_MANIFEST_FILENAME: &str = "package.yml";

/// Metadata file inside every `node_modules` package.
pub const PACKAGE_METADATA_FILENAME: &str = "package.json";

/// Entry point used when a package's metadata does not name one.
pub const DEFAULT_PACKAGE_MAIN: &str = "index.js";

/// Directory holding installed external packages, relative to the working directory.
pub const PACKAGES_DIR: &str = "node_modules";

/// Subdirectory of the build directory receiving rewritten external packages.
pub const DEPENDENCIES_OUT_DIR: &str = "dependencies";

/// Extension of the files that get rewritten. Everything else is copied.
pub const SCRIPT_EXTENSION: &str = "js";

/// Prefix of every generated namespace identifier.
pub const NAMESPACE_PREFIX: &str = "QML";

/// Static import of the polyfill provider.
pub const POLYFILL_IMPORT: &str = ".import Quickly 0.1 as QML_Quickly";

/// Expression yielding the polyfill provider's global object.
pub const POLYFILL_PROVIDER: &str = "QML_Quickly.Polyfills.global";

/// Globals bound to the provider's members when polyfills are enabled.
pub const POLYFILLS: &[&str] = &[
  "WeakMap", "Map", "WeakSet", "Set", "Symbol", "Reflect", "Promise", "fetch", "Request", "Response", "Headers",
];

/// Default external lowering command.
pub const DEFAULT_LOWERING_COMMAND: &str = "babel";
