//! Reserved names of the fixture directory layout.

/// Suffix of configuration sentinels at the test data root. Entries ending in it
/// are never treated as executor directories.
pub const SENTINEL_SUFFIX: &str = ".txt";

/// Optional settings file at the test data root.
pub const SETTINGS_FILE: &str = "dirtests.toml";

/// Root-level filter file declaring a single path substring.
pub const ONLY_FILE: &str = "only.txt";

/// Marks a directory as a pure grouping node.
pub const CONTEXT_FILE: &str = "context.txt";

/// Input project of mutating executors.
pub const BEFORE_DIR: &str = "before";

/// Expected project after a mutating executor ran.
pub const AFTER_DIR: &str = "after";

/// Input project of query executors.
pub const PROJECT_DIR: &str = "project";

pub const RESULT_TXT: &str = "result.txt";
pub const RESULT_HTML: &str = "result.html";
pub const NEW_NAME_FILE: &str = "new_name.txt";
pub const SHOULD_FAIL_FILE: &str = "should_fail.txt";
pub const EXTERNAL_REFERENCES_FILE: &str = "external references.txt";
pub const EXTERNAL_SUGGESTIONS_FILE: &str = "external suggestions.txt";
pub const NON_PSI_ITEMS_FILE: &str = "non_psi_items.txt";

/// Legacy parser fixture marker, superseded by `<parse-error>` markers.
pub const ALLOW_ERRORS_FILE: &str = "allow_errors.txt";

/// Stem of a parser input file that is not named after the test.
pub const PARSER_INPUT_STEM: &str = "input";

/// Prefix of a test case name that was disabled by the only-filter.
pub const DISABLED_PREFIX: &str = "!";

/// Test data root used when none is configured.
pub const DEFAULT_TEST_DATA_ROOT: &str = "tests/testData";

/// Suffixes stripped from intention identifiers, in this order.
pub const INTENTION_SUFFIXES: [&str; 2] = ["Action", "Intention"];

/// Name of the thread that runs executors when a dispatch context is requested.
pub const DISPATCH_THREAD_NAME: &str = "dirtests-dispatch";
