use crate::constants::{DEFAULT_TEST_DATA_ROOT, INTENTION_SUFFIXES, SETTINGS_FILE};
use crate::dispatch::{Executor, ExecutorRegistry};
use crate::error::ConfigError;
use crate::executors;
use crate::host::{deny_all_external_symbols, ExternalSymbolNamer, FixtureFactory};
use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Opaque project setup handed to the host for light fixtures.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct ProjectDescriptor {
    pub name: String,
    #[serde(default)]
    pub settings: serde_json::Value,
}

/// Which expected-output fixtures are overwritten with the actual output.
///
/// Useful to review changed output with `git diff`; restore the files if the
/// change was not intended.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct OverrideOutput {
    #[serde(default)]
    pub parser: bool,
    #[serde(default)]
    pub documentation: bool,
}

/// The serializable part of the configuration, overridable from `dirtests.toml`.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct HarnessSettings {
    #[serde(default)]
    pub heavy_executors: Vec<String>,
    #[serde(default)]
    pub known_intentions: Vec<String>,
    #[serde(default)]
    pub override_output: OverrideOutput,
    #[serde(default = "default_soft_assert")]
    pub soft_assert_by_default: bool,
    #[serde(default)]
    pub run_in_dispatch_thread: bool,
    #[serde(default)]
    pub project_descriptor: Option<ProjectDescriptor>,
}

impl Default for HarnessSettings {
    fn default() -> Self {
        Self {
            heavy_executors: Vec::new(),
            known_intentions: Vec::new(),
            override_output: OverrideOutput::default(),
            soft_assert_by_default: true,
            run_in_dispatch_thread: false,
            project_descriptor: None,
        }
    }
}

impl HarnessSettings {
    /// Overlay `dirtests.toml` from `root`, if present, on top of `self`.
    pub fn overlay_from(&self, root: &Path) -> Result<HarnessSettings, ConfigError> {
        let path = root.join(SETTINGS_FILE);
        if !path.exists() {
            return Ok(self.clone());
        }

        let toml_content = fs::read_to_string(&path).map_err(|e| ConfigError::io(&path, e))?;
        let overlay: toml::Table = toml::from_str(&toml_content)
            .map_err(|e| ConfigError::invalid(format!("Failed to parse {}: {}", path.display(), e)))?;

        let mut settings_json = serde_json::to_value(self)
            .map_err(|e| ConfigError::invalid(format!("Failed to serialize settings: {}", e)))?;
        let Some(fields) = settings_json.as_object_mut() else {
            return Err(ConfigError::invalid("Settings must serialize to a table"));
        };
        for (key, value) in overlay {
            let Some(field) = fields.get_mut(&key) else {
                tracing::warn!("Ignoring unknown setting {:?} in {:?}", key, path);
                continue;
            };
            let value = serde_json::to_value(value)
                .map_err(|e| ConfigError::invalid(format!("Invalid setting {}: {}", key, e)))?;
            // Sections such as `[override_output]` only replace the keys they name.
            match (field, value) {
                (serde_json::Value::Object(section), serde_json::Value::Object(given)) => {
                    section.extend(given)
                }
                (field, value) => *field = value,
            }
        }

        let settings: HarnessSettings = serde_json::from_value(settings_json).map_err(|e| {
            ConfigError::invalid(format!("Failed to deserialize merged settings: {}", e))
        })?;
        tracing::debug!("Applied settings from {:?}", path);
        Ok(settings)
    }
}

/// Everything a directory test run needs.
#[derive(Clone)]
pub struct DirectoryTestConfig {
    pub executors: ExecutorRegistry,
    /// Executors whose cases need real files on disk, e.g. to run external tools.
    pub heavy_executors: FxHashSet<String>,
    pub test_data_root: PathBuf,
    /// Intention identifiers the `actions` executor can find in a test path.
    pub known_intentions: Vec<String>,
    pub override_output: OverrideOutput,
    pub external_symbol_namer: ExternalSymbolNamer,
    pub project_descriptor: Option<ProjectDescriptor>,
    /// Collect every assertion failure of a case instead of stopping at the first.
    pub soft_assert_by_default: bool,
    /// Run each case on the dedicated dispatch thread.
    pub run_in_dispatch_thread: bool,
    pub fixture_factory: Arc<dyn FixtureFactory>,
}

impl DirectoryTestConfig {
    pub fn new(fixture_factory: Arc<dyn FixtureFactory>) -> Self {
        let defaults = HarnessSettings::default();
        Self {
            executors: executors::default_registry(),
            heavy_executors: FxHashSet::default(),
            test_data_root: PathBuf::from(DEFAULT_TEST_DATA_ROOT),
            known_intentions: defaults.known_intentions,
            override_output: defaults.override_output,
            external_symbol_namer: deny_all_external_symbols(),
            project_descriptor: defaults.project_descriptor,
            soft_assert_by_default: defaults.soft_assert_by_default,
            run_in_dispatch_thread: defaults.run_in_dispatch_thread,
            fixture_factory,
        }
    }

    pub fn with_test_data_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.test_data_root = root.into();
        self
    }

    pub fn with_executor(mut self, name: impl Into<String>, executor: impl Executor + 'static) -> Self {
        self.executors.register(name, Arc::new(executor));
        self
    }

    pub fn with_heavy_executor(mut self, name: impl Into<String>) -> Self {
        self.heavy_executors.insert(name.into());
        self
    }

    pub fn with_known_intentions<I, S>(mut self, intentions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.known_intentions = intentions.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_override_output(mut self, override_output: OverrideOutput) -> Self {
        self.override_output = override_output;
        self
    }

    pub fn with_external_symbol_namer(mut self, namer: ExternalSymbolNamer) -> Self {
        self.external_symbol_namer = namer;
        self
    }

    pub fn with_project_descriptor(mut self, descriptor: ProjectDescriptor) -> Self {
        self.project_descriptor = Some(descriptor);
        self
    }

    pub fn with_soft_assert(mut self, soft: bool) -> Self {
        self.soft_assert_by_default = soft;
        self
    }

    pub fn with_dispatch_thread(mut self, enabled: bool) -> Self {
        self.run_in_dispatch_thread = enabled;
        self
    }

    pub fn settings(&self) -> HarnessSettings {
        let mut heavy_executors: Vec<String> = self.heavy_executors.iter().cloned().collect();
        heavy_executors.sort();
        HarnessSettings {
            heavy_executors,
            known_intentions: self.known_intentions.clone(),
            override_output: self.override_output,
            soft_assert_by_default: self.soft_assert_by_default,
            run_in_dispatch_thread: self.run_in_dispatch_thread,
            project_descriptor: self.project_descriptor.clone(),
        }
    }

    pub fn apply_settings(mut self, settings: HarnessSettings) -> Self {
        self.heavy_executors = settings.heavy_executors.into_iter().collect();
        self.known_intentions = settings.known_intentions;
        self.override_output = settings.override_output;
        self.soft_assert_by_default = settings.soft_assert_by_default;
        self.run_in_dispatch_thread = settings.run_in_dispatch_thread;
        self.project_descriptor = settings.project_descriptor;
        self
    }

    /// Apply `dirtests.toml` from the test data root, if there is one.
    pub fn load_settings(self) -> Result<Self, ConfigError> {
        let settings = self.settings().overlay_from(&self.test_data_root)?;
        Ok(self.apply_settings(settings))
    }

    pub fn is_heavy(&self, executor: &str) -> bool {
        self.heavy_executors.contains(executor)
    }

    /// The known intention named by the last matching component of `path`.
    pub fn intention_for_path(&self, path: &Path) -> Option<&str> {
        path.components()
            .filter_map(|c| c.as_os_str().to_str())
            .filter_map(|component| {
                let wanted = simplify_intention_name(component);
                self.known_intentions
                    .iter()
                    .find(|known| simplify_intention_name(known) == wanted)
            })
            .last()
            .map(String::as_str)
    }
}

impl fmt::Debug for DirectoryTestConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DirectoryTestConfig")
            .field("executors", &self.executors.names())
            .field("heavy_executors", &self.heavy_executors)
            .field("test_data_root", &self.test_data_root)
            .field("known_intentions", &self.known_intentions)
            .field("override_output", &self.override_output)
            .field("soft_assert_by_default", &self.soft_assert_by_default)
            .field("run_in_dispatch_thread", &self.run_in_dispatch_thread)
            .finish_non_exhaustive()
    }
}

/// Strip the `Action` and `Intention` suffixes, in that order.
pub fn simplify_intention_name(name: &str) -> &str {
    INTENTION_SUFFIXES
        .iter()
        .fold(name, |name, suffix| name.strip_suffix(suffix).unwrap_or(name))
}

fn default_soft_assert() -> bool {
    true
}
