pub mod context;
pub mod discovery;
pub mod dispatch_thread;
pub mod registry;
pub mod run;

pub use context::ExecutorContext;
pub use discovery::{TestCase, TestNode};
pub use dispatch_thread::{DispatchError, DispatchThread};
pub use registry::{Executor, ExecutorRegistry};
pub use run::{run_case, CasePhase};

use crate::config::DirectoryTestConfig;
use crate::error::{CaseError, ConfigError, Failure};
use crate::report::{CaseReport, SuiteReport};
use rustc_hash::FxHashSet;
use serde::Serialize;
use std::path::{Path, PathBuf};

/// The discovered test tree of one test data root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TestSuite {
    pub root: PathBuf,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub only: Option<String>,
    pub nodes: Vec<TestNode>,
}

impl TestSuite {
    pub fn discover(config: &DirectoryTestConfig) -> Result<Self, ConfigError> {
        Self::discover_with(&config.test_data_root, &config.executors, &config.heavy_executors)
    }

    /// Discover below `root` without a full configuration, e.g. to list the tree.
    pub fn discover_with(
        root: &Path,
        executors: &ExecutorRegistry,
        heavy_executors: &FxHashSet<String>,
    ) -> Result<Self, ConfigError> {
        let only = discovery::read_only_filter(root)?;
        let nodes = discovery::discover_tree(root, executors, heavy_executors, only.as_deref())?;
        let suite = Self {
            root: root.to_path_buf(),
            only,
            nodes,
        };
        tracing::info!(
            "Discovered {} test cases below {:?}",
            suite.cases().len(),
            suite.root
        );
        Ok(suite)
    }

    pub fn cases(&self) -> Vec<&TestCase> {
        discovery::flatten(&self.nodes)
            .into_iter()
            .filter_map(|(_, node)| match node {
                TestNode::Case(case) => Some(case),
                _ => None,
            })
            .collect()
    }

    /// Run every leaf, disabled ones included, and report each outcome.
    pub fn run(&self, config: &DirectoryTestConfig) -> SuiteReport {
        let dispatch = config.run_in_dispatch_thread.then(DispatchThread::spawn);
        let mut report = SuiteReport::default();

        for (groups, node) in discovery::flatten(&self.nodes) {
            let mut name = groups.join("/");
            if !name.is_empty() {
                name.push('/');
            }
            name.push_str(node.name());

            let case_report = match node {
                TestNode::Placeholder { reason, .. } => CaseReport::from_outcome(
                    name,
                    false,
                    Err(CaseError::Failed(vec![Failure::new(reason.as_str())])),
                ),
                TestNode::Case(case) => {
                    let outcome = match &dispatch {
                        None => run_case(config, case),
                        Some(Ok(thread)) => {
                            let config = config.clone();
                            let job_case = case.clone();
                            thread
                                .run_and_wait(move || run_case(&config, &job_case))
                                .unwrap_or_else(|e| Err(CaseError::Setup(e.into())))
                        }
                        Some(Err(e)) => Err(CaseError::Setup(anyhow::anyhow!(
                            "Failed to start the dispatch thread: {}",
                            e
                        ))),
                    };
                    CaseReport::from_outcome(name, case.disabled, outcome)
                }
                TestNode::Group { .. } => continue,
            };
            report.cases.push(case_report);
        }

        report.log_summary();
        report
    }
}
