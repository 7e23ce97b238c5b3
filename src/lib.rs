pub mod assertions;
pub mod carets;
pub mod compare;
pub mod config;
pub mod constants;
pub mod dispatch;
pub mod error;
pub mod executors;
pub mod host;
pub mod markup;
pub mod project;
pub mod report;

pub use config::{DirectoryTestConfig, HarnessSettings, OverrideOutput, ProjectDescriptor};
pub use dispatch::{ExecutorContext, TestCase, TestNode, TestSuite};
pub use error::{CaseError, ConfigError, Failure};
pub use report::{CaseReport, CaseStatus, SuiteReport};
