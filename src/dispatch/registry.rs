use crate::dispatch::context::ExecutorContext;
use crate::error::CaseError;
use std::collections::HashMap;
use std::sync::Arc;

/// A behavior under test, run once per leaf test case.
pub trait Executor: Send + Sync {
    fn execute(&self, ctx: &mut ExecutorContext<'_>) -> Result<(), CaseError>;
}

impl<F> Executor for F
where
    F: Fn(&mut ExecutorContext<'_>) -> Result<(), CaseError> + Send + Sync,
{
    fn execute(&self, ctx: &mut ExecutorContext<'_>) -> Result<(), CaseError> {
        self(ctx)
    }
}

/// Maps top-level test data directory names to executors.
#[derive(Clone)]
pub struct ExecutorRegistry {
    by_name: HashMap<String, Arc<dyn Executor>>,
}

impl Default for ExecutorRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ExecutorRegistry {
    pub fn new() -> Self {
        Self {
            by_name: HashMap::new(),
        }
    }

    /// Register `executor` under `name`, replacing any previous one.
    pub fn register(&mut self, name: impl Into<String>, executor: Arc<dyn Executor>) {
        self.by_name.insert(name.into(), executor);
    }

    pub fn remove(&mut self, name: &str) -> Option<Arc<dyn Executor>> {
        self.by_name.remove(name)
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Executor>> {
        self.by_name.get(name).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.by_name.contains_key(name)
    }

    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.by_name.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}
