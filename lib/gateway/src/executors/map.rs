use std::collections::HashMap;

use tracing::{instrument, warn};

use crate::execution_request::ExecutionRequest;
use crate::execution_result::ExecutionResult;
use crate::executors::common::SubgraphExecutorBoxedArc;
use crate::schema::Subgraph;

/// Name-keyed registry of subgraph executors. The selection tree refers to
/// subgraphs by name only; this map is the single point of indirection.
#[derive(Default)]
pub struct SubgraphExecutorMap {
    inner: HashMap<String, SubgraphExecutorBoxedArc>,
}

impl SubgraphExecutorMap {
    pub fn new() -> Self {
        SubgraphExecutorMap::default()
    }

    pub fn from_subgraphs(subgraphs: Vec<Subgraph>) -> Self {
        let inner = subgraphs
            .into_iter()
            .map(|subgraph| (subgraph.name, subgraph.executor))
            .collect();
        SubgraphExecutorMap { inner }
    }

    pub fn insert_boxed_arc(&mut self, subgraph_name: String, executor: SubgraphExecutorBoxedArc) {
        self.inner.insert(subgraph_name, executor);
    }

    pub fn contains(&self, subgraph_name: &str) -> bool {
        self.inner.contains_key(subgraph_name)
    }

    #[instrument(level = "trace", name = "subgraph_execute", skip_all, fields(subgraph_name = %subgraph_name))]
    pub async fn execute(
        &self,
        subgraph_name: &str,
        execution_request: ExecutionRequest,
    ) -> ExecutionResult {
        match self.inner.get(subgraph_name) {
            Some(executor) => executor.execute(execution_request).await,
            None => {
                warn!("Subgraph executor not found for subgraph: {}", subgraph_name);
                ExecutionResult::from_error_message(format!(
                    "Subgraph executor not found for subgraph: {}",
                    subgraph_name
                ))
            }
        }
    }
}
