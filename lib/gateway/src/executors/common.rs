use std::sync::Arc;

use async_trait::async_trait;

use crate::execution_request::ExecutionRequest;
use crate::execution_result::ExecutionResult;

/// Transport to one subgraph: executes a fully synthesized GraphQL document
/// and returns the response tree. The gateway never constructs transport
/// itself; hosts implement this over HTTP, in-process schemas, or test
/// doubles.
#[async_trait]
pub trait SubgraphExecutor {
    async fn execute(&self, request: ExecutionRequest) -> ExecutionResult;

    fn to_boxed_arc<'a>(self) -> Arc<Box<dyn SubgraphExecutor + Send + Sync + 'a>>
    where
        Self: Sized + Send + Sync + 'a,
    {
        Arc::new(Box::new(self))
    }
}

pub type SubgraphExecutorType = dyn SubgraphExecutor + Send + Sync;

pub type SubgraphExecutorBoxedArc = Arc<Box<SubgraphExecutorType>>;
