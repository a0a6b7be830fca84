// ============================================================================
// 调用图插入 - 复用注册表中的方法身份
// ============================================================================

use tracing::debug;

use crate::analysis::CallGraph;
use crate::method::MethodRegistry;
use crate::package::{Call, PackageModel};
use crate::resolver::{ClassToArtifactResolver, ScopeResolver};

/// Populates call edges for one artifact's call graph
pub struct CallGraphInserter<'a, 'r, R: ClassToArtifactResolver + ?Sized> {
    call_graph: &'a CallGraph,
    scope: &'a ScopeResolver<'r, R>,
    methods: &'a mut MethodRegistry,
    model: &'a mut PackageModel,
}

impl<'a, 'r, R: ClassToArtifactResolver + ?Sized> CallGraphInserter<'a, 'r, R> {
    pub fn new(
        call_graph: &'a CallGraph,
        scope: &'a ScopeResolver<'r, R>,
        methods: &'a mut MethodRegistry,
        model: &'a mut PackageModel,
    ) -> Self {
        Self {
            call_graph,
            scope,
            methods,
            model,
        }
    }

    /// Insert every edge, returning the number of calls not seen before
    pub fn insert(self) -> usize {
        let mut inserted = 0;

        for edge in &self.call_graph.edges {
            let source = self.scope.resolve(self.methods, &edge.caller);
            let target = self.scope.resolve(self.methods, &edge.callee);

            let call = Call::new(source, target, edge.dispatch.call_type());
            if self.model.add_call(call, self.methods) {
                inserted += 1;
            }
        }

        debug!(
            "Inserted {} of {} call edges",
            inserted,
            self.call_graph.edges.len()
        );
        inserted
    }
}
