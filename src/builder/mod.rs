//! 程序模型构建器 (Package Builder)
//!
//! Two-phase insertion over one registry and one model:
//!
//! ```text
//! artifacts ──► hierarchy (every artifact) ──► call graph (every artifact) ──► Package
//!                    │                                │
//!            ClassHierarchyInserter            CallGraphInserter
//!                    └──────── MethodRegistry ────────┘
//! ```
//!
//! All hierarchy insertion finishes before the first call edge is attached,
//! so a method the hierarchy phase classified keeps that identity when calls
//! reach it.

mod call_graph;
mod hierarchy;

pub use call_graph::CallGraphInserter;
pub use hierarchy::ClassHierarchyInserter;

use tracing::{debug, info};

use crate::analysis::{AnalysisBundle, ArtifactAnalysis, CallGraph, ClassHierarchy};
use crate::error::BuildError;
use crate::method::MethodRegistry;
use crate::package::{ArtifactRecord, Package, PackageModel};
use crate::resolver::{ClassToArtifactResolver, ScopeResolver};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Hierarchy,
    CallGraph,
}

/// Owns the registry and model of exactly one build
pub struct PackageBuilder<'r, R: ClassToArtifactResolver + ?Sized> {
    scope: ScopeResolver<'r, R>,
    methods: MethodRegistry,
    model: PackageModel,
    phase: Phase,
}

impl<'r, R: ClassToArtifactResolver + ?Sized> PackageBuilder<'r, R> {
    pub fn new(artifacts: &'r R) -> Self {
        Self {
            scope: ScopeResolver::new(artifacts),
            methods: MethodRegistry::new(),
            model: PackageModel::new(),
            phase: Phase::Hierarchy,
        }
    }

    pub fn set_artifacts<I>(&mut self, artifacts: I) -> &mut Self
    where
        I: IntoIterator<Item = ArtifactRecord>,
    {
        for artifact in artifacts {
            if !self.model.add_artifact(artifact.clone()) {
                debug!("Artifact {} listed twice", artifact);
            }
        }
        self
    }

    pub fn artifact_count(&self) -> usize {
        self.model.artifact_count()
    }

    /// Registry as populated so far
    pub fn methods(&self) -> &MethodRegistry {
        &self.methods
    }

    /// Insert one artifact's class hierarchy.
    ///
    /// Fails once any call graph has been inserted.
    pub fn insert_class_hierarchy(&mut self, hierarchy: &ClassHierarchy) -> Result<usize, BuildError> {
        if self.phase != Phase::Hierarchy {
            return Err(BuildError::HierarchyAfterCallGraph);
        }

        let inserter = ClassHierarchyInserter::new(hierarchy, &self.scope, &mut self.methods, &mut self.model);
        Ok(inserter.insert())
    }

    /// Insert one artifact's call graph; closes the hierarchy phase
    pub fn insert_call_graph(&mut self, call_graph: &CallGraph) -> usize {
        self.phase = Phase::CallGraph;

        let inserter = CallGraphInserter::new(call_graph, &self.scope, &mut self.methods, &mut self.model);
        inserter.insert()
    }

    /// Freeze the model
    pub fn build(self) -> Package {
        self.model.build(self.methods)
    }
}

/// Build the program model for a set of analyzed artifacts.
///
/// Missing inputs are reported before anything is inserted. Every hierarchy is
/// inserted before any call graph.
pub fn build_package<R>(artifacts: &R, analyses: &[ArtifactAnalysis]) -> Result<Package, BuildError>
where
    R: ClassToArtifactResolver + ?Sized,
{
    let mut inputs = Vec::with_capacity(analyses.len());
    for analysis in analyses {
        let hierarchy = analysis
            .hierarchy
            .as_ref()
            .ok_or_else(|| BuildError::MissingHierarchy(analysis.artifact.clone()))?;
        let call_graph = analysis
            .call_graph
            .as_ref()
            .ok_or_else(|| BuildError::MissingCallGraph(analysis.artifact.clone()))?;
        inputs.push((&analysis.artifact, hierarchy, call_graph));
    }

    let mut builder = PackageBuilder::new(artifacts);
    builder.set_artifacts(analyses.iter().map(|a| a.artifact.clone()));

    for (artifact, hierarchy, _) in &inputs {
        debug!("Insert class hierarchy for {}", artifact);
        builder.insert_class_hierarchy(hierarchy)?;
    }
    for (artifact, _, call_graph) in &inputs {
        debug!("Insert call graph for {}", artifact);
        builder.insert_call_graph(call_graph);
    }

    let package = builder.build();
    info!(
        "Built package: {} artifacts, {} classes, {} resolved calls, {} unresolved calls",
        package.artifacts().len(),
        package.class_records().count(),
        package.resolved_calls().len(),
        package.unresolved_calls().len()
    );
    Ok(package)
}

/// Build a bundle with the resolver it carries
pub fn build_bundle(bundle: &AnalysisBundle) -> Result<Package, BuildError> {
    let resolver = bundle.resolver();
    build_package(&resolver, &bundle.analyses)
}
