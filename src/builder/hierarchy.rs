// ============================================================================
// 类层级插入 - 类记录 + CHA 推导的 override/implements 边
// ============================================================================

use std::collections::{BTreeSet, HashMap, HashSet};

use tracing::debug;

use crate::analysis::{ClassHierarchy, ClassNode, MethodDeclaration};
use crate::method::{MethodId, MethodKind, MethodRegistry};
use crate::package::{warn_on_artifact_clash, ChaEdgeKind, ClassRecord, ExpectedCall, PackageModel};
use crate::resolver::{ClassToArtifactResolver, ScopeResolver};

/// Populates class records and expected calls for one artifact's hierarchy
pub struct ClassHierarchyInserter<'a, 'r, R: ClassToArtifactResolver + ?Sized> {
    hierarchy: &'a ClassHierarchy,
    index: HashMap<String, &'a ClassNode>,
    scope: &'a ScopeResolver<'r, R>,
    methods: &'a mut MethodRegistry,
    model: &'a mut PackageModel,
}

impl<'a, 'r, R: ClassToArtifactResolver + ?Sized> ClassHierarchyInserter<'a, 'r, R> {
    pub fn new(
        hierarchy: &'a ClassHierarchy,
        scope: &'a ScopeResolver<'r, R>,
        methods: &'a mut MethodRegistry,
        model: &'a mut PackageModel,
    ) -> Self {
        Self {
            hierarchy,
            index: hierarchy.index(),
            scope,
            methods,
            model,
        }
    }

    /// Insert every class node, returning the number of new class records
    pub fn insert(mut self) -> usize {
        let hierarchy = self.hierarchy;
        let mut inserted = 0;
        for node in &hierarchy.classes {
            if self.process_class(node) {
                inserted += 1;
            }
        }

        debug!(
            "Inserted {} of {} classes ({} methods known)",
            inserted,
            hierarchy.classes.len(),
            self.methods.len()
        );
        inserted
    }

    fn process_class(&mut self, node: &ClassNode) -> bool {
        let namespace = node.namespace();
        let artifact = self.scope.class_artifact(&node.reference);

        if let Some(existing) = self.model.class_record(&namespace) {
            warn_on_artifact_clash(&namespace, existing.artifact.as_deref(), artifact.as_deref());
            return false;
        }

        let mut record = ClassRecord::new(artifact, &namespace);
        record.super_class = node.superclass.as_ref().map(|s| s.namespace());
        record.interfaces = node.interfaces.iter().map(|i| i.namespace()).collect();
        record.is_public = node.modifiers.public;
        record.is_private = node.modifiers.private;
        record.is_interface = node.modifiers.interface;
        record.is_abstract = node.modifiers.is_abstract;

        for method in &node.methods {
            let id = self.scope.resolve(self.methods, &node.method_reference(method));
            self.methods.tag_kind(id, method_kind(node, method));
            record.methods.insert(method.selector.clone());

            if !node.is_interface() && !method.is_abstract && method.is_overridable() {
                self.expected_calls(node, method, id, &mut record.expected_calls);
            }
        }

        self.model.add_class_record(record)
    }

    /// Every supertype declaration this concrete method can be dispatched from
    fn expected_calls(
        &mut self,
        node: &ClassNode,
        method: &MethodDeclaration,
        target: MethodId,
        out: &mut BTreeSet<ExpectedCall>,
    ) {
        let (superclasses, interfaces) = self.supertypes(node);

        let candidates = superclasses
            .into_iter()
            .map(|c| (c, ChaEdgeKind::Override))
            .chain(interfaces.into_iter().map(|i| (i, ChaEdgeKind::Implements)));

        for (supertype, kind) in candidates {
            let Some(declared) = supertype.declares(&method.selector) else {
                continue;
            };
            if !declared.is_overridable() {
                continue;
            }

            let source = self.scope.resolve(self.methods, &supertype.method_reference(declared));
            out.insert(ExpectedCall { source, target, kind });
        }
    }

    /// Superclass chain and all transitively implemented interfaces known to this hierarchy
    fn supertypes(&self, node: &ClassNode) -> (Vec<&'a ClassNode>, Vec<&'a ClassNode>) {
        let mut superclasses = Vec::new();
        let mut visited = HashSet::new();
        visited.insert(node.namespace());

        let mut pending_interfaces: Vec<String> = node.interfaces.iter().map(|i| i.namespace()).collect();

        let mut current = node.superclass.as_ref().map(|s| s.namespace());
        while let Some(namespace) = current {
            if !visited.insert(namespace.clone()) {
                break;
            }
            let Some(superclass) = self.index.get(&namespace).copied() else {
                break;
            };
            superclasses.push(superclass);
            pending_interfaces.extend(superclass.interfaces.iter().map(|i| i.namespace()));
            current = superclass.superclass.as_ref().map(|s| s.namespace());
        }

        let mut interfaces = Vec::new();
        while let Some(namespace) = pending_interfaces.pop() {
            if !visited.insert(namespace.clone()) {
                continue;
            }
            if let Some(interface) = self.index.get(&namespace).copied() {
                interfaces.push(interface);
                pending_interfaces.extend(interface.interfaces.iter().map(|i| i.namespace()));
            }
        }

        (superclasses, interfaces)
    }
}

/// Declared kind from class and method modifiers
fn method_kind(node: &ClassNode, method: &MethodDeclaration) -> MethodKind {
    if node.is_interface() {
        MethodKind::Interface
    } else if method.is_abstract {
        MethodKind::Abstract
    } else {
        MethodKind::Implementation
    }
}
