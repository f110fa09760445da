//! Provenance nodes and chains
//!
//! A chain is a singly linked list of [`TaintNode`]s, newest first. Nodes are
//! shared through `Rc`: many ranges (across many strings) may point at the
//! same head, and a head keeps its whole ancestry alive. Nodes are never
//! mutated after construction, so sharing is always safe.
//!
//! # Retain before release
//!
//! Whenever a handle is re-pointed (see [`TaintFlow::extend`]), the new node
//! takes its reference to the old head *before* the old handle is dropped.
//! The old head therefore never reaches a zero count in between, even when
//! the re-pointed handle was its only holder.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::rc::{Rc, Weak};

use super::operation::{TaintOperation, TaintSource};

/// One node of a provenance chain.
pub struct TaintNode {
    operation: TaintOperation,
    parent: Option<Rc<TaintNode>>,
}

impl TaintNode {
    pub fn operation(&self) -> &TaintOperation {
        &self.operation
    }

    /// The next older node, `None` for a source node.
    pub fn parent(&self) -> Option<&TaintNode> {
        self.parent.as_deref()
    }

    pub fn is_source(&self) -> bool {
        self.parent.is_none()
    }
}

impl Drop for TaintNode {
    // Unlink iteratively: long chains would otherwise recurse once per node.
    fn drop(&mut self) {
        let mut next = self.parent.take();
        while let Some(node) = next {
            match Rc::try_unwrap(node) {
                Ok(mut last_holder) => next = last_holder.parent.take(),
                Err(_) => break,
            }
        }
    }
}

impl fmt::Debug for TaintNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TaintNode")
            .field("operation", &self.operation)
            .field("is_source", &self.is_source())
            .finish()
    }
}

/// Handle to the head of a provenance chain.
///
/// Equality is identity of the head node: two chains built separately from
/// identical operations are *not* equal. Adjacent ranges merge only when their
/// flows are equal in this sense.
#[derive(Clone)]
pub struct TaintFlow {
    head: Rc<TaintNode>,
}

impl TaintFlow {
    /// Start a new chain at a source.
    pub fn new(source: TaintSource) -> Self {
        Self {
            head: Rc::new(TaintNode {
                operation: source,
                parent: None,
            }),
        }
    }

    /// Append `operation` as the new head, in place.
    pub fn extend(&mut self, operation: TaintOperation) -> &mut Self {
        // Retain the old head through the new node, then release our handle.
        let retained = Rc::clone(&self.head);
        let new_head = Rc::new(TaintNode {
            operation,
            parent: Some(retained),
        });
        self.head = new_head;
        self
    }

    /// A new chain whose head wraps `operation` on top of this one.
    /// `self` is left untouched.
    #[must_use]
    pub fn extended(&self, operation: TaintOperation) -> Self {
        let mut flow = self.clone();
        flow.extend(operation);
        flow
    }

    pub fn head(&self) -> &TaintNode {
        &self.head
    }

    /// Most recent operation.
    pub fn operation(&self) -> &TaintOperation {
        &self.head.operation
    }

    /// Operation of the terminal node, where the taint entered. O(depth).
    pub fn source(&self) -> &TaintOperation {
        let mut node: &TaintNode = &self.head;
        while let Some(parent) = node.parent() {
            node = parent;
        }
        &node.operation
    }

    /// Walk the chain from newest to source.
    pub fn iter(&self) -> FlowIter<'_> {
        FlowIter {
            current: Some(&self.head),
        }
    }

    /// Operations from newest to source.
    pub fn operations(&self) -> impl Iterator<Item = &TaintOperation> + '_ {
        self.iter().map(TaintNode::operation)
    }

    /// Number of nodes in the chain.
    pub fn depth(&self) -> usize {
        self.iter().count()
    }

    /// Identity comparison of the head nodes.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.head, &other.head)
    }

    /// Number of live handles on the head node.
    pub fn holders(&self) -> usize {
        Rc::strong_count(&self.head)
    }

    /// Weak handle on the head, for observing when it is freed.
    pub fn downgrade(&self) -> Weak<TaintNode> {
        Rc::downgrade(&self.head)
    }

    pub(crate) fn head_ptr(&self) -> *const TaintNode {
        Rc::as_ptr(&self.head)
    }
}

impl PartialEq for TaintFlow {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl Eq for TaintFlow {}

impl Hash for TaintFlow {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.head_ptr().hash(state);
    }
}

impl From<TaintOperation> for TaintFlow {
    fn from(source: TaintOperation) -> Self {
        Self::new(source)
    }
}

impl fmt::Debug for TaintFlow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.operations().map(TaintOperation::name))
            .finish()
    }
}

impl<'a> IntoIterator for &'a TaintFlow {
    type Item = &'a TaintNode;
    type IntoIter = FlowIter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Cursor over a chain, newest node first.
#[derive(Debug, Clone)]
pub struct FlowIter<'a> {
    current: Option<&'a TaintNode>,
}

impl<'a> Iterator for FlowIter<'a> {
    type Item = &'a TaintNode;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.current?;
        self.current = node.parent();
        Some(node)
    }
}

impl std::iter::FusedIterator for FlowIter<'_> {}
