//! The Graph store: Nodes, Edges, Topics, and Named Node Lists.
//!
//! Ownership follows an arena-plus-IDs model: the store owns every Node
//! and Edge in `HashMap`s keyed by ID, and cross-references are stored
//! as ID values, never borrowed references or raw pointers.

use std::collections::{HashMap, HashSet, VecDeque};

use crate::error::GraphError;
use crate::id::{EdgeId, NodeId};
use crate::time::TdPattern;

/// A Node's target-date classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TdProperty {
    Unspecified,
    Inherit,
    Variable,
    Fixed,
    Exact,
}

impl TdProperty {
    pub const fn is_movable(self) -> bool {
        matches!(self, TdProperty::Variable | TdProperty::Unspecified)
    }
}

/// A 16-bit Topic identifier.
pub type TopicId = u16;

/// A category tag, with a set of keywords each carrying a relevance in
/// `[0, 1]`.
#[derive(Debug, Clone, PartialEq)]
pub struct Topic {
    pub id: TopicId,
    pub tag: String,
    pub keywords: HashMap<String, f64>,
}

/// A unit of intended work.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub id: NodeId,
    pub description: String,
    /// Estimated effort in seconds (exposed as hours via `effort_hours`).
    pub effort_secs: u64,
    /// Completion ratio; values in `[0, 1]`, or negative to denote a
    /// special "other" state.
    pub completion_ratio: f64,
    pub valuation: f64,
    pub target_date: Option<i64>,
    pub td_property: TdProperty,
    pub repeats: bool,
    pub td_pattern: TdPattern,
    pub td_every: u32,
    /// Iterations remaining; 0 = unlimited. Decremented on each advance.
    pub td_span: u32,
    /// Whether this Node should snap to `doearlier_endofday` rather than
    /// `dolater_endofday` during end-of-day adjustment.
    pub urgent: bool,
    pub topics: HashMap<TopicId, f64>,
    /// Non-owning: incident dependency Edges (this Node is the dependent).
    pub dep_edges: HashSet<EdgeId>,
    /// Non-owning: incident superior Edges (this Node is the dependency of
    /// the superior).
    pub sup_edges: HashSet<EdgeId>,
    pub lists: HashSet<String>,
}

impl Node {
    pub fn new(id: NodeId, description: impl Into<String>) -> Self {
        Node {
            id,
            description: description.into(),
            effort_secs: 0,
            completion_ratio: 0.0,
            valuation: 0.0,
            target_date: None,
            td_property: TdProperty::Unspecified,
            repeats: false,
            td_pattern: TdPattern::NonPeriodic,
            td_every: 1,
            td_span: 0,
            urgent: false,
            topics: HashMap::new(),
            dep_edges: HashSet::new(),
            sup_edges: HashSet::new(),
            lists: HashSet::new(),
        }
    }

    pub fn effort_hours(&self) -> f64 {
        self.effort_secs as f64 / 3600.0
    }

    pub fn is_complete(&self) -> bool {
        self.completion_ratio >= 1.0
    }
}

/// A directed dependency relation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Edge {
    pub id: EdgeId,
    pub dependency: f64,
    pub significance: f64,
    pub importance: f64,
    pub urgency: f64,
    pub priority: f64,
}

impl Edge {
    pub fn new(id: EdgeId) -> Self {
        Edge {
            id,
            dependency: 0.0,
            significance: 0.0,
            importance: 0.0,
            urgency: 0.0,
            priority: 0.0,
        }
    }

    fn clamp_scalars(&mut self) {
        self.dependency = self.dependency.clamp(0.0, 1.0);
        self.significance = self.significance.clamp(0.0, 1.0);
        self.importance = self.importance.clamp(0.0, 1.0);
        self.urgency = self.urgency.clamp(0.0, 1.0);
        self.priority = self.priority.clamp(0.0, 1.0);
    }
}

/// A named, ordered container of Node references.
#[derive(Debug, Clone, PartialEq)]
pub struct NamedNodeList {
    pub name: String,
    pub max_size: Option<usize>,
    pub unique: bool,
    pub fifo: bool,
    pub prepend: bool,
    pub persistent: bool,
    nodes: VecDeque<NodeId>,
}

impl NamedNodeList {
    pub fn new(name: impl Into<String>) -> Self {
        NamedNodeList {
            name: name.into(),
            max_size: None,
            unique: true,
            fifo: true,
            prepend: false,
            persistent: true,
            nodes: VecDeque::new(),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &NodeId> {
        self.nodes.iter()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    fn push(&mut self, id: NodeId) -> Result<(), GraphError> {
        if self.unique && self.nodes.contains(&id) {
            return Err(GraphError::ListDuplicate(id, self.name.clone()));
        }
        if let Some(max) = self.max_size {
            if self.nodes.len() >= max {
                if self.fifo {
                    self.nodes.pop_front();
                } else {
                    return Err(GraphError::ListFull(self.name.clone()));
                }
            }
        }
        if self.prepend {
            self.nodes.push_front(id);
        } else {
            self.nodes.push_back(id);
        }
        Ok(())
    }

    fn remove(&mut self, id: NodeId) {
        self.nodes.retain(|n| *n != id);
    }
}

/// Names of the three reserved Named Node Lists the core relies on.
pub const LIST_SHORTLIST: &str = "shortlist";
pub const LIST_RECENT: &str = "recent";
pub const LIST_INCOMPLETE: &str = "_incomplete";

/// The in-memory arena owning every Node, Edge, Topic, and Named Node List.
#[derive(Debug, Default)]
pub struct GraphStore {
    nodes: HashMap<NodeId, Node>,
    edges: HashMap<EdgeId, Edge>,
    topics: HashMap<TopicId, Topic>,
    topic_tag_index: HashMap<String, TopicId>,
    next_topic_id: TopicId,
    lists: HashMap<String, NamedNodeList>,
}

impl GraphStore {
    pub fn new() -> Self {
        GraphStore::default()
    }

    // ---- Topics ----------------------------------------------------

    /// Register a new Topic tag, returning its assigned ID. Re-registering
    /// an existing tag returns its existing ID unchanged.
    pub fn register_topic(&mut self, tag: impl Into<String>) -> TopicId {
        let tag = tag.into();
        if let Some(&id) = self.topic_tag_index.get(&tag) {
            return id;
        }
        let id = self.next_topic_id;
        self.next_topic_id += 1;
        self.topics.insert(
            id,
            Topic {
                id,
                tag: tag.clone(),
                keywords: HashMap::new(),
            },
        );
        self.topic_tag_index.insert(tag, id);
        id
    }

    pub fn topics(&self) -> impl Iterator<Item = &Topic> {
        self.topics.values()
    }

    pub fn find_topic_by_tag(&self, tag: &str) -> Option<&Topic> {
        self.topic_tag_index.get(tag).and_then(|id| self.topics.get(id))
    }

    pub fn topic_by_id(&self, id: TopicId) -> Option<&Topic> {
        self.topics.get(&id)
    }

    // ---- Nodes -------------------------------------------------------

    /// Add a new Node. Fails on ID collision or missing topic tags
    /// (unless `allow_empty_topics` — see `GraphStore::add_node_unchecked`
    /// for batch-validation use where a whole batch is checked atomically
    /// beforehand).
    pub fn add_node(&mut self, node: Node) -> Result<(), GraphError> {
        if self.nodes.contains_key(&node.id) {
            return Err(GraphError::IdCollision(node.id));
        }
        if node.topics.is_empty() {
            return Err(GraphError::NoTopicTags(node.id));
        }
        for &topic_id in node.topics.keys() {
            if !self.topics.contains_key(&topic_id) {
                return Err(GraphError::UnknownTopic(topic_id.to_string()));
            }
        }
        if node.repeats
            && (node.td_pattern == TdPattern::NonPeriodic
                || matches!(node.td_property, TdProperty::Variable | TdProperty::Unspecified))
        {
            return Err(GraphError::InvalidRepeatConfig(node.id));
        }
        self.nodes.insert(node.id, node);
        Ok(())
    }

    pub fn node_by_id(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(&id)
    }

    pub fn node_by_id_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(&id)
    }

    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.values()
    }

    pub fn contains_node(&self, id: NodeId) -> bool {
        self.nodes.contains_key(&id)
    }

    /// Apply a partial edit to an existing Node. Each `Some` field in
    /// `edit` overwrites the corresponding Node field; `None` leaves it
    /// untouched.
    pub fn edit_node(&mut self, id: NodeId, edit: NodeEdit) -> Result<(), GraphError> {
        let node = self.nodes.get_mut(&id).ok_or(GraphError::NodeNotFound(id))?;
        if let Some(v) = edit.description {
            node.description = v;
        }
        if let Some(v) = edit.effort_secs {
            node.effort_secs = v;
        }
        if let Some(v) = edit.completion_ratio {
            node.completion_ratio = v;
        }
        if let Some(v) = edit.valuation {
            node.valuation = v;
        }
        if let Some(v) = edit.target_date {
            node.target_date = v;
        }
        if let Some(v) = edit.td_property {
            node.td_property = v;
        }
        if let Some(v) = edit.repeats {
            node.repeats = v;
        }
        if let Some(v) = edit.td_pattern {
            node.td_pattern = v;
        }
        if let Some(v) = edit.td_every {
            node.td_every = v;
        }
        if let Some(v) = edit.td_span {
            node.td_span = v;
        }
        if let Some(v) = edit.urgent {
            node.urgent = v;
        }
        Ok(())
    }

    // ---- Edges ---------------------------------------------------------

    pub fn add_edge(&mut self, mut edge: Edge) -> Result<(), GraphError> {
        if !self.nodes.contains_key(&edge.id.dep) {
            return Err(GraphError::EndpointMissing(edge.id.dep));
        }
        if !self.nodes.contains_key(&edge.id.sup) {
            return Err(GraphError::EndpointMissing(edge.id.sup));
        }
        if self.edges.contains_key(&edge.id) {
            return Err(GraphError::DuplicateEdge(edge.id));
        }
        edge.clamp_scalars();
        let id = edge.id;
        self.edges.insert(id, edge);
        if let Some(dep_node) = self.nodes.get_mut(&id.dep) {
            dep_node.sup_edges.insert(id);
        }
        if let Some(sup_node) = self.nodes.get_mut(&id.sup) {
            sup_node.dep_edges.insert(id);
        }
        Ok(())
    }

    pub fn edit_edge(&mut self, id: EdgeId, edit: EdgeEdit) -> Result<(), GraphError> {
        let edge = self.edges.get_mut(&id).ok_or(GraphError::EdgeNotFound(id))?;
        if let Some(v) = edit.dependency {
            edge.dependency = v;
        }
        if let Some(v) = edit.significance {
            edge.significance = v;
        }
        if let Some(v) = edit.importance {
            edge.importance = v;
        }
        if let Some(v) = edit.urgency {
            edge.urgency = v;
        }
        if let Some(v) = edit.priority {
            edge.priority = v;
        }
        edge.clamp_scalars();
        Ok(())
    }

    pub fn edge_by_id(&self, id: EdgeId) -> Option<&Edge> {
        self.edges.get(&id)
    }

    /// All Edges (incoming and outgoing) incident to `node`.
    pub fn edges_of(&self, node: NodeId) -> Vec<&Edge> {
        let Some(n) = self.nodes.get(&node) else {
            return Vec::new();
        };
        n.dep_edges
            .iter()
            .chain(n.sup_edges.iter())
            .filter_map(|id| self.edges.get(id))
            .collect()
    }

    /// Edges where `node` is the dependency (i.e. `node` depends on them).
    pub fn dep_edges(&self, node: NodeId) -> Vec<&Edge> {
        let Some(n) = self.nodes.get(&node) else {
            return Vec::new();
        };
        n.sup_edges.iter().filter_map(|id| self.edges.get(id)).collect()
    }

    /// Edges where `node` is the superior (i.e. depend on by others).
    pub fn sup_edges(&self, node: NodeId) -> Vec<&Edge> {
        let Some(n) = self.nodes.get(&node) else {
            return Vec::new();
        };
        n.dep_edges.iter().filter_map(|id| self.edges.get(id)).collect()
    }

    /// Remove a Node's incident Edges along with the Node itself. Internal
    /// plumbing used only by the removal cascade; Nodes themselves are
    /// never destroyed during normal operation, so this is not exposed
    /// as a top-level modification-request kind.
    pub(crate) fn remove_node_cascade(&mut self, id: NodeId) {
        if let Some(node) = self.nodes.remove(&id) {
            for edge_id in node.dep_edges.iter().chain(node.sup_edges.iter()) {
                self.edges.remove(edge_id);
            }
            for list in self.lists.values_mut() {
                list.remove(id);
            }
        }
    }

    // ---- Named Node Lists ----------------------------------------------

    pub fn list(&self, name: &str) -> Option<&NamedNodeList> {
        self.lists.get(name)
    }

    pub fn add_to_list(&mut self, name: &str, node: NodeId) -> Result<(), GraphError> {
        if !self.nodes.contains_key(&node) {
            return Err(GraphError::EndpointMissing(node));
        }
        let list = self
            .lists
            .entry(name.to_string())
            .or_insert_with(|| NamedNodeList::new(name));
        list.push(node)?;
        if let Some(n) = self.nodes.get_mut(&node) {
            n.lists.insert(name.to_string());
        }
        Ok(())
    }

    pub fn remove_from_list(&mut self, name: &str, id: NodeId) -> Result<(), GraphError> {
        let list = self.lists.get_mut(name).ok_or_else(|| GraphError::ListNotFound(name.to_string()))?;
        list.remove(id);
        if let Some(n) = self.nodes.get_mut(&id) {
            n.lists.remove(name);
        }
        Ok(())
    }

    pub fn delete_list(&mut self, name: &str) -> Result<(), GraphError> {
        let list = self.lists.remove(name).ok_or_else(|| GraphError::ListNotFound(name.to_string()))?;
        for id in list.iter() {
            if let Some(n) = self.nodes.get_mut(id) {
                n.lists.remove(name);
            }
        }
        Ok(())
    }

    /// Copy up to `max` Node IDs from `from` into `to` (0 = no limit).
    pub fn copy_list(&mut self, from: &str, to: &str, max: usize) -> Result<usize, GraphError> {
        let source: Vec<NodeId> = self
            .lists
            .get(from)
            .ok_or_else(|| GraphError::ListNotFound(from.to_string()))?
            .iter()
            .copied()
            .collect();
        let take_n = if max == 0 { source.len() } else { max.min(source.len()) };
        let mut copied = 0;
        for id in source.into_iter().take(take_n) {
            if self.add_to_list(to, id).is_ok() {
                copied += 1;
            }
        }
        Ok(copied)
    }

    /// Rebuild the `shortlist` reserved list: up to 5 recently-touched
    /// Nodes (from `recent`) plus up to 10 incomplete Nodes sorted by
    /// effective target date, mirroring `update_shortlist_List`'s
    /// selection rule.
    pub fn rebuild_shortlist(&mut self, incomplete_sorted_by_eff_td: &[NodeId]) -> usize {
        self.lists.remove(LIST_SHORTLIST);
        let recent: Vec<NodeId> = self
            .lists
            .get(LIST_RECENT)
            .map(|l| l.iter().take(5).copied().collect())
            .unwrap_or_default();
        let mut count = 0;
        for id in recent {
            if self.add_to_list(LIST_SHORTLIST, id).is_ok() {
                count += 1;
            }
        }
        for &id in incomplete_sorted_by_eff_td.iter().take(10) {
            if self.add_to_list(LIST_SHORTLIST, id).is_ok() {
                count += 1;
            }
        }
        count
    }

    /// Record that `id` was touched, maintaining the `recent` reserved
    /// list (most-recently-touched first, capped at a small rolling
    /// window).
    pub fn touch_recent(&mut self, id: NodeId, cap: usize) {
        let list = self
            .lists
            .entry(LIST_RECENT.to_string())
            .or_insert_with(|| {
                let mut l = NamedNodeList::new(LIST_RECENT);
                l.prepend = true;
                l.unique = true;
                l.fifo = true;
                l.max_size = Some(cap);
                l
            });
        list.remove(id);
        let _ = list.push(id);
    }
}

/// Partial edit to a Node's fields; `None` means "leave untouched" (spec
/// §9's replacement for the Edit-flags bitmask).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NodeEdit {
    pub description: Option<String>,
    pub effort_secs: Option<u64>,
    pub completion_ratio: Option<f64>,
    pub valuation: Option<f64>,
    pub target_date: Option<Option<i64>>,
    pub td_property: Option<TdProperty>,
    pub repeats: Option<bool>,
    pub td_pattern: Option<TdPattern>,
    pub td_every: Option<u32>,
    pub td_span: Option<u32>,
    pub urgent: Option<bool>,
}

/// Partial edit to an Edge's scalar payload.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct EdgeEdit {
    pub dependency: Option<f64>,
    pub significance: Option<f64>,
    pub importance: Option<f64>,
    pub urgency: Option<f64>,
    pub priority: Option<f64>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn nid(minor: u8) -> NodeId {
        NodeId::new(2024, 1, 1, 0, 0, 0, minor).unwrap()
    }

    fn node_with_topic(store: &mut GraphStore, minor: u8) -> Node {
        let topic = store.register_topic("work");
        let mut n = Node::new(nid(minor), "test node");
        n.topics.insert(topic, 1.0);
        n
    }

    #[test]
    fn add_node_rejects_id_collision() {
        let mut store = GraphStore::new();
        let n1 = node_with_topic(&mut store, 1);
        store.add_node(n1.clone()).unwrap();
        let err = store.add_node(n1).unwrap_err();
        assert!(matches!(err, GraphError::IdCollision(_)));
    }

    #[test]
    fn add_node_rejects_missing_topics() {
        let mut store = GraphStore::new();
        let n = Node::new(nid(1), "no topics");
        let err = store.add_node(n).unwrap_err();
        assert!(matches!(err, GraphError::NoTopicTags(_)));
    }

    #[test]
    fn add_edge_requires_both_endpoints() {
        let mut store = GraphStore::new();
        let n1 = node_with_topic(&mut store, 1);
        store.add_node(n1).unwrap();
        let edge = Edge::new(EdgeId::new(nid(1), nid(2)));
        let err = store.add_edge(edge).unwrap_err();
        assert!(matches!(err, GraphError::EndpointMissing(_)));
    }

    #[test]
    fn add_edge_clamps_scalars_and_indexes_both_endpoints() {
        let mut store = GraphStore::new();
        let a = node_with_topic(&mut store, 1);
        let b = node_with_topic(&mut store, 2);
        store.add_node(a).unwrap();
        store.add_node(b).unwrap();
        let mut edge = Edge::new(EdgeId::new(nid(1), nid(2)));
        edge.priority = 2.0; // out of range, should clamp
        store.add_edge(edge).unwrap();
        let stored = store.edge_by_id(EdgeId::new(nid(1), nid(2))).unwrap();
        assert_eq!(stored.priority, 1.0);
        assert_eq!(store.dep_edges(nid(1)).len(), 1);
        assert_eq!(store.sup_edges(nid(2)).len(), 1);
    }

    #[test]
    fn rejects_duplicate_edge() {
        let mut store = GraphStore::new();
        let a = node_with_topic(&mut store, 1);
        let b = node_with_topic(&mut store, 2);
        store.add_node(a).unwrap();
        store.add_node(b).unwrap();
        let edge = Edge::new(EdgeId::new(nid(1), nid(2)));
        store.add_edge(edge).unwrap();
        let dup = Edge::new(EdgeId::new(nid(1), nid(2)));
        assert!(matches!(store.add_edge(dup), Err(GraphError::DuplicateEdge(_))));
    }

    #[test]
    fn repeating_node_requires_periodic_pattern_and_fixed_property() {
        let mut store = GraphStore::new();
        let topic = store.register_topic("chores");
        let mut n = Node::new(nid(1), "laundry");
        n.topics.insert(topic, 1.0);
        n.repeats = true;
        n.td_pattern = TdPattern::Weekly;
        n.td_property = TdProperty::Variable; // invalid combination
        let err = store.add_node(n).unwrap_err();
        assert!(matches!(err, GraphError::InvalidRepeatConfig(_)));
    }

    #[test]
    fn named_node_list_add_remove_and_unique() {
        let mut store = GraphStore::new();
        let a = node_with_topic(&mut store, 1);
        store.add_node(a).unwrap();
        store.add_to_list("todo", nid(1)).unwrap();
        assert_eq!(store.list("todo").unwrap().len(), 1);
        assert!(store.add_to_list("todo", nid(1)).is_err()); // unique by default
        store.remove_from_list("todo", nid(1)).unwrap();
        assert_eq!(store.list("todo").unwrap().len(), 0);
    }

    #[test]
    fn edit_node_only_touches_some_fields() {
        let mut store = GraphStore::new();
        let n = node_with_topic(&mut store, 1);
        store.add_node(n).unwrap();
        let edit = NodeEdit {
            completion_ratio: Some(0.5),
            ..Default::default()
        };
        store.edit_node(nid(1), edit).unwrap();
        let updated = store.node_by_id(nid(1)).unwrap();
        assert_eq!(updated.completion_ratio, 0.5);
        assert_eq!(updated.description, "test node");
    }

    #[test]
    fn shortlist_combines_recent_and_incomplete() {
        let mut store = GraphStore::new();
        for i in 1..=3 {
            let n = node_with_topic(&mut store, i);
            store.add_node(n).unwrap();
            store.touch_recent(nid(i), 5);
        }
        let incomplete = vec![nid(1), nid(2), nid(3)];
        let count = store.rebuild_shortlist(&incomplete);
        assert!(count > 0);
        assert!(store.list(LIST_SHORTLIST).unwrap().len() <= 15);
    }
}
