//! Outline node data structures.
//!
//! A [`Node`] is one entry of the course outline as the remote service
//! describes it: the course itself, a section, a subsection, a unit or a
//! component. Children are kept in document order.

use serde::{Deserialize, Serialize};

// ─────────────────────────────────────────────────────────────────────────────
// Category
// ─────────────────────────────────────────────────────────────────────────────

/// The block category of an outline node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    /// The course root
    Course,
    /// A section
    Chapter,
    /// A subsection
    Sequential,
    /// A unit
    Vertical,
    /// Any leaf component (html, problem, video, ...)
    #[serde(other)]
    Component,
}

impl Category {
    /// The category of children this category admits, if any.
    pub fn child_category(&self) -> Option<Category> {
        match self {
            Category::Course => Some(Category::Chapter),
            Category::Chapter => Some(Category::Sequential),
            Category::Sequential => Some(Category::Vertical),
            Category::Vertical => Some(Category::Component),
            Category::Component => None,
        }
    }

    /// Whether nodes of this category carry a child list.
    pub fn admits_children(&self) -> bool {
        self.child_category().is_some()
    }

    /// Whether the outline lets the user collapse nodes of this category.
    pub fn is_collapsible(&self) -> bool {
        matches!(self, Category::Chapter | Category::Sequential)
    }

    /// Front-end terminology for the category.
    pub fn xblock_type(&self) -> &'static str {
        match self {
            Category::Course => "course",
            Category::Chapter => "section",
            Category::Sequential => "subsection",
            Category::Vertical => "unit",
            Category::Component => "component",
        }
    }

    /// Capitalized type name for labels.
    pub fn type_display_name(&self) -> &'static str {
        match self {
            Category::Course => "Course",
            Category::Chapter => "Section",
            Category::Sequential => "Subsection",
            Category::Vertical => "Unit",
            Category::Component => "Component",
        }
    }

    /// Wire name of the category.
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Course => "course",
            Category::Chapter => "chapter",
            Category::Sequential => "sequential",
            Category::Vertical => "vertical",
            Category::Component => "component",
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Visibility
// ─────────────────────────────────────────────────────────────────────────────

/// Publishing/visibility state reported by the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VisibilityState {
    Live,
    Ready,
    #[default]
    Unscheduled,
    NeedsAttention,
    StaffOnly,
    Gated,
}

impl VisibilityState {
    /// Class name used to style an item in this state.
    pub fn css_class(&self) -> &'static str {
        match self {
            VisibilityState::Live => "is-live",
            VisibilityState::Ready => "is-ready",
            VisibilityState::NeedsAttention => "has-warnings",
            VisibilityState::StaffOnly => "is-staff-only",
            VisibilityState::Gated => "is-gated",
            VisibilityState::Unscheduled => "",
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Node
// ─────────────────────────────────────────────────────────────────────────────

/// Child list of a node, plus the category and label of what it holds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChildInfo {
    pub category: Category,
    /// Label used for "New <label>" buttons and default child names
    pub display_name: String,
    #[serde(default)]
    pub children: Vec<Node>,
}

/// Staff lock details of a node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StaffLockInfo {
    pub has_explicit_lock: bool,
    #[serde(default)]
    pub message: String,
}

/// One entry of the course outline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub id: String,
    pub category: Category,
    pub display_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub child_info: Option<ChildInfo>,
    #[serde(default)]
    pub visibility_state: VisibilityState,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub staff_lock: Option<StaffLockInfo>,
    /// `Some(false)` forces the header-suppressed display mode
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_header_visible: Option<bool>,
}

impl Node {
    /// Create a node with an empty child list when its category admits one.
    pub fn new(id: impl Into<String>, category: Category, display_name: impl Into<String>) -> Self {
        let child_info = category.child_category().map(|child| ChildInfo {
            category: child,
            display_name: child.type_display_name().to_string(),
            children: Vec::new(),
        });
        Self {
            id: id.into(),
            category,
            display_name: display_name.into(),
            child_info,
            visibility_state: VisibilityState::default(),
            staff_lock: None,
            is_header_visible: None,
        }
    }

    /// Replace the children of this node.
    ///
    /// Ignored for categories that admit no children.
    #[cfg(test)]
    pub fn with_children(mut self, children: Vec<Node>) -> Self {
        if let Some(info) = self.child_info.as_mut() {
            info.children = children;
        }
        self
    }

    /// Children in document order (empty for leaves).
    pub fn children(&self) -> &[Node] {
        self.child_info
            .as_ref()
            .map(|info| info.children.as_slice())
            .unwrap_or(&[])
    }

    pub fn children_mut(&mut self) -> Option<&mut Vec<Node>> {
        self.child_info.as_mut().map(|info| &mut info.children)
    }

    /// Find a node by locator in this subtree.
    pub fn find(&self, id: &str) -> Option<&Node> {
        if self.id == id {
            return Some(self);
        }
        self.children().iter().find_map(|child| child.find(id))
    }

    /// Find a mutable node by locator in this subtree.
    pub fn find_mut(&mut self, id: &str) -> Option<&mut Node> {
        if self.id == id {
            return Some(self);
        }
        self.children_mut()?
            .iter_mut()
            .find_map(|child| child.find_mut(id))
    }

    /// Find the parent of the node with the given locator.
    pub fn find_parent(&self, id: &str) -> Option<&Node> {
        if self.children().iter().any(|child| child.id == id) {
            return Some(self);
        }
        self.children()
            .iter()
            .find_map(|child| child.find_parent(id))
    }

    /// Whether any attribute the outline displays differs from `other`.
    pub fn has_changed_attributes(&self, other: &Node) -> bool {
        self.visibility_state != other.visibility_state
            || self.child_info != other.child_info
            || self.display_name != other.display_name
            || self.staff_lock != other.staff_lock
    }

    /// Whether `child_info` is present exactly when the category admits children.
    pub fn is_well_formed(&self) -> bool {
        self.child_info.is_some() == self.category.admits_children()
            && self.children().iter().all(Node::is_well_formed)
    }

    /// All locators in this subtree, depth first.
    pub fn locators(&self) -> Vec<String> {
        let mut ids = Vec::new();
        self.collect_locators(&mut ids);
        ids
    }

    fn collect_locators(&self, ids: &mut Vec<String>) {
        ids.push(self.id.clone());
        for child in self.children() {
            child.collect_locators(ids);
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_course() -> Node {
        Node::new("course", Category::Course, "Demo").with_children(vec![
            Node::new("c1", Category::Chapter, "Week 1").with_children(vec![
                Node::new("s1", Category::Sequential, "Intro")
                    .with_children(vec![Node::new("u1", Category::Vertical, "Welcome")]),
            ]),
            Node::new("c2", Category::Chapter, "Week 2"),
        ])
    }

    #[test]
    fn test_child_info_follows_category() {
        assert!(Node::new("x", Category::Chapter, "S").child_info.is_some());
        assert!(Node::new("x", Category::Component, "C").child_info.is_none());
        assert!(sample_course().is_well_formed());
    }

    #[test]
    fn test_with_children_ignored_for_leaf() {
        let leaf = Node::new("p", Category::Component, "Problem")
            .with_children(vec![Node::new("q", Category::Component, "Q")]);
        assert!(leaf.children().is_empty());
    }

    #[test]
    fn test_find_and_parent() {
        let course = sample_course();
        assert_eq!(course.find("u1").unwrap().display_name, "Welcome");
        assert_eq!(course.find_parent("s1").unwrap().id, "c1");
        assert_eq!(course.find_parent("c2").unwrap().id, "course");
        assert!(course.find_parent("course").is_none());
        assert!(course.find("missing").is_none());
    }

    #[test]
    fn test_locators_in_document_order() {
        assert_eq!(
            sample_course().locators(),
            vec!["course", "c1", "s1", "u1", "c2"]
        );
    }

    #[test]
    fn test_has_changed_attributes() {
        let base = Node::new("c1", Category::Chapter, "Week 1");

        let mut renamed = base.clone();
        renamed.display_name = "Week One".to_string();
        assert!(base.has_changed_attributes(&renamed));

        let mut locked = base.clone();
        locked.staff_lock = Some(StaffLockInfo {
            has_explicit_lock: true,
            message: "Staff only".to_string(),
        });
        assert!(base.has_changed_attributes(&locked));

        let mut header = base.clone();
        header.is_header_visible = Some(true);
        assert!(!base.has_changed_attributes(&header));
    }

    #[test]
    fn test_deserialize_unknown_category_as_component() {
        let json = r#"{"id": "p1", "category": "problem", "display_name": "Quiz"}"#;
        let node: Node = serde_json::from_str(json).unwrap();
        assert_eq!(node.category, Category::Component);
        assert_eq!(node.visibility_state, VisibilityState::Unscheduled);
    }

    #[test]
    fn test_visibility_classes() {
        assert_eq!(VisibilityState::NeedsAttention.css_class(), "has-warnings");
        assert_eq!(VisibilityState::Unscheduled.css_class(), "");
    }

    #[test]
    fn test_category_terminology() {
        assert_eq!(Category::Chapter.xblock_type(), "section");
        assert_eq!(Category::Sequential.type_display_name(), "Subsection");
        assert!(Category::Sequential.is_collapsible());
        assert!(!Category::Course.is_collapsible());
        assert_eq!(Category::Vertical.child_category(), Some(Category::Component));
    }
}
