//! The rendered form of an outline node.
//!
//! A [`RenderedElement`] is what a view produces on `render()`: the labels and
//! classes of the node's row plus the controls the user may trigger on it.
//! The egui panel draws these and turns clicks into tree actions.

use super::node::{Category, Node};

/// Data carried by a "New <child>" button.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddChildButton {
    pub category: Category,
    /// Locator of the node the child is created under
    pub parent: String,
    pub default_name: String,
    pub label: String,
}

/// A control offered on a rendered row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Control {
    ToggleCollapse,
    Rename,
    Delete,
    Duplicate,
    AddChild(AddChildButton),
}

/// One rendered outline row.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedElement {
    pub locator: String,
    pub category: Category,
    pub display_name: String,
    pub xblock_type: &'static str,
    pub type_display_name: &'static str,
    pub parent_type: Option<&'static str>,
    pub visibility_class: &'static str,
    /// `list-<type>s`
    pub list_class: String,
    /// `outline-<type>`
    pub outline_class: String,
    pub is_collapsed: bool,
    pub includes_children: bool,
    pub header_visible: bool,
    pub has_explicit_staff_lock: bool,
    pub staff_lock_message: Option<String>,
    pub controls: Vec<Control>,
}

impl RenderedElement {
    /// Build the element for `node`.
    pub fn build(
        node: &Node,
        parent: Option<Category>,
        includes_children: bool,
        is_collapsed: bool,
    ) -> Self {
        let xblock_type = node.category.xblock_type();
        let header_visible = node.is_header_visible != Some(false);
        let staff_lock = node.staff_lock.as_ref();

        Self {
            locator: node.id.clone(),
            category: node.category,
            display_name: node.display_name.clone(),
            xblock_type,
            type_display_name: node.category.type_display_name(),
            parent_type: parent.map(|category| category.xblock_type()),
            visibility_class: node.visibility_state.css_class(),
            list_class: format!("list-{}s", xblock_type),
            outline_class: format!("outline-{}", xblock_type),
            is_collapsed,
            includes_children,
            header_visible,
            has_explicit_staff_lock: staff_lock.is_some_and(|lock| lock.has_explicit_lock),
            staff_lock_message: staff_lock
                .map(|lock| lock.message.clone())
                .filter(|message| !message.is_empty()),
            controls: controls_for(node, header_visible),
        }
    }

    pub fn has_control(&self, wanted: &Control) -> bool {
        self.controls.iter().any(|control| control == wanted)
    }

    /// The "New <child>" button, if this row has one.
    pub fn add_button(&self) -> Option<&AddChildButton> {
        self.controls.iter().find_map(|control| match control {
            Control::AddChild(button) => Some(button),
            _ => None,
        })
    }
}

fn controls_for(node: &Node, header_visible: bool) -> Vec<Control> {
    let mut controls = Vec::new();
    match node.category {
        Category::Course => {}
        Category::Chapter | Category::Sequential => {
            if header_visible {
                controls.push(Control::ToggleCollapse);
            }
            controls.extend([Control::Rename, Control::Duplicate, Control::Delete]);
        }
        Category::Vertical => {
            controls.extend([Control::Rename, Control::Duplicate, Control::Delete]);
        }
        Category::Component => return controls,
    }

    // Units are edited on their own page; the outline stops at them
    if node.category != Category::Vertical {
        if let Some(info) = &node.child_info {
            controls.push(Control::AddChild(AddChildButton {
                category: info.category,
                parent: node.id.clone(),
                default_name: info.display_name.clone(),
                label: format!("New {}", info.display_name),
            }));
        }
    }
    controls
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::outline::node::{StaffLockInfo, VisibilityState};

    #[test]
    fn test_section_element() {
        let mut node = Node::new("c1", Category::Chapter, "Week 1");
        node.visibility_state = VisibilityState::Live;
        let element = RenderedElement::build(&node, Some(Category::Course), true, false);

        assert_eq!(element.xblock_type, "section");
        assert_eq!(element.type_display_name, "Section");
        assert_eq!(element.parent_type, Some("course"));
        assert_eq!(element.visibility_class, "is-live");
        assert_eq!(element.list_class, "list-sections");
        assert_eq!(element.outline_class, "outline-section");
        assert!(element.has_control(&Control::ToggleCollapse));
        assert!(element.has_control(&Control::Delete));

        let button = element.add_button().unwrap();
        assert_eq!(button.category, Category::Sequential);
        assert_eq!(button.parent, "c1");
        assert_eq!(button.default_name, "Subsection");
        assert_eq!(button.label, "New Subsection");
    }

    #[test]
    fn test_course_only_adds_sections() {
        let node = Node::new("course", Category::Course, "Demo");
        let element = RenderedElement::build(&node, None, true, false);
        assert_eq!(element.controls.len(), 1);
        assert_eq!(element.add_button().unwrap().label, "New Section");
    }

    #[test]
    fn test_unit_has_no_add_button() {
        let node = Node::new("u1", Category::Vertical, "Welcome");
        let element = RenderedElement::build(&node, Some(Category::Sequential), false, false);
        assert!(element.add_button().is_none());
        assert!(element.has_control(&Control::Duplicate));
        assert!(!element.has_control(&Control::ToggleCollapse));
    }

    #[test]
    fn test_header_suppressed_has_no_toggle() {
        let mut node = Node::new("s1", Category::Sequential, "Intro");
        node.is_header_visible = Some(false);
        let element = RenderedElement::build(&node, Some(Category::Chapter), true, false);
        assert!(!element.header_visible);
        assert!(!element.has_control(&Control::ToggleCollapse));
    }

    #[test]
    fn test_staff_lock_message() {
        let mut node = Node::new("c1", Category::Chapter, "Week 1");
        node.staff_lock = Some(StaffLockInfo {
            has_explicit_lock: true,
            message: "Contains staff only content".to_string(),
        });
        let element = RenderedElement::build(&node, Some(Category::Course), true, true);
        assert!(element.has_explicit_staff_lock);
        assert_eq!(
            element.staff_lock_message.as_deref(),
            Some("Contains staff only content")
        );
        assert!(element.is_collapsed);
    }
}
