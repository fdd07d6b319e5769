use crate::treap::tree::Tree;
use crate::treap::{Error, Result};
use std::cell::RefCell;
use std::rc::{Rc, Weak};

pub type NodeRef<T, U> = Rc<RefCell<Node<T, U>>>;
pub type WeakNodeRef<T, U> = Weak<RefCell<Node<T, U>>>;

/// A struct representing an internal node of a treap.
///
/// Children are owned through `left` and `right`. The `parent` link is only a back-reference and
/// must be kept in lockstep with the owning links of the parent.
pub struct Node<T, U> {
    pub key: T,
    pub value: Option<U>,
    pub priority: u64,
    pub len: usize,
    pub parent: WeakNodeRef<T, U>,
    pub left: Tree<T, U>,
    pub right: Tree<T, U>,
}

impl<T, U> Node<T, U> {
    pub fn new(key: T, value: Option<U>, priority: u64) -> NodeRef<T, U> {
        Rc::new(RefCell::new(Node {
            key,
            value,
            priority,
            len: 1,
            parent: Weak::new(),
            left: None,
            right: None,
        }))
    }

    pub fn has_left_child(&self) -> bool {
        self.left.is_some()
    }

    pub fn has_right_child(&self) -> bool {
        self.right.is_some()
    }

    pub fn has_children(&self) -> bool {
        self.has_left_child() || self.has_right_child()
    }

    pub fn is_leaf(&self) -> bool {
        !self.has_children()
    }

    pub fn update(&mut self) {
        let Node {
            ref mut len,
            ref left,
            ref right,
            ..
        } = *self;
        *len = 1;
        if let Some(left_node) = left {
            *len += left_node.borrow().len;
        }
        if let Some(right_node) = right {
            *len += right_node.borrow().len;
        }
    }
}

pub fn parent<T, U>(node: &NodeRef<T, U>) -> Tree<T, U> {
    node.borrow().parent.upgrade()
}

/// Returns `true` if `slot` holds exactly `node`.
pub fn is_in_slot<T, U>(slot: &Tree<T, U>, node: &NodeRef<T, U>) -> bool {
    match slot {
        Some(child) => Rc::ptr_eq(child, node),
        None => false,
    }
}

fn linked_parent<T, U>(node: &NodeRef<T, U>) -> Result<NodeRef<T, U>> {
    let parent = parent(node)
        .ok_or_else(|| Error::Structural(String::from("node being classified has no parent")))?;
    let is_linked = {
        let parent_node = parent.borrow();
        is_in_slot(&parent_node.left, node) || is_in_slot(&parent_node.right, node)
    };
    if !is_linked {
        return Err(Error::Structural(String::from("parent does not link back to node")));
    }
    Ok(parent)
}

pub fn is_left_child<T, U>(node: &NodeRef<T, U>) -> Result<bool> {
    let parent = linked_parent(node)?;
    let is_left = is_in_slot(&parent.borrow().left, node);
    Ok(is_left)
}

pub fn is_right_child<T, U>(node: &NodeRef<T, U>) -> Result<bool> {
    let parent = linked_parent(node)?;
    let is_right = is_in_slot(&parent.borrow().right, node);
    Ok(is_right)
}

/// Points the parent link of both children of `node` back at `node`.
pub fn reparent_children<T, U>(node: &NodeRef<T, U>) {
    let node_ref = node.borrow();
    for child in node_ref.left.iter().chain(node_ref.right.iter()) {
        child.borrow_mut().parent = Rc::downgrade(node);
    }
}

/// Clears the slot of the parent that holds `node` and severs the parent link of `node`.
pub fn detach_from_parent<T, U>(node: &NodeRef<T, U>) -> Result<()> {
    let parent = linked_parent(node)?;
    {
        let mut parent_node = parent.borrow_mut();
        if is_in_slot(&parent_node.left, node) {
            parent_node.left = None;
        } else {
            parent_node.right = None;
        }
    }
    node.borrow_mut().parent = Weak::new();
    Ok(())
}
