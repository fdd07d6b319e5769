use crate::treap::node::{self, Node, NodeRef};
use crate::treap::priority::{PriorityPool, MAX_PRIORITY};
use crate::treap::{Error, Result};
use std::cmp::Ordering;
use std::rc::{Rc, Weak};

pub type Tree<T, U> = Option<NodeRef<T, U>>;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum Rotation {
    Left,
    Right,
}

/// The place a detached subtree would occupy in a tree.
enum Slot<T, U> {
    Empty,
    Occupied(NodeRef<T, U>),
    Vacant {
        parent: NodeRef<T, U>,
        on_left: bool,
        lo: Tree<T, U>,
        hi: Tree<T, U>,
    },
}

pub fn len<T, U>(tree: &Tree<T, U>) -> usize {
    tree.as_ref().map_or(0, |node| node.borrow().len)
}

fn priority<T, U>(tree: &Tree<T, U>) -> Option<u64> {
    tree.as_ref().map(|node| node.borrow().priority)
}

fn attach<T, U>(parent: &NodeRef<T, U>, child: NodeRef<T, U>, on_left: bool) {
    child.borrow_mut().parent = Rc::downgrade(parent);
    let mut parent_node = parent.borrow_mut();
    if on_left {
        parent_node.left = Some(child);
    } else {
        parent_node.right = Some(child);
    }
}

fn take_child<T, U>(parent: &NodeRef<T, U>, on_left: bool) -> Tree<T, U> {
    let child = {
        let mut parent_node = parent.borrow_mut();
        if on_left {
            parent_node.left.take()
        } else {
            parent_node.right.take()
        }
    };
    if let Some(ref child_node) = child {
        child_node.borrow_mut().parent = Weak::new();
    }
    child
}

/// Replaces `old` with `new` in the slot of `parent` that holds `old`, or at the root of `tree`
/// if there is no parent.
fn replace_child<T, U>(
    tree: &mut Tree<T, U>,
    parent: &Tree<T, U>,
    old: &NodeRef<T, U>,
    new: NodeRef<T, U>,
) {
    match parent {
        Some(parent_node) => {
            new.borrow_mut().parent = Rc::downgrade(parent_node);
            let mut parent_node = parent_node.borrow_mut();
            if node::is_in_slot(&parent_node.left, old) {
                parent_node.left = Some(new);
            } else {
                parent_node.right = Some(new);
            }
        },
        None => {
            new.borrow_mut().parent = Weak::new();
            *tree = Some(new);
        },
    }
}

/// Recomputes the length of `node` and of every ancestor of `node`.
fn update_path<T, U>(node: &NodeRef<T, U>) {
    let mut curr = Some(node.clone());
    while let Some(curr_node) = curr {
        curr_node.borrow_mut().update();
        curr = node::parent(&curr_node);
    }
}

pub fn rotate_left<T, U>(tree: &mut Tree<T, U>, node: &NodeRef<T, U>) {
    let child = node
        .borrow_mut()
        .right
        .take()
        .expect("Expected right child node to be `Some`.");
    let parent = node::parent(node);
    let crossing = child.borrow_mut().left.take();
    node.borrow_mut().right = crossing;
    node::reparent_children(node);
    replace_child(tree, &parent, node, child.clone());
    child.borrow_mut().left = Some(node.clone());
    node::reparent_children(&child);
    node.borrow_mut().update();
    child.borrow_mut().update();
}

pub fn rotate_right<T, U>(tree: &mut Tree<T, U>, node: &NodeRef<T, U>) {
    let child = node
        .borrow_mut()
        .left
        .take()
        .expect("Expected left child node to be `Some`.");
    let parent = node::parent(node);
    let crossing = child.borrow_mut().right.take();
    node.borrow_mut().left = crossing;
    node::reparent_children(node);
    replace_child(tree, &parent, node, child.clone());
    child.borrow_mut().right = Some(node.clone());
    node::reparent_children(&child);
    node.borrow_mut().update();
    child.borrow_mut().update();
}

fn rotate<T, U>(tree: &mut Tree<T, U>, node: &NodeRef<T, U>, rotation: Rotation) {
    match rotation {
        Rotation::Left => rotate_left(tree, node),
        Rotation::Right => rotate_right(tree, node),
    }
}

/// Moves `node` one level up by rotating around `parent`.
fn rotate_up<T, U>(tree: &mut Tree<T, U>, node: &NodeRef<T, U>, parent: &NodeRef<T, U>) {
    if node::is_left_child(node).expect("Expected node to be linked to its parent.") {
        rotate_right(tree, parent);
    } else {
        rotate_left(tree, parent);
    }
}

fn violates_heap<T, U>(node: &NodeRef<T, U>, parent: &NodeRef<T, U>) -> bool {
    node.borrow().priority > parent.borrow().priority
}

pub fn repair_heap_upward<T, U>(tree: &mut Tree<T, U>, node: &NodeRef<T, U>) {
    while let Some(parent) = node::parent(node) {
        if !violates_heap(node, &parent) {
            break;
        }
        rotate_up(tree, node, &parent);
    }
}

fn removal_rotation<T, U>(node: &NodeRef<T, U>) -> Option<Rotation> {
    let node = node.borrow();
    match (node.has_left_child(), node.has_right_child()) {
        (true, true) => {
            if priority(&node.left) > priority(&node.right) {
                Some(Rotation::Right)
            } else {
                Some(Rotation::Left)
            }
        },
        (true, false) => Some(Rotation::Right),
        (false, true) => Some(Rotation::Left),
        (false, false) => None,
    }
}

fn sift_rotation<T, U>(node: &NodeRef<T, U>) -> Option<Rotation> {
    let node = node.borrow();
    let violation = |child: &Tree<T, U>| priority(child).filter(|p| *p > node.priority);
    match (violation(&node.left), violation(&node.right)) {
        (Some(left), Some(right)) => {
            if left > right {
                Some(Rotation::Right)
            } else {
                Some(Rotation::Left)
            }
        },
        (Some(_), None) => Some(Rotation::Right),
        (None, Some(_)) => Some(Rotation::Left),
        (None, None) => None,
    }
}

/// Rotates `node` down until no child outranks it.
fn sift_down<T, U>(tree: &mut Tree<T, U>, node: &NodeRef<T, U>) {
    while let Some(rotation) = sift_rotation(node) {
        rotate(tree, node, rotation);
    }
}

/// Heap repair for a freshly transplanted subtree rooted at `node`. Every rotation hands part of
/// the transplant to the node that was rotated down, so that node is sifted back into place
/// before `node` climbs any further.
fn repair_transplant_upward<T, U>(tree: &mut Tree<T, U>, node: &NodeRef<T, U>) {
    while let Some(parent) = node::parent(node) {
        if !violates_heap(node, &parent) {
            break;
        }
        rotate_up(tree, node, &parent);
        sift_down(tree, &parent);
    }
}

fn descend<T: Ord, U>(tree: &Tree<T, U>, key: &T, stop_on_equal: bool) -> Tree<T, U> {
    let mut curr = tree.clone()?;
    loop {
        let next = {
            let node = curr.borrow();
            match key.cmp(&node.key) {
                Ordering::Less => node.left.clone(),
                Ordering::Greater => node.right.clone(),
                Ordering::Equal if stop_on_equal => None,
                Ordering::Equal => node.left.clone(),
            }
        };
        match next {
            Some(next_node) => curr = next_node,
            None => return Some(curr),
        }
    }
}

/// Returns the node holding `key`, or the node that would become the parent of `key`.
pub fn find_insertion_point<T: Ord, U>(tree: &Tree<T, U>, key: &T) -> Tree<T, U> {
    descend(tree, key, true)
}

pub fn find<T: Ord, U>(tree: &Tree<T, U>, key: &T) -> Tree<T, U> {
    find_insertion_point(tree, key).filter(|node| node.borrow().key == *key)
}

fn locate<T: Ord, U>(tree: &Tree<T, U>, key: &T) -> Slot<T, U> {
    let mut curr = match tree {
        Some(root) => root.clone(),
        None => return Slot::Empty,
    };
    let mut lo = None;
    let mut hi = None;
    loop {
        let ordering = key.cmp(&curr.borrow().key);
        let next = match ordering {
            Ordering::Less => curr.borrow().left.clone(),
            Ordering::Greater => curr.borrow().right.clone(),
            Ordering::Equal => return Slot::Occupied(curr),
        };
        match next {
            Some(next_node) => {
                if ordering == Ordering::Less {
                    hi = Some(curr);
                } else {
                    lo = Some(curr);
                }
                curr = next_node;
            },
            None => {
                if ordering == Ordering::Less {
                    hi = Some(curr.clone());
                } else {
                    lo = Some(curr.clone());
                }
                return Slot::Vacant {
                    parent: curr,
                    on_left: ordering == Ordering::Less,
                    lo,
                    hi,
                }
            },
        }
    }
}

pub fn insert<T: Ord, U>(
    tree: &mut Tree<T, U>,
    key: T,
    value: U,
    pool: &PriorityPool,
) -> Result<Option<U>> {
    let parent = match find_insertion_point(tree, &key) {
        Some(parent) => parent,
        None => {
            *tree = Some(Node::new(key, Some(value), pool.draw()?));
            return Ok(None);
        },
    };

    let ordering = key.cmp(&parent.borrow().key);
    if ordering == Ordering::Equal {
        let old_value = parent.borrow_mut().value.replace(value);
        return Ok(old_value);
    }

    let new_node = Node::new(key, Some(value), pool.draw()?);
    attach(&parent, new_node.clone(), ordering == Ordering::Less);
    update_path(&parent);
    repair_heap_upward(tree, &new_node);
    Ok(None)
}

/// Rotates `victim` down until it is a leaf and unlinks it from `tree`.
fn remove_node<T, U>(tree: &mut Tree<T, U>, victim: &NodeRef<T, U>) {
    while let Some(rotation) = removal_rotation(victim) {
        rotate(tree, victim, rotation);
    }
    debug_assert!(victim.borrow().is_leaf());
    match node::parent(victim) {
        Some(parent) => {
            node::detach_from_parent(victim).expect("Expected victim to be linked to its parent.");
            update_path(&parent);
        },
        None => *tree = None,
    }
}

/// Removes the node holding `key` and returns it as a detached leaf.
pub fn remove<T: Ord, U>(tree: &mut Tree<T, U>, key: &T) -> Tree<T, U> {
    let victim = find(tree, key)?;
    remove_node(tree, &victim);
    Some(victim)
}

/// Splits `tree` into the keys less than `key` and the keys greater than or equal to `key`.
pub fn split<T: Ord, U>(tree: &mut Tree<T, U>, key: T) -> (Tree<T, U>, Tree<T, U>) {
    let parent = match descend(tree, &key, false) {
        Some(parent) => parent,
        None => return (None, None),
    };
    let on_left = key <= parent.borrow().key;
    let sentinel = Node::new(key, None, MAX_PRIORITY);
    attach(&parent, sentinel.clone(), on_left);
    update_path(&parent);
    repair_heap_upward(tree, &sentinel);
    debug_assert!(node::parent(&sentinel).is_none());

    *tree = None;
    (take_child(&sentinel, true), take_child(&sentinel, false))
}

/// Concatenates two trees where every key of `lesser` is less than every key of `greater`. The
/// key given to the temporary sentinel root is never compared.
pub fn join<T, U>(lesser: NodeRef<T, U>, greater: NodeRef<T, U>, key: T) -> Tree<T, U> {
    let sentinel = Node::new(key, None, MAX_PRIORITY);
    attach(&sentinel, lesser, true);
    attach(&sentinel, greater, false);
    sentinel.borrow_mut().update();

    let mut tree = Some(sentinel.clone());
    remove_node(&mut tree, &sentinel);
    tree
}

/// Walks down one spine of `unit` and cuts off the topmost subtree whose root key crosses a bound.
fn cut_spine<T, U, F>(unit: &NodeRef<T, U>, on_left: bool, crosses: F) -> Tree<T, U>
where
    F: Fn(&T) -> bool,
{
    let mut curr = unit.clone();
    loop {
        let next = {
            let node = curr.borrow();
            if on_left {
                node.left.clone()
            } else {
                node.right.clone()
            }
        };
        let child = next?;
        let is_crossing = crosses(&child.borrow().key);
        if is_crossing {
            let cut = take_child(&curr, on_left);
            update_path(&curr);
            return cut;
        }
        curr = child;
    }
}

/// Cuts every key of `unit` outside of the open interval `(lo, hi)` off into separate units.
fn cut_crossing<T: Ord, U>(
    unit: &NodeRef<T, U>,
    lo: &Tree<T, U>,
    hi: &Tree<T, U>,
    units: &mut Vec<NodeRef<T, U>>,
) {
    if let Some(lo_node) = lo {
        let bound = lo_node.borrow();
        units.extend(cut_spine(unit, true, |key| *key <= bound.key));
    }
    if let Some(hi_node) = hi {
        let bound = hi_node.borrow();
        units.extend(cut_spine(unit, false, |key| *key >= bound.key));
    }
}

/// Melds the subtrees of `other` into `tree`. When a key is present in both, the value from
/// `other` survives if `overwrite` is set. The priorities of the dropped duplicates are released
/// to `pool`.
pub fn meld<T: Ord, U>(
    tree: &mut Tree<T, U>,
    other: Tree<T, U>,
    overwrite: bool,
    pool: &PriorityPool,
) {
    let mut units: Vec<NodeRef<T, U>> = other.into_iter().collect();
    while let Some(unit) = units.pop() {
        unit.borrow_mut().parent = Weak::new();
        let slot = locate(tree, &unit.borrow().key);
        match slot {
            Slot::Empty => *tree = Some(unit),
            Slot::Occupied(existing) => {
                let mut unit_node = unit.borrow_mut();
                units.extend(unit_node.left.take());
                units.extend(unit_node.right.take());
                pool.release(unit_node.priority);
                if overwrite {
                    existing.borrow_mut().value = unit_node.value.take();
                }
            },
            Slot::Vacant {
                parent,
                on_left,
                lo,
                hi,
            } => {
                cut_crossing(&unit, &lo, &hi, &mut units);
                attach(&parent, unit.clone(), on_left);
                update_path(&parent);
                repair_transplant_upward(tree, &unit);
            },
        }
    }
}

pub fn min<T, U>(tree: &Tree<T, U>) -> Tree<T, U> {
    let mut curr = tree.clone()?;
    loop {
        let next = curr.borrow().left.clone();
        match next {
            Some(next_node) => curr = next_node,
            None => return Some(curr),
        }
    }
}

pub fn max<T, U>(tree: &Tree<T, U>) -> Tree<T, U> {
    let mut curr = tree.clone()?;
    loop {
        let next = curr.borrow().right.clone();
        match next {
            Some(next_node) => curr = next_node,
            None => return Some(curr),
        }
    }
}

pub fn height<T, U>(tree: &Tree<T, U>) -> usize {
    let mut stack: Vec<(NodeRef<T, U>, usize)> =
        tree.iter().map(|node| (node.clone(), 1)).collect();
    let mut height = 0;
    while let Some((node, depth)) = stack.pop() {
        height = height.max(depth);
        let curr = node.borrow();
        for child in curr.left.iter().chain(curr.right.iter()) {
            stack.push((child.clone(), depth + 1));
        }
    }
    height
}

fn check_node<T, U>(node: &NodeRef<T, U>) -> Result<()> {
    let curr = node.borrow();
    let mut len = 1;
    for child in curr.left.iter().chain(curr.right.iter()) {
        let child_node = child.borrow();
        if child_node.priority > curr.priority {
            return Err(Error::Structural(String::from("child outranks its parent")));
        }
        match child_node.parent.upgrade() {
            Some(ref parent) if Rc::ptr_eq(parent, node) => {},
            _ => {
                return Err(Error::Structural(String::from(
                    "child does not link back to its parent",
                )))
            },
        }
        len += child_node.len;
    }
    if len != curr.len {
        return Err(Error::Structural(String::from("stale subtree length")));
    }
    if curr.value.is_none() {
        return Err(Error::Structural(String::from("sentinel left in tree")));
    }
    Ok(())
}

/// Walks the whole tree and checks key order, heap order, parent links, and subtree lengths.
pub fn check_invariants<T: Ord, U>(tree: &Tree<T, U>) -> Result<()> {
    if let Some(root) = tree {
        if node::parent(root).is_some() {
            return Err(Error::Structural(String::from("root has a parent")));
        }
    }

    let mut current = tree.clone();
    let mut stack: Vec<NodeRef<T, U>> = Vec::new();
    let mut prev: Tree<T, U> = None;
    loop {
        while let Some(node) = current {
            current = node.borrow().left.clone();
            stack.push(node);
        }
        let node = match stack.pop() {
            Some(node) => node,
            None => return Ok(()),
        };
        check_node(&node)?;
        if let Some(ref prev_node) = prev {
            if prev_node.borrow().key >= node.borrow().key {
                return Err(Error::Structural(String::from("keys out of order")));
            }
        }
        current = node.borrow().right.clone();
        prev = Some(node);
    }
}
