use rand::{rngs::ThreadRng, thread_rng, Rng};
use smallvec::SmallVec;
use std::{cmp::Ordering, fmt::Debug, ptr::NonNull};

pub(crate) type Link<T> = Option<NonNull<Node<T>>>;

/// Ordered storage for the set types: a binary search tree kept shallow by
/// heap ordering nodes on random priorities. Positions inside the tree are
/// handed out as [`Cursor`]s.
pub struct OTree<T: PartialOrd> {
    rng: ThreadRng,
    root: Link<T>,
    len: usize,
}

/// A position inside an [`OTree`]. The null cursor is the one past the last
/// element sentinel; it is also the default value and compares equal only to
/// other null cursors.
///
/// A cursor never owns its node. It stays usable while the node it points at
/// remains in its tree; erasing that node invalidates exactly the cursors
/// parked on it and no others.
pub struct Cursor<T: PartialOrd> {
    pub(crate) node: Link<T>,
}

impl<T: PartialOrd> OTree<T> {
    pub fn new() -> Self {
        Self {
            rng: thread_rng(),
            root: None,
            len: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Inserts `value`, returning the cursor to its node and whether a new
    /// node was created. With `dedup` set, a value comparing equal to a
    /// stored one is rejected and the cursor points at the existing node;
    /// without it equal values coexist.
    pub fn insert(&mut self, value: T, dedup: bool) -> (Cursor<T>, bool) {
        let priority = self.rng.gen();
        if let Some(root) = self.root {
            let (node, inserted) = unsafe { Node::insert(root, value, priority, dedup) };
            if inserted {
                self.len += 1;
                // rebalancing can lift the new node above the old root
                unsafe {
                    if let Some(r) = self.root {
                        if r.as_ref().parent.is_some() {
                            self.root = r.as_ref().parent;
                        }
                    }
                }
            }
            (Cursor { node: Some(node) }, inserted)
        } else {
            let node = NonNull::from(Box::leak(Node::new(value, priority)));
            self.root = Some(node);
            self.len = 1;
            (Cursor { node: Some(node) }, true)
        }
    }

    pub fn find(&self, key: &T) -> Cursor<T> {
        let mut cur = self.root;
        while let Some(n) = cur {
            match unsafe { n.as_ref() }.value.partial_cmp(key) {
                None => panic!("Failed to compare values"),
                Some(Ordering::Equal) => return Cursor { node: cur },
                Some(Ordering::Greater) => cur = unsafe { n.as_ref().left },
                Some(Ordering::Less) => cur = unsafe { n.as_ref().right },
            }
        }
        Cursor { node: None }
    }

    /// Cursor to the first element not less than `key`, or the null cursor.
    pub fn lower_bound(&self, key: &T) -> Cursor<T> {
        let mut node = None;
        let mut cur = self.root;
        while let Some(n) = cur {
            match unsafe { n.as_ref() }.value.partial_cmp(key) {
                None => panic!("Failed to compare values"),
                Some(Ordering::Less) => cur = unsafe { n.as_ref().right },
                Some(_) => {
                    node = cur;
                    cur = unsafe { n.as_ref().left };
                }
            }
        }
        Cursor { node }
    }

    pub fn first(&self) -> Cursor<T> {
        let mut node = None;
        let mut cur = self.root;
        while let Some(n) = cur {
            node = cur;
            cur = unsafe { n.as_ref().left };
        }
        Cursor { node }
    }

    pub fn last(&self) -> Cursor<T> {
        let mut node = None;
        let mut cur = self.root;
        while let Some(n) = cur {
            node = cur;
            cur = unsafe { n.as_ref().right };
        }
        Cursor { node }
    }

    pub fn value(&self, cur: Cursor<T>) -> Option<&T> {
        cur.node.map(|n| unsafe { &(*n.as_ptr()).value })
    }

    /// Steps to the in-order successor. Stepping from the null cursor is a
    /// caller error.
    pub fn next(&self, cur: Cursor<T>) -> Cursor<T> {
        match cur.node {
            Some(n) => Cursor {
                node: unsafe { Node::successor(n) },
            },
            None => {
                debug_assert!(false, "stepped past the end cursor");
                cur
            }
        }
    }

    /// Steps to the in-order predecessor; from the null cursor this lands on
    /// the last element. Stepping before the first element yields the null
    /// cursor.
    pub fn prev(&self, cur: Cursor<T>) -> Cursor<T> {
        match cur.node {
            Some(n) => Cursor {
                node: unsafe { Node::predecessor(n) },
            },
            None => self.last(),
        }
    }

    /// Removes the node under `cur` and returns the cursor to its in-order
    /// successor together with the stored value. Panics on the null cursor.
    pub fn erase(&mut self, cur: Cursor<T>) -> (Cursor<T>, T) {
        let mut node = cur.node.expect("erase on the end cursor");
        unsafe {
            let next = Node::successor(node);
            let was_root = self.root == Some(node);
            // rotate the doomed node down until it has at most one child,
            // keeping the higher priority child on top
            loop {
                let (left, right) = {
                    let n = node.as_ref();
                    match (n.left, n.right) {
                        (Some(l), Some(r)) => (l, r),
                        _ => break,
                    }
                };
                if left.as_ref().priority > right.as_ref().priority {
                    node.as_mut().rotate_right();
                } else {
                    node.as_mut().rotate_left();
                }
            }
            let parent = node.as_ref().parent;
            let child = node.as_ref().left.or(node.as_ref().right);
            if let Some(mut c) = child {
                c.as_mut().parent = parent;
            }
            match parent {
                Some(mut p) => {
                    if p.as_ref().left == Some(node) {
                        p.as_mut().left = child;
                    } else {
                        p.as_mut().right = child;
                    }
                    if was_root {
                        // the rotations pushed the old root down, climb back up
                        let mut top = p;
                        while let Some(up) = top.as_ref().parent {
                            top = up;
                        }
                        self.root = Some(top);
                    }
                }
                None => self.root = child,
            }
            let boxed = Box::from_raw(node.as_ptr());
            self.len -= 1;
            (Cursor { node: next }, boxed.value)
        }
    }

    pub fn clear(&mut self) {
        let mut stack: SmallVec<[NonNull<Node<T>>; 16]> = SmallVec::new();
        if let Some(root) = self.root.take() {
            stack.push(root);
        }
        while let Some(node) = stack.pop() {
            let node = unsafe { Box::from_raw(node.as_ptr()) };
            stack.extend(node.left);
            stack.extend(node.right);
        }
        self.len = 0;
    }
}

impl<T: PartialOrd> Default for OTree<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: PartialOrd> Drop for OTree<T> {
    fn drop(&mut self) {
        self.clear();
    }
}

impl<T: PartialOrd + Clone> Clone for OTree<T> {
    fn clone(&self) -> Self {
        let root = self.root.map(|r| unsafe { Node::clone_subtree(r, None) });
        Self {
            rng: thread_rng(),
            root,
            len: self.len,
        }
    }
}

impl<T: PartialOrd + Debug> Debug for OTree<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_fmt(format_args!(
            "{:?}",
            &self.root.map(|p| unsafe { p.as_ref() })
        ))
    }
}

impl<T: PartialOrd> Clone for Cursor<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T: PartialOrd> Copy for Cursor<T> {}

impl<T: PartialOrd> PartialEq for Cursor<T> {
    fn eq(&self, other: &Self) -> bool {
        self.node == other.node
    }
}

impl<T: PartialOrd> Default for Cursor<T> {
    fn default() -> Self {
        Self { node: None }
    }
}

pub(crate) struct Node<T: PartialOrd> {
    parent: Link<T>,
    pub(crate) value: T,
    priority: usize,
    left: Link<T>,
    right: Link<T>,
}

impl<T: PartialOrd + Debug> Debug for Node<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Node")
            .field("value", &self.value)
            .field("left", &self.left.map(|l| unsafe { l.as_ref() }))
            .field("right", &self.right.map(|r| unsafe { r.as_ref() }))
            .field("has_parent", &self.parent.is_some())
            .finish()
    }
}

impl<T: PartialOrd> Node<T> {
    fn new(value: T, priority: usize) -> Box<Self> {
        Box::new(Self {
            parent: None,
            value,
            priority,
            left: None,
            right: None,
        })
    }

    fn new_with_parent(value: T, priority: usize, parent: Link<T>) -> Box<Self> {
        Box::new(Self {
            parent,
            value,
            priority,
            left: None,
            right: None,
        })
    }

    unsafe fn insert(
        mut dst: NonNull<Node<T>>,
        value: T,
        priority: usize,
        dedup: bool,
    ) -> (NonNull<Node<T>>, bool) {
        let target = dst.as_mut();
        match target.value.partial_cmp(&value) {
            None => panic!("Failed to compare values"),
            Some(Ordering::Equal) if dedup => (dst, false),
            Some(Ordering::Greater) => match target.left {
                Some(l) => Self::insert(l, value, priority, dedup),
                None => {
                    let new =
                        NonNull::from(Box::leak(Node::new_with_parent(value, priority, Some(dst))));
                    target.left = Some(new);
                    Self::fix(Some(dst));
                    (new, true)
                }
            },
            // less, or equal while keeping duplicates: equal values go right
            Some(_) => match target.right {
                Some(r) => Self::insert(r, value, priority, dedup),
                None => {
                    let new =
                        NonNull::from(Box::leak(Node::new_with_parent(value, priority, Some(dst))));
                    target.right = Some(new);
                    Self::fix(Some(dst));
                    (new, true)
                }
            },
        }
    }

    /// After a leaf insertion the max heap ordering of the priorities may be
    /// broken along the insertion path, so this rotates the new node towards
    /// the root until its parent outranks it. Rotations keep the in order
    /// sequence of the search tree intact.
    unsafe fn fix(parent: Link<T>) {
        let Some(mut p) = parent else { return };
        let node = p.as_mut();
        if let Some(l) = node.left {
            if l.as_ref().priority > node.priority {
                node.rotate_right();
                Self::fix(node.parent.expect("parent after rotation").as_ref().parent);
                return;
            }
        }
        if let Some(r) = node.right {
            if r.as_ref().priority > node.priority {
                node.rotate_left();
                Self::fix(node.parent.expect("parent after rotation").as_ref().parent);
            }
        }
    }

    unsafe fn rotate_right(&mut self) {
        let this = NonNull::from(&mut *self);
        let Some(mut new_parent) = self.left.take() else {
            return;
        };
        self.left = new_parent.as_mut().right.take();
        if let Some(mut l) = self.left {
            l.as_mut().parent = Some(this);
        }
        if let Some(mut p) = self.parent {
            if p.as_ref().left == Some(this) {
                p.as_mut().left = Some(new_parent);
            } else {
                p.as_mut().right = Some(new_parent);
            }
        }
        new_parent.as_mut().parent = self.parent.take();
        self.parent = Some(new_parent);
        new_parent.as_mut().right = Some(this);
    }

    unsafe fn rotate_left(&mut self) {
        let this = NonNull::from(&mut *self);
        let Some(mut new_parent) = self.right.take() else {
            return;
        };
        self.right = new_parent.as_mut().left.take();
        if let Some(mut r) = self.right {
            r.as_mut().parent = Some(this);
        }
        if let Some(mut p) = self.parent {
            if p.as_ref().left == Some(this) {
                p.as_mut().left = Some(new_parent);
            } else {
                p.as_mut().right = Some(new_parent);
            }
        }
        new_parent.as_mut().parent = self.parent.take();
        self.parent = Some(new_parent);
        new_parent.as_mut().left = Some(this);
    }

    /// In order successor: leftmost node of the right subtree, or the first
    /// ancestor reached from a left child.
    pub(crate) unsafe fn successor(node: NonNull<Self>) -> Link<T> {
        if let Some(mut cur) = node.as_ref().right {
            while let Some(l) = cur.as_ref().left {
                cur = l;
            }
            return Some(cur);
        }
        let mut child = node;
        let mut parent = node.as_ref().parent;
        while let Some(p) = parent {
            if p.as_ref().left == Some(child) {
                return Some(p);
            }
            child = p;
            parent = p.as_ref().parent;
        }
        None
    }

    pub(crate) unsafe fn predecessor(node: NonNull<Self>) -> Link<T> {
        if let Some(mut cur) = node.as_ref().left {
            while let Some(r) = cur.as_ref().right {
                cur = r;
            }
            return Some(cur);
        }
        let mut child = node;
        let mut parent = node.as_ref().parent;
        while let Some(p) = parent {
            if p.as_ref().right == Some(child) {
                return Some(p);
            }
            child = p;
            parent = p.as_ref().parent;
        }
        None
    }

    unsafe fn clone_subtree(node: NonNull<Self>, parent: Link<T>) -> NonNull<Self>
    where
        T: Clone,
    {
        let src = node.as_ref();
        let mut dst = NonNull::from(Box::leak(Node::new_with_parent(
            src.value.clone(),
            src.priority,
            parent,
        )));
        if let Some(l) = src.left {
            dst.as_mut().left = Some(Self::clone_subtree(l, Some(dst)));
        }
        if let Some(r) = src.right {
            dst.as_mut().right = Some(Self::clone_subtree(r, Some(dst)));
        }
        dst
    }
}
