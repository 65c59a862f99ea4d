use crate::error::TreeError;
use crate::iter::{Iter, Value};
use crate::payload::Payload;
use std::fmt;

/// Character carried by a root node. It is never matched against a key.
pub const ROOT_CHAR: char = '\0';

/// A single vertex of the prefix tree.
///
/// A node is both the edge labeled with its character and, when it carries
/// a payload, the entry for the key spelled by the path leading to it. Its
/// children are kept sorted by character with no duplicates, so each level
/// is searched with a binary search.
pub struct Node {
    ch: char,
    children: Vec<Node>,
    payload: Option<Payload>,
}

/// Outcome of walking a key down from a node.
///
/// When `found` is true, `node` is the node the whole key leads to and the
/// other fields carry no meaning. Otherwise `node` is the deepest node
/// reached, `index` is where a child for the first unmatched character
/// would be inserted to keep the children sorted, and `matched` is the byte
/// length of the matched prefix, so `&key[matched..]` is the remainder.
#[derive(Debug)]
pub struct Fetch<N> {
    pub node: N,
    pub index: usize,
    pub matched: usize,
    pub found: bool,
}

impl Node {
    /// Creates an empty root node.
    pub fn root() -> Self {
        Self::new(ROOT_CHAR)
    }

    pub(crate) fn new(ch: char) -> Self {
        Self {
            ch,
            children: Vec::new(),
            payload: None,
        }
    }

    pub(crate) fn from_parts(ch: char, children: Vec<Node>, payload: Option<Payload>) -> Self {
        Self {
            ch,
            children,
            payload,
        }
    }

    pub fn character(&self) -> char {
        self.ch
    }

    pub fn children(&self) -> &[Node] {
        &self.children
    }

    pub fn payload(&self) -> Option<&Payload> {
        self.payload.as_ref()
    }

    /// True when nothing is stored here or below
    pub fn is_vacant(&self) -> bool {
        self.payload.is_none() && self.children.is_empty()
    }

    fn position(&self, ch: char) -> Result<usize, usize> {
        self.children.binary_search_by(|child| child.ch.cmp(&ch))
    }

    /// Walks `key` one character at a time, stopping at the first character
    /// with no matching child.
    ///
    /// # Examples
    ///
    /// ```
    /// use sovran_strtree::Node;
    ///
    /// let mut root = Node::root();
    /// root.set("car", 1u8);
    ///
    /// let hit = root.fetch("ca");
    /// assert!(hit.found);
    /// assert_eq!(hit.node.character(), 'a');
    ///
    /// let miss = root.fetch("cat");
    /// assert!(!miss.found);
    /// assert_eq!(miss.matched, 2);
    /// assert_eq!(miss.index, 1); // 't' sorts after 'r'
    /// ```
    pub fn fetch(&self, key: &str) -> Fetch<&Node> {
        let mut node = self;
        for (matched, ch) in key.char_indices() {
            match node.position(ch) {
                Ok(i) => node = &node.children[i],
                Err(index) => {
                    return Fetch {
                        node,
                        index,
                        matched,
                        found: false,
                    }
                }
            }
        }
        Fetch {
            node,
            index: 0,
            matched: key.len(),
            found: true,
        }
    }

    /// Mutable counterpart of [`Node::fetch`].
    pub fn fetch_mut(&mut self, key: &str) -> Fetch<&mut Node> {
        let mut node = self;
        for (matched, ch) in key.char_indices() {
            match node.position(ch) {
                Ok(i) => node = &mut node.children[i],
                Err(index) => {
                    return Fetch {
                        node,
                        index,
                        matched,
                        found: false,
                    }
                }
            }
        }
        Fetch {
            node,
            index: 0,
            matched: key.len(),
            found: true,
        }
    }

    /// Returns the payload stored at `key`.
    ///
    /// # Errors
    ///
    /// Returns `TreeError::NotFound` if the key was never set, including when
    /// it only exists as a prefix of longer keys.
    pub fn get(&self, key: &str) -> Result<&Payload, TreeError> {
        let fetched = self.fetch(key);
        if !fetched.found {
            return Err(TreeError::NotFound(key.to_string()));
        }
        fetched
            .node
            .payload
            .as_ref()
            .ok_or_else(|| TreeError::NotFound(key.to_string()))
    }

    /// Returns the payload stored at `key` for in-place modification.
    ///
    /// # Errors
    ///
    /// Returns `TreeError::NotFound` under the same conditions as [`Node::get`].
    pub fn get_mut(&mut self, key: &str) -> Result<&mut Payload, TreeError> {
        let fetched = self.fetch_mut(key);
        if !fetched.found {
            return Err(TreeError::NotFound(key.to_string()));
        }
        fetched
            .node
            .payload
            .as_mut()
            .ok_or_else(|| TreeError::NotFound(key.to_string()))
    }

    /// Stores `value` at `key`, returning the payload it replaced.
    ///
    /// Only the first new character needs a sorted insert; every character
    /// after it starts a fresh single-child chain.
    pub fn set(&mut self, key: &str, value: impl Into<Payload>) -> Option<Payload> {
        let Fetch {
            node,
            index,
            matched,
            found,
        } = self.fetch_mut(key);
        let node = if found {
            node
        } else {
            node.splice(index, &key[matched..])
        };
        node.payload.replace(value.into())
    }

    /// Inserts a chain spelling `suffix` as the child at `index` and returns
    /// its last node.
    fn splice(&mut self, index: usize, suffix: &str) -> &mut Node {
        let mut chars = suffix.chars();
        let Some(first) = chars.next() else {
            return self;
        };

        self.children.insert(index, Node::new(first));
        let mut node = &mut self.children[index];
        for ch in chars {
            node.children.push(Node::new(ch));
            node = &mut node.children[0];
        }
        node
    }

    /// Removes the payload at `key`, pruning any nodes left with neither a
    /// payload nor children.
    ///
    /// Returns the removed payload, or `None` if nothing was stored there.
    pub fn remove(&mut self, key: &str) -> Option<Payload> {
        // Child index taken at each level, and whether that node only
        // forwards to the next one (no payload, a single child).
        let mut path = Vec::new();
        let mut forwarding = Vec::new();
        let mut node: &Node = self;
        for ch in key.chars() {
            let i = node.position(ch).ok()?;
            node = &node.children[i];
            path.push(i);
            forwarding.push(node.payload.is_none() && node.children.len() == 1);
        }
        let leaf = node.children.is_empty();

        let removed = self.fetch_mut(key).node.payload.take()?;
        if path.is_empty() || !leaf {
            return Some(removed);
        }

        // Depth of the topmost node that is left holding nothing
        let mut top = path.len();
        while top > 1 && forwarding[top - 2] {
            top -= 1;
        }

        let mut parent = self;
        for &i in &path[..top - 1] {
            parent = &mut parent.children[i];
        }
        parent.children.remove(path[top - 1]);
        Some(removed)
    }

    /// Lazily enumerates every payload at or below this node in key order.
    ///
    /// Keys are relative to this node; its own payload, if any, comes first
    /// with an empty key.
    pub fn iter(&self) -> Iter<'_> {
        Iter::new(self)
    }

    /// Collects [`Node::iter`] into a vector.
    pub fn list(&self) -> Vec<Value<'_>> {
        self.iter().collect()
    }
}

impl Default for Node {
    fn default() -> Self {
        Self::root()
    }
}

// Long keys build long single-child chains. Clone and Drop walk them with an
// explicit stack and Debug stops at one level, so none recurse per character.
impl Clone for Node {
    fn clone(&self) -> Self {
        // Each frame is a source node and the copies of its children so far
        let mut stack: Vec<(&Node, Vec<Node>)> =
            vec![(self, Vec::with_capacity(self.children.len()))];

        while let Some((source, copied)) = stack.last_mut() {
            let source: &Node = *source;
            let next = copied.len();
            if next < source.children.len() {
                let child = &source.children[next];
                stack.push((child, Vec::with_capacity(child.children.len())));
                continue;
            }
            if stack.len() == 1 {
                break;
            }

            let Some((source, children)) = stack.pop() else {
                break;
            };
            let node = Node::from_parts(source.ch, children, source.payload.clone());
            if let Some((_, siblings)) = stack.last_mut() {
                siblings.push(node);
            }
        }

        let children = stack.pop().map(|(_, children)| children).unwrap_or_default();
        Node::from_parts(self.ch, children, self.payload.clone())
    }
}

impl fmt::Debug for Node {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Node")
            .field("ch", &self.ch)
            .field("children", &self.children.len())
            .field("payload", &self.payload)
            .finish()
    }
}

impl Drop for Node {
    fn drop(&mut self) {
        let mut pending = std::mem::take(&mut self.children);
        while let Some(mut node) = pending.pop() {
            pending.append(&mut node.children);
        }
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let mut prefix = String::new();
        if self.ch != ROOT_CHAR {
            write!(f, "{}: ", self.ch)?;
            prefix.push(self.ch);
        }

        for (i, value) in self.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{}{}={}", prefix, value.key, value.data)?;
        }
        Ok(())
    }
}
