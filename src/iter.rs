use crate::node::Node;
use crate::payload::Payload;
use std::fmt;

/// A key and the payload stored under it, as produced by enumeration.
#[derive(Debug, Clone, PartialEq)]
pub struct Value<'a> {
    pub key: String,
    pub data: &'a Payload,
}

impl fmt::Display for Value<'_> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}: {}", self.key, self.data)
    }
}

/// Pre-order walk over a node and its descendants.
///
/// Children are visited in ascending character order, so keys come out in
/// lexicographic code point order. Each stack entry remembers the byte
/// length of the key leading to its parent, which is all that's needed to
/// rewind the shared key buffer when the walk backs up.
pub struct Iter<'a> {
    stack: Vec<(usize, &'a Node)>,
    key: String,
    start: Option<&'a Payload>,
}

impl<'a> Iter<'a> {
    pub(crate) fn new(node: &'a Node) -> Self {
        Self {
            stack: node.children().iter().rev().map(|child| (0, child)).collect(),
            key: String::new(),
            start: node.payload(),
        }
    }
}

impl<'a> Iterator for Iter<'a> {
    type Item = Value<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        if let Some(data) = self.start.take() {
            return Some(Value {
                key: String::new(),
                data,
            });
        }

        while let Some((depth, node)) = self.stack.pop() {
            self.key.truncate(depth);
            self.key.push(node.character());

            let depth = self.key.len();
            self.stack
                .extend(node.children().iter().rev().map(|child| (depth, child)));

            if let Some(data) = node.payload() {
                return Some(Value {
                    key: self.key.clone(),
                    data,
                });
            }
        }
        None
    }
}
