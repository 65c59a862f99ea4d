//! Byte layout of a persisted tree.
//!
//! Each node is written as its character in UTF-8, a varint child count,
//! every child in order, and finally its payload: an 8-byte [`TypeTag`]
//! (all zero when absent) followed by a varint byte length and the bytes
//! the codec marshaled. Both directions use an explicit stack, so key
//! length never translates into call depth.

use crate::error::{CodecError, TreeError};
use crate::node::Node;
use crate::payload::Payload;
use crate::registry::Registry;
use crate::type_tag::TypeTag;
use tracing::debug;

/// Smallest possible encoded node: one-byte character, one-byte count, tag.
const MIN_NODE_LEN: usize = 1 + 1 + TypeTag::LEN;

/// Longest postcard varint for a `u64`
const MAX_VARINT_LEN: usize = 10;

enum Step<'a> {
    Enter(&'a Node),
    Leave(&'a Node),
}

/// Appends the encoding of `root` and its whole subtree to `out`.
pub(crate) fn encode(root: &Node, registry: &Registry, out: &mut Vec<u8>) -> Result<(), TreeError> {
    let start = out.len();
    let mut nodes = 0usize;
    let mut stack = vec![Step::Enter(root)];

    while let Some(step) = stack.pop() {
        match step {
            Step::Enter(node) => {
                nodes += 1;
                let mut buf = [0u8; 4];
                out.extend_from_slice(node.character().encode_utf8(&mut buf).as_bytes());
                write_varint(out, node.children().len() as u64)?;

                // Payload goes after every child has been written
                stack.push(Step::Leave(node));
                stack.extend(node.children().iter().rev().map(Step::Enter));
            }
            Step::Leave(node) => write_payload(out, node.payload(), registry)?,
        }
    }

    debug!(nodes, bytes = out.len() - start, "encoded tree");
    Ok(())
}

fn write_varint(out: &mut Vec<u8>, value: u64) -> Result<(), TreeError> {
    let mut buf = [0u8; MAX_VARINT_LEN];
    let used = postcard::to_slice(&value, &mut buf).map_err(CodecError::from)?;
    out.extend_from_slice(used);
    Ok(())
}

fn write_payload(
    out: &mut Vec<u8>,
    payload: Option<&Payload>,
    registry: &Registry,
) -> Result<(), TreeError> {
    let Some(payload) = payload else {
        out.extend_from_slice(TypeTag::ABSENT.as_bytes());
        return Ok(());
    };

    let mut bytes = Vec::new();
    let tag = registry.marshal(payload, &mut bytes)?;
    out.extend_from_slice(tag.as_bytes());
    write_varint(out, bytes.len() as u64)?;
    out.extend_from_slice(&bytes);
    Ok(())
}

/// Rebuilds a tree from `input`, which must hold exactly one encoded root.
pub(crate) fn decode(input: &[u8], registry: &Registry) -> Result<Node, TreeError> {
    decode_root(&mut Reader::new(input), registry)
        .inspect(|_| debug!(bytes = input.len(), "decoded tree"))
        .inspect_err(|err| debug!(%err, "decode aborted"))
}

/// A node whose header has been read but whose children are still coming.
struct Frame {
    ch: char,
    remaining: u64,
    children: Vec<Node>,
}

fn decode_root(reader: &mut Reader<'_>, registry: &Registry) -> Result<Node, TreeError> {
    let mut stack = vec![reader.frame()?];

    while let Some(frame) = stack.last_mut() {
        if frame.remaining > 0 {
            frame.remaining -= 1;
            let child = reader.frame()?;
            stack.push(child);
            continue;
        }

        let Some(frame) = stack.pop() else { break };
        let payload = read_payload(reader, registry)?;
        let node = Node::from_parts(frame.ch, frame.children, payload);

        match stack.last_mut() {
            Some(parent) => parent.children.push(node),
            None => {
                let trailing = reader.remaining().len();
                if trailing > 0 {
                    return Err(reader.malformed(format!("{} trailing bytes after root", trailing)));
                }
                return Ok(node);
            }
        }
    }

    Err(reader.malformed("stream ended before the root node closed"))
}

fn read_payload(
    reader: &mut Reader<'_>,
    registry: &Registry,
) -> Result<Option<Payload>, TreeError> {
    let tag = reader.tag()?;
    if tag.is_absent() {
        return Ok(None);
    }

    let mut codec = registry.instantiate(tag)?;
    let len = reader.length()?;
    let offset = reader.offset;
    let bytes = reader.take(len)?;
    codec
        .unmarshal(bytes)
        .map_err(|err| TreeError::MalformedStream {
            offset,
            reason: format!("payload for {} did not unmarshal: {}", tag, err),
        })?;
    Ok(Some(codec.into_payload()))
}

struct Reader<'a> {
    input: &'a [u8],
    offset: usize,
}

impl<'a> Reader<'a> {
    fn new(input: &'a [u8]) -> Self {
        Self { input, offset: 0 }
    }

    fn remaining(&self) -> &'a [u8] {
        &self.input[self.offset..]
    }

    fn malformed(&self, reason: impl Into<String>) -> TreeError {
        TreeError::MalformedStream {
            offset: self.offset,
            reason: reason.into(),
        }
    }

    fn take(&mut self, n: usize) -> Result<&'a [u8], TreeError> {
        let rest = self.remaining();
        if rest.len() < n {
            return Err(self.malformed(format!("needed {} bytes, {} left", n, rest.len())));
        }
        self.offset += n;
        Ok(&rest[..n])
    }

    fn varint(&mut self) -> Result<u64, TreeError> {
        let (value, rest) = postcard::take_from_bytes::<u64>(self.remaining())
            .map_err(|err| self.malformed(format!("bad varint: {}", err)))?;
        self.offset = self.input.len() - rest.len();
        Ok(value)
    }

    fn length(&mut self) -> Result<usize, TreeError> {
        let value = self.varint()?;
        usize::try_from(value)
            .map_err(|_| self.malformed(format!("length {} does not fit in memory", value)))
    }

    fn character(&mut self) -> Result<char, TreeError> {
        let lead = *self
            .remaining()
            .first()
            .ok_or_else(|| self.malformed("missing node character"))?;
        let width = utf8_width(lead)
            .ok_or_else(|| self.malformed(format!("invalid UTF-8 lead byte {:#04x}", lead)))?;

        let offset = self.offset;
        let bytes = self.take(width)?;
        std::str::from_utf8(bytes)
            .ok()
            .and_then(|s| s.chars().next())
            .ok_or_else(|| TreeError::MalformedStream {
                offset,
                reason: "invalid UTF-8 character".to_string(),
            })
    }

    fn tag(&mut self) -> Result<TypeTag, TreeError> {
        let mut tag = [0u8; TypeTag::LEN];
        tag.copy_from_slice(self.take(TypeTag::LEN)?);
        Ok(TypeTag::from_bytes(tag))
    }

    fn frame(&mut self) -> Result<Frame, TreeError> {
        let ch = self.character()?;
        let remaining = self.varint()?;

        // Never trust the count further than the input could back it up
        let fits = self.remaining().len() / MIN_NODE_LEN;
        let capacity = usize::try_from(remaining).map_or(fits, |count| count.min(fits));
        Ok(Frame {
            ch,
            remaining,
            children: Vec::with_capacity(capacity),
        })
    }
}

fn utf8_width(lead: u8) -> Option<usize> {
    match lead {
        0x00..=0x7f => Some(1),
        0xc2..=0xdf => Some(2),
        0xe0..=0xef => Some(3),
        0xf0..=0xf4 => Some(4),
        _ => None,
    }
}
