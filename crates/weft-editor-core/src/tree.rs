//! Element tree mirroring the HTML structure of the document.
//!
//! Nodes live in an arena and refer to each other by [`NodeId`]. Every node
//! caches the `[start, end)` char range it covers in the text buffer. Text
//! leaves hold their own copy of the text so that [`ElementTree::text`] can
//! rebuild the buffer content independently of the span model.

use std::cmp::Reverse;
use std::collections::BinaryHeap;
use std::ops::Range;

use smol_str::SmolStr;

use crate::attributes::AttributeBag;
use crate::format::{Format, FormatCategory, ListKind, OBJECT_CHAR};
use crate::span::{Span, SpanSet, structural_breaks};
use crate::text::TextBuffer;
use crate::types::TextChange;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u32);

impl NodeId {
    fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ElementKind {
    Root,
    /// Inline styles, links, headings, paragraphs, quotes, media and comment
    /// markers.
    Styled(Format),
    List(ListKind),
    ListItem,
    /// `<br>`, owns its `\n`.
    LineBreak,
}

impl ElementKind {
    pub fn for_format(format: Format) -> Self {
        match format {
            Format::UnorderedList => ElementKind::List(ListKind::Unordered),
            Format::OrderedList => ElementKind::List(ListKind::Ordered),
            Format::ListItem => ElementKind::ListItem,
            other => ElementKind::Styled(other),
        }
    }

    pub fn format(&self) -> Option<Format> {
        match self {
            ElementKind::Styled(format) => Some(*format),
            ElementKind::List(kind) => Some(kind.format()),
            ElementKind::ListItem => Some(Format::ListItem),
            ElementKind::Root | ElementKind::LineBreak => None,
        }
    }

    pub fn is_block(&self) -> bool {
        self.format().is_some_and(Format::is_block)
    }

    /// Void elements own exactly one char and have no children.
    pub fn void_char(&self) -> Option<char> {
        match self {
            ElementKind::LineBreak => Some('\n'),
            ElementKind::Styled(format) if format.is_object() => Some(OBJECT_CHAR),
            _ => None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ElementNode {
    pub kind: ElementKind,
    pub tag: SmolStr,
    pub attributes: AttributeBag,
    pub children: Vec<NodeId>,
    pub parent: Option<NodeId>,
    pub start: usize,
    pub end: usize,
    /// Boundary line break folded in front of a list's items.
    pub leading_break: bool,
    /// Boundary line break folded after a list's items.
    pub trailing_break: bool,
}

impl ElementNode {
    /// Range of the element without folded boundary line breaks.
    pub fn content_range(&self) -> Range<usize> {
        let start = self.start + usize::from(self.leading_break);
        let end = self.end - usize::from(self.trailing_break);
        start..end.max(start)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TextNode {
    pub parent: Option<NodeId>,
    pub text: String,
    pub start: usize,
    pub end: usize,
    /// Structural line break implied between blocks; serialized as nothing.
    pub synthetic: bool,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Node {
    Element(ElementNode),
    Text(TextNode),
}

impl Node {
    pub fn range(&self) -> Range<usize> {
        match self {
            Node::Element(e) => e.start..e.end,
            Node::Text(t) => t.start..t.end,
        }
    }

    pub fn parent(&self) -> Option<NodeId> {
        match self {
            Node::Element(e) => e.parent,
            Node::Text(t) => t.parent,
        }
    }

    pub fn as_element(&self) -> Option<&ElementNode> {
        match self {
            Node::Element(e) => Some(e),
            Node::Text(_) => None,
        }
    }

    pub fn as_text(&self) -> Option<&TextNode> {
        match self {
            Node::Text(t) => Some(t),
            Node::Element(_) => None,
        }
    }

    fn shift(&mut self, delta: isize) {
        let (start, end) = match self {
            Node::Element(e) => (&mut e.start, &mut e.end),
            Node::Text(t) => (&mut t.start, &mut t.end),
        };
        *start = (*start as isize + delta) as usize;
        *end = (*end as isize + delta) as usize;
    }

    fn grow(&mut self, delta: isize) {
        let end = match self {
            Node::Element(e) => &mut e.end,
            Node::Text(t) => &mut t.end,
        };
        *end = (*end as isize + delta) as usize;
    }
}

/// Outcome of an incremental tree edit.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TreeEdit {
    /// The edit was applied inside this text leaf.
    Applied(NodeId),
    /// The edit changes structure; rebuild the tree from spans.
    NeedsRebuild,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ElementTree {
    nodes: Vec<Node>,
    root: NodeId,
}

impl Default for ElementTree {
    fn default() -> Self {
        Self::new()
    }
}

impl ElementTree {
    /// An empty document: a root element with no children.
    pub fn new() -> Self {
        Self {
            nodes: vec![Node::Element(ElementNode {
                kind: ElementKind::Root,
                tag: SmolStr::default(),
                attributes: AttributeBag::new(),
                children: Vec::new(),
                parent: None,
                start: 0,
                end: 0,
                leading_break: false,
                trailing_break: false,
            })],
            root: NodeId(0),
        }
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.index()]
    }

    fn node_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id.index()]
    }

    pub fn element(&self, id: NodeId) -> Option<&ElementNode> {
        self.node(id).as_element()
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        match self.node(id) {
            Node::Element(e) => &e.children,
            Node::Text(_) => &[],
        }
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).parent()
    }

    /// Length of the document the tree describes.
    pub fn len_chars(&self) -> usize {
        self.node(self.root).range().end
    }

    /// All nodes reachable from the root, in document order.
    pub fn descendants(&self) -> Vec<NodeId> {
        let mut out = Vec::with_capacity(self.nodes.len());
        let mut stack = vec![self.root];
        while let Some(id) = stack.pop() {
            out.push(id);
            stack.extend(self.children(id).iter().rev().copied());
        }
        out
    }

    pub fn ancestors(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        std::iter::successors(self.parent(id), move |&p| self.parent(p))
    }

    pub fn depth(&self, id: NodeId) -> usize {
        self.ancestors(id).count()
    }

    /// Rebuild the text content from the leaves.
    pub fn text(&self) -> String {
        let mut out = String::new();
        self.push_text(self.root, &mut out);
        out
    }

    fn push_text(&self, id: NodeId, out: &mut String) {
        match self.node(id) {
            Node::Text(t) => out.push_str(&t.text),
            Node::Element(e) => {
                if let Some(c) = e.kind.void_char() {
                    out.push(c);
                    return;
                }
                if e.leading_break {
                    out.push('\n');
                }
                for &child in &e.children {
                    self.push_text(child, out);
                }
                if e.trailing_break {
                    out.push('\n');
                }
            }
        }
    }

    /// One span per formatted element, in document order.
    pub fn to_spans(&self) -> Vec<Span> {
        self.descendants()
            .into_iter()
            .filter_map(|id| {
                let element = self.element(id)?;
                let format = element.kind.format()?;
                let range = element.content_range();
                Some(Span {
                    format,
                    tag: element.tag.clone(),
                    attributes: element.attributes.clone(),
                    start: range.start,
                    end: range.end,
                })
            })
            .collect()
    }

    /// Whether the tree describes exactly `spans` over `text`.
    ///
    /// Pieces of one inline span that the tree had to split around other
    /// elements count as that span. Two same-style elements side by side
    /// under one parent never do: canonical spans would have merged them.
    pub fn matches<T: TextBuffer + ?Sized>(&self, text: &T, spans: &SpanSet) -> bool {
        if self.len_chars() != text.len_chars() {
            return false;
        }
        match self.joined_spans() {
            Some(own) => same_spans(own, spans.as_slice()),
            None => false,
        }
    }

    /// Element spans with split inline pieces joined back together, or
    /// `None` when two same-style elements are adjacent siblings.
    fn joined_spans(&self) -> Option<Vec<Span>> {
        let mut out: Vec<Span> = Vec::new();
        // For each inline entry in `out`: the element holding its last piece.
        let mut last_piece: Vec<(usize, NodeId)> = Vec::new();
        for id in self.descendants() {
            let Some(element) = self.element(id) else {
                continue;
            };
            let Some(format) = element.kind.format() else {
                continue;
            };
            let range = element.content_range();
            let span = Span {
                format,
                tag: element.tag.clone(),
                attributes: element.attributes.clone(),
                start: range.start,
                end: range.end,
            };
            if !matches!(format.category(), FormatCategory::Inline | FormatCategory::Link) {
                out.push(span);
                continue;
            }
            let joined = last_piece
                .iter_mut()
                .find(|(i, _)| out[*i].end == span.start && out[*i].same_style(&span));
            match joined {
                Some((i, piece)) => {
                    if self.next_sibling(*piece) == Some(id) {
                        return None;
                    }
                    out[*i].end = span.end;
                    *piece = id;
                }
                None => {
                    last_piece.push((out.len(), id));
                    out.push(span);
                }
            }
        }
        Some(out)
    }

    fn next_sibling(&self, id: NodeId) -> Option<NodeId> {
        let siblings = self.children(self.parent(id)?);
        let idx = siblings.iter().position(|&c| c == id)?;
        siblings.get(idx + 1).copied()
    }

    /// Deepest non-synthetic text leaf whose range contains `start..end`.
    /// When the range sits on a boundary the earlier leaf wins.
    pub fn leaf_at(&self, start: usize, end: usize) -> Option<NodeId> {
        self.leaf_within(self.root, start, end)
    }

    /// Descend through the children whose ranges contain `start..end`.
    fn leaf_within(&self, id: NodeId, start: usize, end: usize) -> Option<NodeId> {
        match self.node(id) {
            Node::Text(t) => (!t.synthetic && t.start <= start && end <= t.end).then_some(id),
            Node::Element(e) => e
                .children
                .iter()
                .copied()
                .take_while(|&c| self.node(c).range().start <= start)
                .filter(|&c| end <= self.node(c).range().end)
                .find_map(|c| self.leaf_within(c, start, end)),
        }
    }

    /// Apply a text edit incrementally when it stays inside one text leaf and
    /// neither removes nor adds line breaks or object characters.
    pub fn apply_edit(&mut self, change: TextChange, inserted: &str) -> TreeEdit {
        if change.is_noop() {
            return TreeEdit::Applied(self.root);
        }
        if inserted.contains(['\n', OBJECT_CHAR]) {
            return TreeEdit::NeedsRebuild;
        }
        let Some(leaf) = self.leaf_at(change.start, change.old_end()) else {
            return TreeEdit::NeedsRebuild;
        };
        let Node::Text(text_node) = self.node(leaf) else {
            return TreeEdit::NeedsRebuild;
        };
        let old_end = text_node.end;
        let local = change.start - text_node.start;
        let remaining = text_node.end - text_node.start - change.deleted + change.inserted;
        if remaining == 0 {
            return TreeEdit::NeedsRebuild;
        }

        let byte_at = |s: &str, char_idx: usize| {
            s.char_indices()
                .nth(char_idx)
                .map(|(b, _)| b)
                .unwrap_or(s.len())
        };
        let from = byte_at(&text_node.text, local);
        let to = byte_at(&text_node.text, local + change.deleted);
        let deleted_text = &text_node.text[from..to];
        if deleted_text.contains(OBJECT_CHAR) {
            return TreeEdit::NeedsRebuild;
        }

        if let Node::Text(t) = self.node_mut(leaf) {
            t.text.replace_range(from..to, inserted);
        }

        // The leaf and its ancestors grow; everything after them on each
        // level moves.
        let delta = change.delta();
        self.node_mut(leaf).grow(delta);
        let mut child = leaf;
        while let Some(parent) = self.parent(child) {
            self.node_mut(parent).grow(delta);
            let following: Vec<NodeId> = self
                .children(parent)
                .iter()
                .copied()
                .skip_while(|&c| c != child)
                .skip(1)
                .collect();
            for sibling in following {
                debug_assert!(self.node(sibling).range().start >= old_end);
                self.shift_subtree(sibling, delta);
            }
            child = parent;
        }
        tracing::trace!(
            target: "weft::tree",
            leaf = leaf.0,
            ?change,
            "applied edit in place"
        );
        TreeEdit::Applied(leaf)
    }

    fn shift_subtree(&mut self, id: NodeId, delta: isize) {
        let mut stack = vec![id];
        while let Some(id) = stack.pop() {
            self.node_mut(id).shift(delta);
            stack.extend_from_slice(self.children(id));
        }
    }

    /// Build the tree described by `spans` over `text`.
    ///
    /// Block spans form the skeleton; inline spans are laid out inside the
    /// runs of text between structural line breaks. Spans that cross a
    /// parent's end are split there and the remainder continues after it.
    pub fn from_spans(text: &str, spans: &[Span]) -> ElementTree {
        let chars: Vec<char> = text.chars().collect();
        let structural = structural_newlines(&chars, spans);
        let (blocks, inline): (Vec<Span>, Vec<Span>) =
            spans.iter().cloned().partition(|s| s.format.is_block());
        let forest = BlockForest::build(&chars, blocks);

        let layout = Layout {
            chars: &chars,
            structural: &structural,
            inline: &inline,
            forest: &forest,
        };
        let mut builder = TreeBuilder::new();
        layout.emit_level(&mut builder, 0..chars.len(), &forest.roots);
        let tree = builder.finish();
        tracing::debug!(
            target: "weft::tree",
            nodes = tree.nodes.len(),
            len = chars.len(),
            "built tree from spans"
        );
        tree
    }
}

/// [`structural_breaks`] as a per-char mask.
pub fn structural_newlines(chars: &[char], spans: &[Span]) -> Vec<bool> {
    let mut structural = vec![false; chars.len()];
    for at in structural_breaks(|i| chars.get(i).copied(), spans) {
        structural[at] = true;
    }
    structural
}

/// Same spans in canonical order. Equal-range inline spans and objects may
/// come in any order; blocks must keep theirs since it encodes nesting.
fn same_spans(mut own: Vec<Span>, canonical: &[Span]) -> bool {
    if own.len() != canonical.len() {
        return false;
    }
    let key = |s: &Span| (s.start, Reverse(s.end), s.format.rank());
    own.sort_by_key(key);
    let mut i = 0;
    while i < own.len() {
        let group = own[i..].iter().take_while(|s| key(s) == key(&own[i])).count();
        let (mine, theirs) = (&own[i..i + group], &canonical[i..i + group]);
        let same = if own[i].format.is_block() {
            mine == theirs
        } else {
            let mut left: Vec<&Span> = theirs.iter().collect();
            mine.iter().all(|span| match left.iter().position(|s| *s == span) {
                Some(at) => {
                    left.swap_remove(at);
                    true
                }
                None => false,
            })
        };
        if !same {
            return false;
        }
        i += group;
    }
    true
}

/// Min-queue of spans in nesting order: start, longer first, rank, arrival.
#[derive(Default)]
struct SpanQueue {
    spans: Vec<Option<Span>>,
    heap: BinaryHeap<Reverse<(usize, Reverse<usize>, u8, usize)>>,
}

impl SpanQueue {
    fn push(&mut self, span: Span) {
        let seq = self.spans.len();
        self.heap.push(Reverse((
            span.start,
            Reverse(span.end),
            span.format.rank(),
            seq,
        )));
        self.spans.push(Some(span));
    }

    fn pop(&mut self) -> Option<Span> {
        let Reverse((_, _, _, seq)) = self.heap.pop()?;
        self.spans[seq].take()
    }
}

struct BlockNode {
    span: Span,
    children: Vec<usize>,
}

struct BlockForest {
    nodes: Vec<BlockNode>,
    roots: Vec<usize>,
}

impl BlockForest {
    fn build(chars: &[char], blocks: Vec<Span>) -> Self {
        let mut queue = SpanQueue::default();
        for span in blocks {
            queue.push(span);
        }

        let mut nodes: Vec<BlockNode> = Vec::new();
        let mut roots = Vec::new();
        let mut stack: Vec<usize> = Vec::new();

        while let Some(mut span) = queue.pop() {
            while let Some(&top) = stack.last() {
                let parent = &nodes[top].span;
                let inside = (parent.start <= span.start && span.start < parent.end)
                    || (span.start == span.end && span.start == parent.end);
                if inside {
                    break;
                }
                stack.pop();
            }

            if let Some(&top) = stack.last() {
                let parent_end = nodes[top].span.end;
                if span.end > parent_end {
                    let rest_start = if chars.get(parent_end) == Some(&'\n') {
                        parent_end + 1
                    } else {
                        parent_end
                    };
                    tracing::trace!(
                        target: "weft::tree",
                        format = %span.format,
                        range = ?span.range(),
                        parent_end,
                        "splitting block crossing its parent"
                    );
                    if rest_start < span.end {
                        queue.push(Span {
                            start: rest_start,
                            ..span.clone()
                        });
                    }
                    span.end = parent_end;
                }
            }

            let idx = nodes.len();
            nodes.push(BlockNode {
                span,
                children: Vec::new(),
            });
            match stack.last() {
                Some(&top) => nodes[top].children.push(idx),
                None => roots.push(idx),
            }
            stack.push(idx);
        }

        Self { nodes, roots }
    }
}

struct Layout<'a> {
    chars: &'a [char],
    structural: &'a [bool],
    inline: &'a [Span],
    forest: &'a BlockForest,
}

impl Layout<'_> {
    fn emit_level(&self, b: &mut TreeBuilder, range: Range<usize>, children: &[usize]) {
        let mut cursor = range.start;
        for &child in children {
            let block = &self.forest.nodes[child];
            let span = &block.span;
            if cursor < span.start {
                self.emit_runs(b, cursor..span.start);
            }
            b.open(
                ElementKind::for_format(span.format),
                span.tag.clone(),
                span.attributes.clone(),
            );
            self.emit_level(b, span.range(), &block.children);
            b.close();
            cursor = cursor.max(span.end);
        }
        if cursor < range.end {
            self.emit_runs(b, cursor..range.end);
        }
    }

    /// Split a block-level stretch at structural line breaks.
    fn emit_runs(&self, b: &mut TreeBuilder, range: Range<usize>) {
        let mut run_start = range.start;
        for pos in range.clone() {
            if self.structural[pos] {
                self.emit_inline(b, run_start..pos);
                b.boundary();
                run_start = pos + 1;
            }
        }
        self.emit_inline(b, run_start..range.end);
    }

    fn emit_inline(&self, b: &mut TreeBuilder, run: Range<usize>) {
        if run.is_empty() {
            return;
        }
        let mut queue = SpanQueue::default();
        for span in self.inline {
            if span.start < run.end && run.start < span.end {
                queue.push(Span {
                    start: span.start.max(run.start),
                    end: span.end.min(run.end),
                    ..span.clone()
                });
            }
        }

        let mut open: Vec<usize> = Vec::new();
        let mut pos = run.start;
        while let Some(mut span) = queue.pop() {
            while let Some(&end) = open.last() {
                if end > span.start {
                    break;
                }
                self.emit_text(b, pos..end);
                pos = pos.max(end);
                b.close();
                open.pop();
            }
            if span.start < pos {
                // Another object already claimed this position.
                continue;
            }
            self.emit_text(b, pos..span.start);
            pos = span.start;

            if let Some(&end) = open.last() {
                if span.end > end {
                    queue.push(Span {
                        start: end,
                        ..span.clone()
                    });
                    span.end = end;
                }
            }

            let kind = ElementKind::for_format(span.format);
            if kind.void_char().is_some() {
                b.void(kind, span.tag, span.attributes);
                pos = span.start + 1;
            } else {
                b.open(kind, span.tag, span.attributes);
                open.push(span.end);
            }
        }
        while let Some(end) = open.pop() {
            self.emit_text(b, pos..end);
            pos = pos.max(end);
            b.close();
        }
        self.emit_text(b, pos..run.end);
    }

    fn emit_text(&self, b: &mut TreeBuilder, range: Range<usize>) {
        if range.start < range.end {
            let text: String = self.chars[range].iter().collect();
            b.text(&text);
        }
    }
}

/// Incremental tree construction with a running offset.
pub(crate) struct TreeBuilder {
    tree: ElementTree,
    stack: Vec<NodeId>,
    offset: usize,
    last_char: Option<char>,
}

impl TreeBuilder {
    pub fn new() -> Self {
        let tree = ElementTree::new();
        let root = tree.root;
        Self {
            tree,
            stack: vec![root],
            offset: 0,
            last_char: None,
        }
    }

    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn last_char(&self) -> Option<char> {
        self.last_char
    }

    pub fn tree(&self) -> &ElementTree {
        &self.tree
    }

    fn current(&self) -> NodeId {
        self.stack.last().copied().unwrap_or(self.tree.root)
    }

    /// Open elements from outermost to innermost, root excluded.
    pub fn open_elements(&self) -> &[NodeId] {
        &self.stack[1..]
    }

    fn attach(&mut self, node: Node) -> NodeId {
        let id = NodeId(self.tree.nodes.len() as u32);
        let parent = self.current();
        self.tree.nodes.push(node);
        if let Node::Element(e) = self.tree.node_mut(parent) {
            e.children.push(id);
        }
        id
    }

    fn element(&self, kind: ElementKind, tag: SmolStr, attributes: AttributeBag) -> ElementNode {
        ElementNode {
            kind,
            tag,
            attributes,
            children: Vec::new(),
            parent: Some(self.current()),
            start: self.offset,
            end: self.offset,
            leading_break: false,
            trailing_break: false,
        }
    }

    pub fn open(&mut self, kind: ElementKind, tag: SmolStr, attributes: AttributeBag) -> NodeId {
        let element = self.element(kind, tag, attributes);
        let id = self.attach(Node::Element(element));
        self.stack.push(id);
        id
    }

    /// Close the innermost open element. The root is never closed.
    pub fn close(&mut self) -> Option<NodeId> {
        if self.stack.len() <= 1 {
            return None;
        }
        let id = self.stack.pop()?;
        let offset = self.offset;
        if let Node::Element(e) = self.tree.node_mut(id) {
            e.end = offset;
        }
        Some(id)
    }

    pub fn void(&mut self, kind: ElementKind, tag: SmolStr, attributes: AttributeBag) {
        let c = kind.void_char().unwrap_or(OBJECT_CHAR);
        let mut element = self.element(kind, tag, attributes);
        element.end = self.offset + 1;
        self.attach(Node::Element(element));
        self.offset += 1;
        self.last_char = Some(c);
    }

    /// Append text; line breaks become `<br>` elements.
    pub fn text(&mut self, text: &str) {
        for (i, piece) in text.split('\n').enumerate() {
            if i > 0 {
                self.void(
                    ElementKind::LineBreak,
                    SmolStr::new_static("br"),
                    AttributeBag::new(),
                );
            }
            self.push_leaf(piece, false);
        }
    }

    /// Append a structural line break.
    pub fn boundary(&mut self) {
        self.push_leaf("\n", true);
    }

    fn push_leaf(&mut self, text: &str, synthetic: bool) {
        if text.is_empty() {
            return;
        }
        let len = text.chars().count();
        let parent = self.current();
        let previous = self.tree.children(parent).last().copied();
        if let Some(prev) = previous {
            if let Node::Text(t) = self.tree.node_mut(prev) {
                if !t.synthetic && !synthetic {
                    t.text.push_str(text);
                    t.end += len;
                    self.offset += len;
                    self.last_char = text.chars().last();
                    return;
                }
            }
        }
        let node = Node::Text(TextNode {
            parent: Some(parent),
            text: text.to_string(),
            start: self.offset,
            end: self.offset + len,
            synthetic,
        });
        self.attach(node);
        self.offset += len;
        self.last_char = text.chars().last();
    }

    pub fn finish(mut self) -> ElementTree {
        while self.close().is_some() {}
        let end = self.offset;
        let root = self.tree.root;
        if let Node::Element(e) = self.tree.node_mut(root) {
            e.end = end;
        }
        fold_list_boundaries(&mut self.tree);
        self.tree
    }
}

/// Let each list claim the structural line break right after it, then the
/// one right before it if no earlier list took it.
fn fold_list_boundaries(tree: &mut ElementTree) {
    let lists: Vec<NodeId> = tree
        .descendants()
        .into_iter()
        .filter(|&id| matches!(tree.element(id).map(|e| &e.kind), Some(ElementKind::List(_))))
        .collect();

    let is_boundary = |tree: &ElementTree, id: NodeId| {
        matches!(tree.node(id), Node::Text(t) if t.synthetic)
    };

    for list in lists {
        let Some(parent) = tree.parent(list) else {
            continue;
        };
        let siblings = tree.children(parent).to_vec();
        let Some(idx) = siblings.iter().position(|&c| c == list) else {
            continue;
        };

        let mut claimed: Vec<NodeId> = Vec::new();
        if let Some(&next) = siblings.get(idx + 1) {
            if is_boundary(tree, next) {
                claimed.push(next);
                if let Node::Element(e) = tree.node_mut(list) {
                    e.end += 1;
                    e.trailing_break = true;
                }
            }
        }
        if idx > 0 {
            let prev = siblings[idx - 1];
            if is_boundary(tree, prev) {
                claimed.push(prev);
                if let Node::Element(e) = tree.node_mut(list) {
                    e.start -= 1;
                    e.leading_break = true;
                }
            }
        }
        if !claimed.is_empty() {
            if let Node::Element(e) = tree.node_mut(parent) {
                e.children.retain(|c| !claimed.contains(c));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::text::EditorRope;

    fn spans(list: &[(Format, usize, usize)]) -> Vec<Span> {
        list.iter().map(|&(f, s, e)| Span::new(f, s, e)).collect()
    }

    fn kinds(tree: &ElementTree) -> Vec<(usize, String)> {
        tree.descendants()
            .into_iter()
            .map(|id| {
                let label = match tree.node(id) {
                    Node::Element(e) => format!("{:?}", e.kind),
                    Node::Text(t) if t.synthetic => "Boundary".to_string(),
                    Node::Text(t) => format!("{:?}", t.text),
                };
                (tree.depth(id), label)
            })
            .collect()
    }

    #[test]
    fn builds_paragraphs_with_boundary() {
        let tree = ElementTree::from_spans(
            "a\nb",
            &spans(&[(Format::Paragraph, 0, 1), (Format::Paragraph, 2, 3)]),
        );
        assert_eq!(tree.text(), "a\nb");
        let root = tree.root();
        assert_eq!(tree.children(root).len(), 3);
        let boundary = tree.node(tree.children(root)[1]).as_text().unwrap();
        assert!(boundary.synthetic);
        assert_eq!(boundary.start, 1);
    }

    #[test]
    fn plain_line_breaks_become_elements() {
        let tree = ElementTree::from_spans("a\nb", &[]);
        let root = tree.root();
        let br = tree.element(tree.children(root)[1]).unwrap();
        assert_eq!(br.kind, ElementKind::LineBreak);
        assert_eq!(br.start..br.end, 1..2);
        assert_eq!(tree.text(), "a\nb");
    }

    #[test]
    fn lists_fold_their_boundaries() {
        let text = "x\na\nb\ny";
        let tree = ElementTree::from_spans(
            text,
            &spans(&[
                (Format::Paragraph, 0, 1),
                (Format::UnorderedList, 2, 5),
                (Format::ListItem, 2, 3),
                (Format::ListItem, 4, 5),
                (Format::Paragraph, 6, 7),
            ]),
        );
        let root = tree.root();
        // p, list, p: both boundaries around the list were absorbed.
        assert_eq!(tree.children(root).len(), 3);
        let list = tree.element(tree.children(root)[1]).unwrap();
        assert_eq!(list.start..list.end, 1..6);
        assert_eq!(list.content_range(), 2..5);
        assert_eq!(tree.text(), text);

        let rope = EditorRope::from_str(text);
        let mut expected = SpanSet::from_spans(tree.to_spans());
        expected.canonicalize(&rope);
        assert!(tree.matches(&rope, &expected));
    }

    #[test]
    fn inline_spans_split_at_block_boundaries() {
        let tree = ElementTree::from_spans(
            "ab\ncd",
            &spans(&[
                (Format::Paragraph, 0, 2),
                (Format::Paragraph, 3, 5),
                (Format::Bold, 1, 4),
            ]),
        );
        let bold: Vec<_> = tree
            .to_spans()
            .into_iter()
            .filter(|s| s.format == Format::Bold)
            .map(|s| s.range())
            .collect();
        assert_eq!(bold, vec![1..2, 3..4]);
    }

    #[test]
    fn crossing_inline_spans_are_split() {
        let tree = ElementTree::from_spans(
            "abcd",
            &spans(&[(Format::Bold, 0, 3), (Format::Italic, 1, 4)]),
        );
        assert_eq!(
            kinds(&tree),
            vec![
                (0, "Root".to_string()),
                (1, "Styled(Bold)".to_string()),
                (2, "\"a\"".to_string()),
                (2, "Styled(Italic)".to_string()),
                (3, "\"bc\"".to_string()),
                (1, "Styled(Italic)".to_string()),
                (2, "\"d\"".to_string()),
            ]
        );
    }

    #[test]
    fn nested_lists_keep_document_order() {
        let text = "a\nb";
        let tree = ElementTree::from_spans(
            text,
            &spans(&[
                (Format::UnorderedList, 0, 3),
                (Format::ListItem, 0, 3),
                (Format::UnorderedList, 2, 3),
                (Format::ListItem, 2, 3),
            ]),
        );
        let inner: Vec<_> = tree
            .descendants()
            .into_iter()
            .filter(|&id| matches!(tree.element(id).map(|e| &e.kind), Some(ElementKind::List(_))))
            .map(|id| (tree.depth(id), tree.element(id).unwrap().content_range()))
            .collect();
        assert_eq!(inner, vec![(1, 0..3), (3, 2..3)]);
        assert_eq!(tree.text(), text);
    }

    #[test]
    fn empty_list_item_stays_inside_list() {
        let tree = ElementTree::from_spans(
            "a\n",
            &spans(&[
                (Format::OrderedList, 0, 2),
                (Format::ListItem, 0, 1),
                (Format::ListItem, 2, 2),
            ]),
        );
        let list = tree.children(tree.root())[0];
        let items: Vec<_> = tree
            .children(list)
            .iter()
            .filter_map(|&c| tree.element(c))
            .map(|e| e.start..e.end)
            .collect();
        assert_eq!(items, vec![0..1, 2..2]);
    }

    #[test]
    fn media_is_a_void_element() {
        let tree = ElementTree::from_spans("a\u{FFFC}b", &spans(&[(Format::Image, 1, 2)]));
        let root = tree.root();
        assert_eq!(tree.children(root).len(), 3);
        let img = tree.element(tree.children(root)[1]).unwrap();
        assert_eq!(img.kind, ElementKind::Styled(Format::Image));
        assert!(img.children.is_empty());
        assert_eq!(tree.text(), "a\u{FFFC}b");
    }

    #[test]
    fn incremental_edit_inside_leaf() {
        let mut tree = ElementTree::from_spans(
            "hello world",
            &spans(&[(Format::Bold, 0, 5)]),
        );
        let edit = tree.apply_edit(TextChange::insertion(5, 1), "!");
        assert!(matches!(edit, TreeEdit::Applied(_)));
        assert_eq!(tree.text(), "hello! world");
        let bold = &tree.to_spans()[0];
        assert_eq!(bold.range(), 0..6);
        assert_eq!(tree.len_chars(), 12);
    }

    #[test]
    fn leaf_lookup_prefers_the_earlier_leaf() {
        let tree = ElementTree::from_spans(
            "ab\u{FFFC}cd",
            &spans(&[(Format::Bold, 0, 2), (Format::Image, 2, 3), (Format::Italic, 3, 5)]),
        );
        let leaf_text = |id: Option<NodeId>| {
            id.and_then(|id| tree.node(id).as_text())
                .map(|t| t.text.clone())
        };
        assert_eq!(leaf_text(tree.leaf_at(2, 2)), Some("ab".into()));
        assert_eq!(leaf_text(tree.leaf_at(3, 3)), Some("cd".into()));
        assert_eq!(leaf_text(tree.leaf_at(1, 4)), None);
    }

    #[test]
    fn incremental_edit_moves_later_siblings_on_every_level() {
        let layout = [
            (Format::UnorderedList, 0, 5),
            (Format::ListItem, 0, 2),
            (Format::ListItem, 3, 5),
            (Format::Paragraph, 6, 8),
            (Format::Bold, 3, 4),
        ];
        let mut tree = ElementTree::from_spans("ab\ncd\nef", &spans(&layout));
        let edit = tree.apply_edit(TextChange::insertion(1, 2), "xy");
        assert!(matches!(edit, TreeEdit::Applied(_)));

        let shifted: Vec<_> = layout
            .iter()
            .map(|&(f, s, e)| {
                let moved = |x: usize| if x > 1 { x + 2 } else { x };
                (f, moved(s), moved(e))
            })
            .collect();
        let fresh = ElementTree::from_spans("axyb\ncd\nef", &spans(&shifted));
        let ranges = |t: &ElementTree| {
            t.descendants()
                .into_iter()
                .map(|id| t.node(id).range())
                .collect::<Vec<_>>()
        };
        assert_eq!(ranges(&tree), ranges(&fresh));
        assert_eq!(tree.text(), "axyb\ncd\nef");
    }

    #[test]
    fn split_pieces_match_but_side_by_side_duplicates_do_not() {
        let text = "abcd";
        let rope = EditorRope::from_str(text);
        let crossing = spans(&[(Format::Bold, 0, 3), (Format::Italic, 1, 4)]);
        let tree = ElementTree::from_spans(text, &crossing);
        let mut canonical = SpanSet::from_spans(crossing);
        canonical.canonicalize(&rope);
        assert!(tree.matches(&rope, &canonical));

        let mut builder = TreeBuilder::new();
        for piece in ["ab", "cd"] {
            builder.open(
                ElementKind::Styled(Format::Bold),
                SmolStr::new_static("b"),
                AttributeBag::new(),
            );
            builder.text(piece);
            builder.close();
        }
        let doubled = builder.finish();
        let mut bold = SpanSet::from_spans(spans(&[(Format::Bold, 0, 4)]));
        bold.canonicalize(&rope);
        assert!(!doubled.matches(&rope, &bold));
        assert!(ElementTree::from_spans(text, bold.as_slice()).matches(&rope, &bold));
    }

    #[test]
    fn structural_edits_need_rebuild() {
        let mut tree = ElementTree::from_spans("ab", &[]);
        assert_eq!(
            tree.apply_edit(TextChange::insertion(1, 1), "\n"),
            TreeEdit::NeedsRebuild
        );
        let mut tree = ElementTree::from_spans("a\nb", &[]);
        assert_eq!(
            tree.apply_edit(TextChange::deletion(0..2), ""),
            TreeEdit::NeedsRebuild
        );
        let mut tree = ElementTree::new();
        assert_eq!(
            tree.apply_edit(TextChange::insertion(0, 1), "x"),
            TreeEdit::NeedsRebuild
        );
    }

    #[test]
    fn structural_newline_rule() {
        let chars: Vec<char> = "a\n\nb\nc".chars().collect();
        let blocks = spans(&[(Format::Paragraph, 3, 4)]);
        let structural = structural_newlines(&chars, &blocks);
        // The break after "a" follows no block and precedes an empty line.
        assert_eq!(structural, vec![false, false, false, false, true, false]);
    }
}
