use std::collections::BTreeMap;

/// Handle to a visual node placed on a [`Surface`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u32);

/// Rendering surface consumed by the core. The core never assumes anything
/// about how a node ends up on screen.
pub trait Surface {
    type Frame;

    fn add_node(&mut self) -> NodeId;
    fn show_frame(&mut self, node: NodeId, frame: &Self::Frame);
    fn remove_node(&mut self, node: NodeId);
    fn request_redraw(&mut self);
}

/// In-memory surface. Keeps the frame each node currently shows and a
/// pending-redraw flag the terminal renderer consumes.
#[derive(Debug)]
pub struct FrameSurface<F> {
    nodes: BTreeMap<NodeId, Option<F>>,
    next_id: u32,
    nodes_created: usize,
    redraws: usize,
    dirty: bool,
}

impl<F> Default for FrameSurface<F> {
    fn default() -> Self {
        Self {
            nodes: BTreeMap::new(),
            next_id: 0,
            nodes_created: 0,
            redraws: 0,
            dirty: false,
        }
    }
}

impl<F> FrameSurface<F> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Frame shown by the first live node, if any.
    pub fn visible_frame(&self) -> Option<&F> {
        self.nodes.values().find_map(|f| f.as_ref())
    }

    pub fn frame(&self, node: NodeId) -> Option<&F> {
        self.nodes.get(&node).and_then(|f| f.as_ref())
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Total nodes ever added, including removed ones.
    pub fn nodes_created(&self) -> usize {
        self.nodes_created
    }

    /// Total redraw requests received.
    pub fn redraws(&self) -> usize {
        self.redraws
    }

    /// Returns whether a redraw was requested since the last call.
    pub fn take_redraw(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }
}

impl<F: Clone> Surface for FrameSurface<F> {
    type Frame = F;

    fn add_node(&mut self) -> NodeId {
        let id = NodeId(self.next_id);
        self.next_id += 1;
        self.nodes_created += 1;
        self.nodes.insert(id, None);
        id
    }

    fn show_frame(&mut self, node: NodeId, frame: &F) {
        if let Some(slot) = self.nodes.get_mut(&node) {
            *slot = Some(frame.clone());
        }
    }

    fn remove_node(&mut self, node: NodeId) {
        self.nodes.remove(&node);
    }

    fn request_redraw(&mut self) {
        self.redraws += 1;
        self.dirty = true;
    }
}
