//! Expansion of structured slots into child nodes.

use crate::configurable::{Children, Configurable};
use crate::key::Key;

/// A pending unit of resolution: a key and the slot it fills.
pub struct Node<'a> {
    pub key: Key,
    pub slot: &'a mut dyn Configurable,
}

impl<'a> Node<'a> {
    pub fn new(key: Key, slot: &'a mut dyn Configurable) -> Self {
        Self { key, slot }
    }
}

impl std::fmt::Debug for Node<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Node")
            .field("key", &self.key.render())
            .field("shape", &self.slot.shape())
            .finish()
    }
}

/// Lists the child nodes of `slot`, keyed below `base`.
///
/// Records yield one node per non-excluded field, sequences one node per
/// element, indirections are unwrapped under the same key and leaves yield
/// nothing. The result depends only on the slot's current contents, so the
/// driver calls this again after each allocation.
pub fn expand<'a>(slot: &'a mut dyn Configurable, base: &Key) -> Vec<Node<'a>> {
    match slot.children() {
        Children::None => Vec::new(),
        Children::Fields(fields) => fields
            .into_iter()
            .filter_map(|field| {
                let key = field.key()?;
                Some(Node::new(base.push(&key), field.slot))
            })
            .collect(),
        Children::Elements(elements) => elements
            .into_iter()
            .enumerate()
            .map(|(index, slot)| Node::new(base.push(&Key::index(index)), slot))
            .collect(),
        Children::Indirect(inner) => expand(inner, base),
    }
}
