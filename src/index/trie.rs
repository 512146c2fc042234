use std::collections::BTreeMap;
use std::sync::Arc;

type Children<T> = BTreeMap<u8, Arc<TrieNode<T>>>;

/// A trie node either just routes to children or additionally carries a
/// value; the variant plays the role a downcast would in a class hierarchy.
enum TrieNode<T> {
    Inner { children: Children<T> },
    Leaf { children: Children<T>, value: Arc<T> },
}

impl<T> TrieNode<T> {
    fn children(&self) -> &Children<T> {
        match self {
            TrieNode::Inner { children } | TrieNode::Leaf { children, .. } => children,
        }
    }

    fn value(&self) -> Option<&Arc<T>> {
        match self {
            TrieNode::Inner { .. } => None,
            TrieNode::Leaf { value, .. } => Some(value),
        }
    }

    /// Same node with replaced children, value (if any) shared with `self`.
    fn with_children(&self, children: Children<T>) -> Self {
        match self {
            TrieNode::Inner { .. } => TrieNode::Inner { children },
            TrieNode::Leaf { value, .. } => TrieNode::Leaf {
                children,
                value: Arc::clone(value),
            },
        }
    }
}

/// Persistent copy-on-write trie keyed by byte strings.
///
/// Every update builds a fresh root and rebuilds only the nodes along the
/// key's path; everything else is shared with the previous version through
/// `Arc`, so readers holding an old root are never disturbed.
pub struct Trie<T> {
    root: Option<Arc<TrieNode<T>>>,
}

impl<T> Trie<T> {
    pub fn new() -> Self {
        Self { root: None }
    }

    pub fn get(&self, key: &str) -> Option<&T> {
        let mut node = self.root.as_ref()?;
        for ch in key.bytes() {
            node = node.children().get(&ch)?;
        }
        node.value().map(Arc::as_ref)
    }

    /// A trie with `key` bound to `value`; `self` is unchanged.
    pub fn put(&self, key: &str, value: T) -> Self {
        let root = put_node(self.root.as_ref(), key.as_bytes(), value);
        Self {
            root: Some(Arc::new(root)),
        }
    }

    /// A trie without `key`'s value. Nodes left with neither value nor
    /// children are pruned; removing an absent key changes nothing.
    pub fn remove(&self, key: &str) -> Self {
        Self {
            root: self
                .root
                .as_ref()
                .and_then(|root| remove_node(root, key.as_bytes())),
        }
    }
}

impl<T> Clone for Trie<T> {
    fn clone(&self) -> Self {
        Self {
            root: self.root.clone(),
        }
    }
}

impl<T> Default for Trie<T> {
    fn default() -> Self {
        Self::new()
    }
}

fn put_node<T>(node: Option<&Arc<TrieNode<T>>>, key: &[u8], value: T) -> TrieNode<T> {
    match key.split_first() {
        // End of the key: a value node here, keeping any existing subtrees.
        None => TrieNode::Leaf {
            children: node.map_or_else(Children::new, |n| n.children().clone()),
            value: Arc::new(value),
        },
        Some((&ch, rest)) => {
            let child = node.and_then(|n| n.children().get(&ch));
            let new_child = Arc::new(put_node(child, rest, value));

            let mut children = node.map_or_else(Children::new, |n| n.children().clone());
            children.insert(ch, new_child);
            match node {
                Some(n) => n.with_children(children),
                None => TrieNode::Inner { children },
            }
        }
    }
}

fn remove_node<T>(node: &Arc<TrieNode<T>>, key: &[u8]) -> Option<Arc<TrieNode<T>>> {
    match key.split_first() {
        None => match node.as_ref() {
            // Strip the value; the node survives only to route to children.
            TrieNode::Leaf { children, .. } if !children.is_empty() => {
                Some(Arc::new(TrieNode::Inner {
                    children: children.clone(),
                }))
            }
            TrieNode::Leaf { .. } => None,
            TrieNode::Inner { .. } => Some(Arc::clone(node)),
        },
        Some((&ch, rest)) => {
            let Some(child) = node.children().get(&ch) else {
                return Some(Arc::clone(node));
            };

            let mut children = node.children().clone();
            match remove_node(child, rest) {
                Some(new_child) => {
                    children.insert(ch, new_child);
                }
                None => {
                    children.remove(&ch);
                }
            }

            match node.as_ref() {
                TrieNode::Leaf { value, .. } => Some(Arc::new(TrieNode::Leaf {
                    children,
                    value: Arc::clone(value),
                })),
                TrieNode::Inner { .. } if children.is_empty() => None,
                TrieNode::Inner { .. } => Some(Arc::new(TrieNode::Inner { children })),
            }
        }
    }
}
