use crate::record::{coerce_to_string, Record};
use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;
use std::hash::Hash;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TreeNode<T> {
    #[serde(flatten)]
    pub item: T,
    #[serde(rename = "nodes")]
    pub children: Vec<TreeNode<T>>,
}

/// Arrange a flat list with parent pointers into a forest.
///
/// Siblings keep their input order. An item whose parent is absent or unknown
/// becomes a root; items only reachable through a parent cycle are dropped.
pub fn treeify<T, K, FI, FP>(items: Vec<T>, id_of: FI, parent_of: FP) -> Vec<TreeNode<T>>
where
    K: Eq + Hash,
    FI: Fn(&T) -> K,
    FP: Fn(&T) -> Option<K>,
{
    let mut position: HashMap<K, usize> = HashMap::new();
    for (i, item) in items.iter().enumerate() {
        position.entry(id_of(item)).or_insert(i);
    }

    let mut children: Vec<Vec<usize>> = vec![Vec::new(); items.len()];
    let mut roots = Vec::new();
    for (i, item) in items.iter().enumerate() {
        match parent_of(item).and_then(|parent| position.get(&parent).copied()) {
            Some(parent) => children[parent].push(i),
            None => roots.push(i),
        }
    }

    let mut slots: Vec<Option<T>> = items.into_iter().map(Some).collect();
    roots
        .into_iter()
        .filter_map(|root| build(root, &children, &mut slots))
        .collect()
}

fn build<T>(index: usize, children: &[Vec<usize>], slots: &mut [Option<T>]) -> Option<TreeNode<T>> {
    let item = slots[index].take()?;
    let kids = children[index]
        .iter()
        .filter_map(|&child| build(child, children, slots))
        .collect();
    Some(TreeNode {
        item,
        children: kids,
    })
}

/// [`treeify`] over JSON records, keyed by the string form of `id_attr` / `parent_attr`.
pub fn treeify_records(
    records: Vec<Record>,
    id_attr: &str,
    parent_attr: &str,
) -> Vec<TreeNode<Record>> {
    treeify(
        records,
        |record| coerce_to_string(record.get(id_attr)),
        |record| match record.get(parent_attr) {
            None | Some(Value::Null) => None,
            parent => Some(coerce_to_string(parent)),
        },
    )
}
