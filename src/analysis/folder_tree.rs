use crate::models::entity::Entity;
use crate::models::folder::{Folder, ROOT_FOLDER_ID};
use std::collections::{BTreeSet, HashMap, HashSet};

/// Flat folder snapshot: folders by id plus a parent → children index.
pub struct FolderIndex<'a> {
    by_id: HashMap<&'a str, &'a Folder>,
    children: HashMap<&'a str, Vec<&'a str>>,
}

impl<'a> FolderIndex<'a> {
    pub fn new(folders: &'a [Folder]) -> Self {
        let mut by_id = HashMap::with_capacity(folders.len());
        let mut children: HashMap<&str, Vec<&str>> = HashMap::new();
        for folder in folders {
            by_id.insert(folder.id.as_str(), folder);
            children
                .entry(folder.parent_id.as_str())
                .or_default()
                .push(folder.id.as_str());
        }
        Self { by_id, children }
    }

    pub fn get(&self, folder_id: &str) -> Option<&'a Folder> {
        self.by_id.get(folder_id).copied()
    }

    pub fn contains(&self, folder_id: &str) -> bool {
        folder_id == ROOT_FOLDER_ID || self.by_id.contains_key(folder_id)
    }

    /// `folder_id` plus every descendant. Root resolves to every stored folder.
    /// A folder reached twice closes a cycle; that branch is not descended again.
    pub fn subtree_ids(&self, folder_id: &str) -> BTreeSet<String> {
        if folder_id == ROOT_FOLDER_ID {
            return self.by_id.keys().map(|id| id.to_string()).collect();
        }

        let mut visited: HashSet<&str> = HashSet::new();
        let mut stack: Vec<&str> = vec![folder_id];
        while let Some(current) = stack.pop() {
            if !visited.insert(current) {
                continue;
            }
            for &kid in self.children.get(current).into_iter().flatten() {
                if visited.contains(kid) {
                    log::warn!("Folder cycle detected at {kid}; branch excluded from scope");
                    continue;
                }
                stack.push(kid);
            }
        }

        visited.into_iter().map(str::to_string).collect()
    }

    /// Folder names from the top-level ancestor down to `folder_id`.
    /// Stops at a dangling parent reference or a revisited folder.
    pub fn path_names(&self, folder_id: &str) -> Vec<String> {
        let mut names = Vec::new();
        let mut seen: HashSet<&str> = HashSet::new();
        let mut current = folder_id;

        while current != ROOT_FOLDER_ID && !current.is_empty() {
            if !seen.insert(current) {
                break;
            }
            let Some(folder) = self.get(current) else {
                break;
            };
            names.push(folder.name.clone());
            current = folder.parent_id.as_str();
        }

        names.reverse();
        names
    }

    /// True when `candidate` is `folder_id` itself or lies below it.
    pub fn is_descendant_or_self(&self, candidate: &str, folder_id: &str) -> bool {
        if folder_id == ROOT_FOLDER_ID {
            return true;
        }
        self.subtree_ids(folder_id).contains(candidate)
    }
}

pub fn resolve_subtree_ids(folder_id: &str, folders: &[Folder]) -> BTreeSet<String> {
    FolderIndex::new(folders).subtree_ids(folder_id)
}

pub fn resolve_path_names(folder_id: &str, folders: &[Folder]) -> Vec<String> {
    FolderIndex::new(folders).path_names(folder_id)
}

/// Header path such as `ROOT / 2024 / Batch A`. `None` for an unknown folder.
pub fn format_path(folder_id: &str, folders: &[Folder]) -> Option<String> {
    if folder_id == ROOT_FOLDER_ID {
        return Some("ROOT".to_string());
    }
    let names = resolve_path_names(folder_id, folders);
    if names.is_empty() {
        return None;
    }
    Some(format!("ROOT / {}", names.join(" / ")))
}

/// Entities placed in any folder of `scope_ids`.
pub fn entities_in_scope<'a>(entities: &'a [Entity], scope_ids: &BTreeSet<String>) -> Vec<&'a Entity> {
    entities
        .iter()
        .filter(|e| scope_ids.contains(&e.parent_id))
        .collect()
}
