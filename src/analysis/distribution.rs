use crate::models::aggregation::DistributionEntry;
use crate::models::entity::Entity;
use std::collections::{HashMap, HashSet};

/// Label counter that remembers first-seen order, used as the tie-break when
/// sorting by count.
#[derive(Debug, Default)]
pub struct Tally {
    order: Vec<String>,
    counts: HashMap<String, usize>,
}

impl Tally {
    pub fn add(&mut self, label: &str) {
        match self.counts.get_mut(label) {
            Some(count) => *count += 1,
            None => {
                self.order.push(label.to_string());
                self.counts.insert(label.to_string(), 1);
            }
        }
    }

    /// Entries sorted descending by count.
    pub fn into_sorted(self) -> Vec<DistributionEntry> {
        let Tally { order, counts } = self;
        let mut entries: Vec<DistributionEntry> = order
            .into_iter()
            .map(|label| {
                let count = counts.get(&label).copied().unwrap_or(0);
                DistributionEntry { label, count }
            })
            .collect();
        entries.sort_by(|a, b| b.count.cmp(&a.count));
        entries
    }
}

fn non_blank(value: Option<&String>) -> Option<&str> {
    value.map(|v| v.trim()).filter(|v| !v.is_empty())
}

/// First `length` characters of the address, or the unregistered bucket.
pub fn region_code(address: Option<&String>, length: usize, unregistered: &str) -> String {
    match non_blank(address) {
        Some(addr) => addr.chars().take(length).collect(),
        None => unregistered.to_string(),
    }
}

pub fn biz_type_distribution(entities: &[&Entity], unregistered: &str) -> Vec<DistributionEntry> {
    let mut tally = Tally::default();
    for entity in entities {
        tally.add(non_blank(entity.biz_type.as_ref()).unwrap_or(unregistered));
    }
    tally.into_sorted()
}

pub fn region_distribution(entities: &[&Entity], length: usize, unregistered: &str) -> Vec<DistributionEntry> {
    let mut tally = Tally::default();
    for entity in entities {
        tally.add(&region_code(entity.company_address.as_ref(), length, unregistered));
    }
    tally.into_sorted()
}

/// Each entity counts once per distinct need it lists.
pub fn support_needs_distribution(entities: &[&Entity]) -> Vec<DistributionEntry> {
    let mut tally = Tally::default();
    for entity in entities {
        let mut seen: HashSet<&str> = HashSet::new();
        for need in &entity.support_needs {
            let need = need.trim();
            if need.is_empty() || !seen.insert(need) {
                continue;
            }
            tally.add(need);
        }
    }
    tally.into_sorted()
}
