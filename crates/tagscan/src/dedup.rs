//! Cross-batch merge of repeated identifiers.

use std::collections::HashMap;
use std::path::PathBuf;

use crate::classifier::{ClassifiedItem, ItemKey};
use crate::pipeline::page::PageResult;

/// Collapses identical identifiers across all pages into one entry each.
///
/// Identity is [`ItemKey`]: tags by (type, case-insensitive value), equipment
/// by case-insensitive value. The retained item for a key is the one with the
/// strictly highest confidence, the first seen on ties. Output keeps one
/// `PageResult` per (source, page) that still owns a retained item, in
/// first-seen page order, with items in their original page order.
pub fn deduplicate(results: &[PageResult]) -> Vec<PageResult> {
    let _span = tracing::info_span!("dedup", pages = results.len()).entered();

    // key -> (page index, item index) of the current winner
    let mut winners: HashMap<ItemKey, (usize, usize)> = HashMap::new();
    for (page_idx, page) in results.iter().enumerate() {
        for (item_idx, item) in page.items.iter().enumerate() {
            winners
                .entry(item.key())
                .and_modify(|winner| {
                    let current = &results[winner.0].items[winner.1];
                    if item.confidence() > current.confidence() {
                        *winner = (page_idx, item_idx);
                    }
                })
                .or_insert((page_idx, item_idx));
        }
    }

    let mut retained: Vec<Vec<bool>> = results
        .iter()
        .map(|page| vec![false; page.items.len()])
        .collect();
    for &(page_idx, item_idx) in winners.values() {
        retained[page_idx][item_idx] = true;
    }

    // a (source, page) pair may appear in several results; merge them
    let mut merged: Vec<PageResult> = Vec::new();
    let mut slots: HashMap<(PathBuf, u32), usize> = HashMap::new();
    for (page, keep) in results.iter().zip(&retained) {
        let items: Vec<ClassifiedItem> = page
            .items
            .iter()
            .zip(keep)
            .filter(|&(_, &retain)| retain)
            .map(|(item, _)| item.clone())
            .collect();
        if items.is_empty() {
            continue;
        }

        match slots.get(&(page.source_path.clone(), page.page_number)) {
            Some(&slot) => merged[slot].items.extend(items),
            None => {
                slots.insert((page.source_path.clone(), page.page_number), merged.len());
                merged.push(page.with_items(items));
            }
        }
    }

    let before: usize = results.iter().map(|p| p.items.len()).sum();
    let after: usize = merged.iter().map(|p| p.items.len()).sum();
    tracing::debug!(before, after, pages = merged.len(), "Deduplicated results");

    merged
}
