//! Per-visitor gap filling. Hits sharing a visitor key are treated as one
//! session with a single search origin, so the first known value of a
//! column is spread to every hit of the session that lacks one.

use keyword_core::types::{ClickRecord, VisitorKey};
use std::collections::HashMap;

/// Row indices of each visitor group. Groups appear in order of their first
/// row; indices inside a group are ascending.
#[derive(Debug, Clone, Default)]
pub struct VisitorGroups {
    groups: Vec<Vec<usize>>,
}

impl VisitorGroups {
    pub fn from_records(records: &[ClickRecord]) -> Self {
        let mut positions: HashMap<VisitorKey<'_>, usize> = HashMap::new();
        let mut groups: Vec<Vec<usize>> = Vec::new();

        for (row, record) in records.iter().enumerate() {
            let slot = *positions.entry(record.visitor_key()).or_insert_with(|| {
                groups.push(Vec::new());
                groups.len() - 1
            });
            groups[slot].push(row);
        }

        Self { groups }
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Forward-fill then backward-fill `column` inside every group.
    /// `column` is indexed by row and must cover every row the groups were
    /// built from.
    pub fn fill<T: Clone>(&self, column: &mut [Option<T>]) {
        for rows in &self.groups {
            fill_group(column, rows);
        }
    }
}

fn fill_group<T: Clone>(column: &mut [Option<T>], rows: &[usize]) {
    // Forward pass: carry the last seen value down.
    let mut last: Option<T> = None;
    for &row in rows {
        match &column[row] {
            Some(value) => last = Some(value.clone()),
            None => column[row] = last.clone(),
        }
    }

    // Backward pass: only leading rows can still be empty.
    let mut next: Option<T> = None;
    for &row in rows.iter().rev() {
        match &column[row] {
            Some(value) => next = Some(value.clone()),
            None => column[row] = next.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hit(ip: &str) -> ClickRecord {
        ClickRecord {
            ip: ip.to_string(),
            user_agent: "Mozilla/5.0".into(),
            geo_city: "Duncan".into(),
            geo_region: "OK".into(),
            geo_country: "US".into(),
            ..Default::default()
        }
    }

    #[test]
    fn test_groups_by_visitor_key() {
        let records = vec![hit("1.1.1.1"), hit("2.2.2.2"), hit("1.1.1.1")];
        let groups = VisitorGroups::from_records(&records);
        assert_eq!(groups.len(), 2);
        assert_eq!(groups.groups[0], vec![0, 2]);
        assert_eq!(groups.groups[1], vec![1]);
    }

    #[test]
    fn test_fill_middle_value_both_ways() {
        let records = vec![hit("1.1.1.1"), hit("1.1.1.1"), hit("1.1.1.1")];
        let groups = VisitorGroups::from_records(&records);

        let mut domain = vec![None, Some("google.com"), None];
        let mut keyword = vec![None, Some("shoes".to_string()), None];
        groups.fill(&mut domain);
        groups.fill(&mut keyword);

        assert_eq!(domain, vec![Some("google.com"); 3]);
        assert_eq!(keyword, vec![Some("shoes".to_string()); 3]);
    }

    #[test]
    fn test_forward_fill_takes_nearest_preceding() {
        let records = vec![hit("a"), hit("a"), hit("a"), hit("a")];
        let groups = VisitorGroups::from_records(&records);
        let mut column = vec![Some(1), None, Some(2), None];
        groups.fill(&mut column);
        assert_eq!(column, vec![Some(1), Some(1), Some(2), Some(2)]);
    }

    #[test]
    fn test_fill_does_not_cross_groups() {
        let records = vec![hit("a"), hit("b"), hit("a"), hit("b")];
        let groups = VisitorGroups::from_records(&records);
        let mut column = vec![None, Some("yahoo"), None, None];
        groups.fill(&mut column);
        assert_eq!(column, vec![None, Some("yahoo"), None, Some("yahoo")]);
    }

    #[test]
    fn test_fill_is_idempotent() {
        let records = vec![hit("a"), hit("a"), hit("b")];
        let groups = VisitorGroups::from_records(&records);
        let mut column = vec![None, Some("bing"), None];
        groups.fill(&mut column);
        let once = column.clone();
        groups.fill(&mut column);
        assert_eq!(column, once);
    }

    #[test]
    fn test_empty_input() {
        let groups = VisitorGroups::from_records(&[]);
        assert!(groups.is_empty());
        let mut column: Vec<Option<u8>> = Vec::new();
        groups.fill(&mut column);
        assert!(column.is_empty());
    }
}
