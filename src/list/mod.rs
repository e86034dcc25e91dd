//! The ordered action list and its structural operations.
//!
//! Order is execution order, so every operation here is order-aware:
//! - `append` / `replace` for adding and editing rows.
//! - `delete`, `duplicate`, `move_up`, `move_down` take an index set
//!   (multi-select) and apply all-or-nothing: the whole set is validated
//!   before anything is touched, so a bad index or a boundary move never
//!   leaves the list partially reordered.
//!
//! The list itself performs no I/O. Callers persist after each mutation and
//! refresh whatever view they maintain.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::Action;

/// Rejection reasons for structural list operations.
///
/// All of these are synchronous validation errors: the list is unchanged
/// whenever one is returned.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ListError {
    /// An index in the selection does not name an existing row.
    #[error("index {index} is out of range (list has {len} rows)")]
    OutOfRange { index: usize, len: usize },

    /// The selection contains the first row, which cannot move further up.
    #[error("the top row cannot move up")]
    AtTop,

    /// The selection contains the last row, which cannot move further down.
    #[error("the bottom row cannot move down")]
    AtBottom,

    /// The selection is empty.
    #[error("no rows selected")]
    EmptySelection,
}

/// Ordered sequence of actions.
///
/// Serializes transparently as a JSON array, which is the on-disk shape of
/// the items file.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(transparent)]
pub struct ActionList {
    items: Vec<Action>,
}

impl ActionList {
    /// Create an empty list.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    #[must_use]
    pub fn get(&self, index: usize) -> Option<&Action> {
        self.items.get(index)
    }

    /// All rows, in execution order.
    #[must_use]
    pub fn actions(&self) -> &[Action] {
        &self.items
    }

    /// Owned copy of the rows for a run. The engine operates on this
    /// snapshot, so edits to the live list never affect an in-flight run.
    #[must_use]
    pub fn snapshot(&self) -> Vec<Action> {
        self.items.clone()
    }

    /// Add a row at the end.
    pub fn append(&mut self, action: Action) {
        self.items.push(action);
    }

    /// Replace the row at `index` (the edit-dialog path).
    pub fn replace(&mut self, index: usize, action: Action) -> Result<(), ListError> {
        let len = self.len();
        let slot = self
            .items
            .get_mut(index)
            .ok_or(ListError::OutOfRange { index, len })?;
        *slot = action;
        Ok(())
    }

    /// Delete the selected rows. Removal happens in descending index order
    /// so earlier removals cannot shift later ones.
    pub fn delete(&mut self, indices: &[usize]) -> Result<(), ListError> {
        let mut selection = self.validated_selection(indices)?;
        selection.sort_unstable_by(|a, b| b.cmp(a));
        for index in selection {
            self.items.remove(index);
        }
        Ok(())
    }

    /// Append value-equal copies of the selected rows at the end, in
    /// ascending selection order. Copies are independently owned: editing a
    /// copy never touches its source row.
    pub fn duplicate(&mut self, indices: &[usize]) -> Result<(), ListError> {
        let mut selection = self.validated_selection(indices)?;
        selection.sort_unstable();
        let copies: Vec<Action> = selection
            .into_iter()
            .map(|index| self.items[index].clone())
            .collect();
        self.items.extend(copies);
        Ok(())
    }

    /// Swap each selected row with the one above it. Rejected as a whole if
    /// the selection contains the top row.
    pub fn move_up(&mut self, indices: &[usize]) -> Result<(), ListError> {
        let mut selection = self.validated_selection(indices)?;
        if selection.contains(&0) {
            return Err(ListError::AtTop);
        }
        selection.sort_unstable();
        for index in selection {
            self.items.swap(index - 1, index);
        }
        Ok(())
    }

    /// Swap each selected row with the one below it. Rejected as a whole if
    /// the selection contains the bottom row.
    pub fn move_down(&mut self, indices: &[usize]) -> Result<(), ListError> {
        let mut selection = self.validated_selection(indices)?;
        let last = self.len() - 1;
        if selection.contains(&last) {
            return Err(ListError::AtBottom);
        }
        selection.sort_unstable_by(|a, b| b.cmp(a));
        for index in selection {
            self.items.swap(index, index + 1);
        }
        Ok(())
    }

    /// Validate an index selection against the current bounds and return it
    /// deduplicated. Nothing is mutated before this succeeds.
    fn validated_selection(&self, indices: &[usize]) -> Result<Vec<usize>, ListError> {
        if indices.is_empty() {
            return Err(ListError::EmptySelection);
        }
        let len = self.len();
        for &index in indices {
            if index >= len {
                return Err(ListError::OutOfRange { index, len });
            }
        }
        let mut selection = indices.to_vec();
        selection.sort_unstable();
        selection.dedup();
        Ok(selection)
    }
}

impl<'a> IntoIterator for &'a ActionList {
    type Item = &'a Action;
    type IntoIter = std::slice::Iter<'a, Action>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Rgb;

    fn row(tag: &str) -> Action {
        Action {
            coordinates: (0, 0),
            color: None,
            judge_color: true,
            click: false,
            delay: false,
            delay_time: 0.0,
            remarks: tag.into(),
        }
    }

    fn list_of(tags: &[&str]) -> ActionList {
        let mut list = ActionList::new();
        for tag in tags {
            list.append(row(tag));
        }
        list
    }

    fn tags(list: &ActionList) -> Vec<String> {
        list.actions().iter().map(|a| a.remarks.clone()).collect()
    }

    #[test]
    fn test_delete_multi_select_descending() {
        let mut list = list_of(&["a", "b", "c", "d"]);
        // Unsorted selection on purpose: order must not matter to the caller.
        list.delete(&[3, 1]).unwrap();
        assert_eq!(tags(&list), ["a", "c"]);
    }

    #[test]
    fn test_delete_out_of_range_rejects_whole_operation() {
        let mut list = list_of(&["a", "b"]);
        let err = list.delete(&[0, 5]).unwrap_err();
        assert_eq!(err, ListError::OutOfRange { index: 5, len: 2 });
        assert_eq!(list.len(), 2);
    }

    #[test]
    fn test_empty_selection_is_rejected() {
        let mut list = list_of(&["a"]);
        assert_eq!(list.delete(&[]).unwrap_err(), ListError::EmptySelection);
        assert_eq!(list.move_up(&[]).unwrap_err(), ListError::EmptySelection);
    }

    #[test]
    fn test_duplicate_appends_independent_copies() {
        let mut list = list_of(&["a", "b"]);
        list.duplicate(&[0]).unwrap();
        assert_eq!(tags(&list), ["a", "b", "a"]);

        // Mutating the copy must not alter the original.
        let mut edited = list.get(2).unwrap().clone();
        edited.remarks = "a-edited".into();
        edited.color = Some(Rgb(9, 9, 9));
        list.replace(2, edited).unwrap();
        assert_eq!(list.get(0).unwrap().remarks, "a");
        assert_eq!(list.get(0).unwrap().color, None);
    }

    #[test]
    fn test_move_up_swaps_with_neighbor() {
        let mut list = list_of(&["a", "b", "c"]);
        list.move_up(&[1, 2]).unwrap();
        assert_eq!(tags(&list), ["b", "c", "a"]);
    }

    #[test]
    fn test_move_up_with_top_row_rejects_unchanged() {
        let mut list = list_of(&["a", "b", "c"]);
        assert_eq!(list.move_up(&[0, 2]).unwrap_err(), ListError::AtTop);
        assert_eq!(tags(&list), ["a", "b", "c"]);
    }

    #[test]
    fn test_move_down_swaps_with_neighbor() {
        let mut list = list_of(&["a", "b", "c"]);
        list.move_down(&[0, 1]).unwrap();
        assert_eq!(tags(&list), ["c", "a", "b"]);
    }

    #[test]
    fn test_move_down_with_bottom_row_rejects_unchanged() {
        let mut list = list_of(&["a", "b", "c"]);
        assert_eq!(list.move_down(&[1, 2]).unwrap_err(), ListError::AtBottom);
        assert_eq!(tags(&list), ["a", "b", "c"]);
    }

    #[test]
    fn test_replace_out_of_range() {
        let mut list = list_of(&["a"]);
        let err = list.replace(3, row("x")).unwrap_err();
        assert_eq!(err, ListError::OutOfRange { index: 3, len: 1 });
    }

    #[test]
    fn test_snapshot_is_detached_from_the_live_list() {
        let mut list = list_of(&["a", "b"]);
        let snapshot = list.snapshot();
        list.delete(&[0]).unwrap();
        assert_eq!(snapshot.len(), 2);
        assert_eq!(list.len(), 1);
    }

    #[test]
    fn test_serializes_as_plain_array() {
        let list = list_of(&["a"]);
        let json = serde_json::to_string(&list).unwrap();
        assert!(json.starts_with('['));
        let back: ActionList = serde_json::from_str(&json).unwrap();
        assert_eq!(list, back);
    }
}
