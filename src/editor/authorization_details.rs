use std::collections::HashMap;

use serde_json::Value as Json;

use crate::core::authorization_detail::{AuthorizationDetailEntry, AuthorizationDetails};
use crate::core::codec::DecodeWarning;
use crate::core::reconciler::{QuerySink, StateReconciler};
use crate::utils::{format_csv, parse_csv};

/// The list-valued entry fields edited through a comma-separated text buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ListField {
    Types,
    Locations,
}

/// Editor for the `authorization_details` query parameter.
///
/// Wraps a [StateReconciler] with the volatile per-render state the hosting
/// form needs: the currently expanded entry and the uncommitted text of the
/// comma-separated list fields. Every committed edit is re-encoded against
/// the latest known query string and pushed through the [QuerySink].
#[derive(Debug)]
pub struct AuthorizationDetailsEditor {
    reconciler: StateReconciler<AuthorizationDetails>,
    expanded: Option<usize>,
    list_buffers: HashMap<(usize, ListField), String>,
}

impl AuthorizationDetailsEditor {
    pub fn new(query: &str) -> Self {
        Self {
            reconciler: StateReconciler::new(query),
            expanded: None,
            list_buffers: HashMap::new(),
        }
    }

    /// Observe an external change to the query string. When the state is
    /// re-derived, stale text buffers are discarded and the selection pointer
    /// is clamped to the new entry count.
    pub fn sync(&mut self, query: &str) {
        if self.reconciler.external_change(query) {
            self.list_buffers.clear();
            if self
                .expanded
                .is_some_and(|i| i >= self.reconciler.state().len())
            {
                self.expanded = None;
            }
        }
    }

    pub fn entries(&self) -> &[AuthorizationDetailEntry] {
        self.reconciler.state().entries()
    }

    pub fn warning(&self) -> Option<&DecodeWarning> {
        self.reconciler.warning()
    }

    pub fn expanded(&self) -> Option<usize> {
        self.expanded
    }

    pub fn set_expanded(&mut self, index: Option<usize>) {
        self.expanded = index.filter(|i| *i < self.entries().len());
    }

    /// Append a fresh `{"type": "openid_credential"}` entry.
    pub fn add_entry(&mut self, sink: &mut impl QuerySink) {
        self.reconciler.local_edit(
            |mut details| {
                details.0.push(AuthorizationDetailEntry::new());
                details
            },
            sink,
        );
    }

    /// Remove the entry at `index`. The selection pointer is cleared when it
    /// pointed at the removed entry and decremented when it pointed past it;
    /// buffered list text shifts along with the entries.
    pub fn remove_entry(&mut self, index: usize, sink: &mut impl QuerySink) {
        if index >= self.entries().len() {
            return;
        }
        self.reconciler.local_edit(
            |mut details| {
                details.0.remove(index);
                details
            },
            sink,
        );
        self.expanded = match self.expanded {
            Some(i) if i == index => None,
            Some(i) if i > index => Some(i - 1),
            other => other,
        };
        let buffers = std::mem::take(&mut self.list_buffers);
        self.list_buffers = buffers
            .into_iter()
            .filter_map(|((i, field), text)| match i.cmp(&index) {
                std::cmp::Ordering::Less => Some(((i, field), text)),
                std::cmp::Ordering::Equal => None,
                std::cmp::Ordering::Greater => Some(((i - 1, field), text)),
            })
            .collect();
    }

    pub fn set_detail_type(&mut self, index: usize, text: &str, sink: &mut impl QuerySink) {
        self.edit_entry(index, |entry| entry.set_detail_type(text), sink);
    }

    pub fn set_credential_configuration_id(
        &mut self,
        index: usize,
        text: &str,
        sink: &mut impl QuerySink,
    ) {
        self.edit_entry(
            index,
            |entry| entry.set_credential_configuration_id(text),
            sink,
        );
    }

    pub fn set_format(&mut self, index: usize, text: &str, sink: &mut impl QuerySink) {
        self.edit_entry(index, |entry| entry.set_format(text), sink);
    }

    /// The text shown for a list field: the uncommitted buffer when one
    /// exists, otherwise the committed list.
    pub fn list_text(&self, index: usize, field: ListField) -> String {
        if let Some(buffer) = self.list_buffers.get(&(index, field)) {
            return buffer.clone();
        }
        let committed = self.entries().get(index).and_then(|entry| match field {
            ListField::Types => entry.types(),
            ListField::Locations => entry.locations(),
        });
        committed.map(|items| format_csv(&items)).unwrap_or_default()
    }

    /// Update only the text buffer. Typing a comma mid-keystroke never
    /// reparses the committed list.
    pub fn edit_list_text(&mut self, index: usize, field: ListField, text: &str) {
        if index >= self.entries().len() {
            return;
        }
        self.list_buffers.insert((index, field), text.to_owned());
    }

    /// Commit the buffered text (on blur or an explicit confirmation): split
    /// on comma, trim, drop empties. An empty result deletes the field.
    pub fn commit_list(&mut self, index: usize, field: ListField, sink: &mut impl QuerySink) {
        let Some(text) = self.list_buffers.remove(&(index, field)) else {
            return;
        };
        let items = parse_csv(&text);
        self.edit_entry(
            index,
            |entry| match field {
                ListField::Types => entry.set_types(items),
                ListField::Locations => entry.set_locations(items),
            },
            sink,
        );
    }

    /// Add a custom field to the entry. Duplicate or empty keys are rejected
    /// and the entry is left unchanged.
    pub fn add_custom_field(
        &mut self,
        index: usize,
        key: &str,
        sink: &mut impl QuerySink,
    ) -> bool {
        let Some(entry) = self.entries().get(index) else {
            return false;
        };
        // Probe on a copy first so a rejected add does not emit a no-op edit.
        let mut probe = entry.clone();
        if !probe.add_custom_field(key) {
            return false;
        }
        self.edit_entry(
            index,
            |entry| {
                entry.add_custom_field(key);
            },
            sink,
        );
        true
    }

    pub fn set_custom_field(
        &mut self,
        index: usize,
        key: &str,
        text: &str,
        sink: &mut impl QuerySink,
    ) {
        self.edit_entry(index, |entry| entry.set_custom_field(key, text), sink);
    }

    pub fn remove_custom_field(&mut self, index: usize, key: &str, sink: &mut impl QuerySink) {
        self.edit_entry(index, |entry| entry.remove_custom_field(key), sink);
    }

    pub fn custom_fields(&self, index: usize) -> Vec<(String, Json)> {
        self.entries()
            .get(index)
            .map(|entry| {
                entry
                    .custom_fields()
                    .map(|(k, v)| (k.to_owned(), v.clone()))
                    .collect()
            })
            .unwrap_or_default()
    }

    fn edit_entry<F>(&mut self, index: usize, edit: F, sink: &mut impl QuerySink)
    where
        F: FnOnce(&mut AuthorizationDetailEntry),
    {
        if index >= self.entries().len() {
            return;
        }
        self.reconciler.local_edit(
            |mut details| {
                if let Some(entry) = details.0.get_mut(index) {
                    edit(entry);
                }
                details
            },
            sink,
        );
    }
}
