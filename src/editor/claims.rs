use std::collections::HashMap;

use serde_json::Value as Json;

use crate::core::claims::{ClaimSpec, ClaimsDocument, Section, ValueMode};
use crate::core::codec::DecodeWarning;
use crate::core::reconciler::{QuerySink, StateReconciler};
use crate::utils::{format_csv, parse_csv};

/// Editor for the OpenID Connect `claims` query parameter.
///
/// Wraps a [StateReconciler] with two pieces of volatile state: the last
/// non-null constraint form of each claim (so the null toggle is reversible)
/// and the uncommitted comma-separated text of multi-value claims.
#[derive(Debug)]
pub struct ClaimsEditor {
    reconciler: StateReconciler<ClaimsDocument>,
    restore: HashMap<(Section, String), ClaimSpec>,
    values_buffers: HashMap<(Section, String), String>,
}

impl ClaimsEditor {
    pub fn new(query: &str) -> Self {
        Self {
            reconciler: StateReconciler::new(query),
            restore: HashMap::new(),
            values_buffers: HashMap::new(),
        }
    }

    /// Observe an external change to the query string. When the document was
    /// re-derived, all volatile state is discarded: uncommitted text buffers
    /// and the null-toggle restore cache both describe claims of a document
    /// the host has since replaced.
    pub fn sync(&mut self, query: &str) {
        if self.reconciler.external_change(query) {
            self.values_buffers.clear();
            self.restore.clear();
        }
    }

    pub fn document(&self) -> &ClaimsDocument {
        self.reconciler.state()
    }

    pub fn warning(&self) -> Option<&DecodeWarning> {
        self.reconciler.warning()
    }

    /// Add a claim with an empty constraint object. Empty and duplicate
    /// names are rejected, leaving the document unchanged.
    pub fn add_claim(&mut self, section: Section, name: &str, sink: &mut impl QuerySink) -> bool {
        let name = name.trim();
        if name.is_empty() || self.document().claim(section, name).is_some() {
            tracing::debug!(%section, name, "rejected claim");
            return false;
        }
        self.reconciler.local_edit(
            |mut doc| {
                doc.section_mut(section)
                    .insert(name.to_owned(), ClaimSpec::empty());
                doc
            },
            sink,
        );
        true
    }

    /// Remove a claim. When this was the last claim of the last non-empty
    /// section, the `claims` parameter disappears from the query string.
    pub fn remove_claim(&mut self, section: Section, name: &str, sink: &mut impl QuerySink) {
        if self.document().claim(section, name).is_none() {
            return;
        }
        self.reconciler.local_edit(
            |mut doc| {
                doc.section_mut(section).remove(name);
                doc
            },
            sink,
        );
        self.restore.remove(&(section, name.to_owned()));
        self.values_buffers.remove(&(section, name.to_owned()));
    }

    /// Toggle the "request as null" marker. Toggling on caches the current
    /// constraint form; toggling back restores it instead of discarding the
    /// field values the user had entered.
    pub fn set_null(&mut self, section: Section, name: &str, null: bool, sink: &mut impl QuerySink) {
        let Some(current) = self.document().claim(section, name).cloned() else {
            return;
        };
        if null == current.is_null() {
            return;
        }
        let replacement = if null {
            self.restore.insert((section, name.to_owned()), current);
            ClaimSpec::Null
        } else {
            self.restore
                .remove(&(section, name.to_owned()))
                .unwrap_or_else(ClaimSpec::empty)
        };
        self.reconciler.local_edit(
            |mut doc| {
                if let Some(claim) = doc.claim_mut(section, name) {
                    *claim = replacement;
                }
                doc
            },
            sink,
        );
    }

    pub fn set_essential(
        &mut self,
        section: Section,
        name: &str,
        essential: bool,
        sink: &mut impl QuerySink,
    ) {
        self.edit_claim(section, name, |claim| claim.set_essential(essential), sink);
    }

    pub fn set_mode(
        &mut self,
        section: Section,
        name: &str,
        mode: ValueMode,
        sink: &mut impl QuerySink,
    ) {
        self.edit_claim(section, name, |claim| claim.set_mode(mode), sink);
    }

    pub fn set_scalar(
        &mut self,
        section: Section,
        name: &str,
        text: &str,
        sink: &mut impl QuerySink,
    ) {
        self.edit_claim(section, name, |claim| claim.set_scalar(text), sink);
    }

    /// The text shown for a multi-value claim: the uncommitted buffer when
    /// one exists, otherwise the committed values.
    pub fn values_text(&self, section: Section, name: &str) -> String {
        if let Some(buffer) = self.values_buffers.get(&(section, name.to_owned())) {
            return buffer.clone();
        }
        self.document()
            .claim(section, name)
            .and_then(ClaimSpec::requested_values)
            .map(|values| format_csv(&values.into_vec()))
            .unwrap_or_default()
    }

    /// Update only the text buffer; the committed values are untouched.
    pub fn edit_values_text(&mut self, section: Section, name: &str, text: &str) {
        if self.document().claim(section, name).is_none() {
            return;
        }
        self.values_buffers
            .insert((section, name.to_owned()), text.to_owned());
    }

    /// Commit the buffered values text: split on comma, trim, drop empties.
    /// An empty result deletes the `values` key.
    pub fn commit_values(&mut self, section: Section, name: &str, sink: &mut impl QuerySink) {
        let Some(text) = self.values_buffers.remove(&(section, name.to_owned())) else {
            return;
        };
        let items = parse_csv(&text);
        self.edit_claim(section, name, |claim| claim.set_values(items), sink);
    }

    /// Add a custom field to a claim's constraint object. Duplicate or empty
    /// keys are rejected, as are edits to a null claim.
    pub fn add_claim_field(
        &mut self,
        section: Section,
        name: &str,
        key: &str,
        sink: &mut impl QuerySink,
    ) -> bool {
        let Some(claim) = self.document().claim(section, name) else {
            return false;
        };
        // Probe on a copy first so a rejected add does not emit a no-op edit.
        let mut probe = claim.clone();
        if !probe.add_custom_field(key) {
            return false;
        }
        self.edit_claim(
            section,
            name,
            |claim| {
                claim.add_custom_field(key);
            },
            sink,
        );
        true
    }

    pub fn set_claim_field(
        &mut self,
        section: Section,
        name: &str,
        key: &str,
        text: &str,
        sink: &mut impl QuerySink,
    ) {
        self.edit_claim(section, name, |claim| claim.set_custom_field(key, text), sink);
    }

    pub fn remove_claim_field(
        &mut self,
        section: Section,
        name: &str,
        key: &str,
        sink: &mut impl QuerySink,
    ) {
        self.edit_claim(section, name, |claim| claim.remove_custom_field(key), sink);
    }

    pub fn claim_fields(&self, section: Section, name: &str) -> Vec<(String, Json)> {
        self.document()
            .claim(section, name)
            .map(|claim| {
                claim
                    .custom_fields()
                    .map(|(k, v)| (k.to_owned(), v.clone()))
                    .collect()
            })
            .unwrap_or_default()
    }

    fn edit_claim<F>(&mut self, section: Section, name: &str, edit: F, sink: &mut impl QuerySink)
    where
        F: FnOnce(&mut ClaimSpec),
    {
        if self.document().claim(section, name).is_none() {
            return;
        }
        self.reconciler.local_edit(
            |mut doc| {
                if let Some(claim) = doc.claim_mut(section, name) {
                    edit(claim);
                }
                doc
            },
            sink,
        );
    }
}
