use super::codec::{self, DecodeWarning, ParamValue};
use super::query::QueryString;

/// Receiver for query strings produced by committed local edits.
///
/// A trait is used here so hosts can plug in whatever owns the canonical
/// query string; any `FnMut(&str, &str)` closure works.
pub trait QuerySink {
    /// Called with the parameter name that changed and the full new query string.
    fn handle_change(&mut self, param: &str, query: &str);
}

impl<F: FnMut(&str, &str)> QuerySink for F {
    fn handle_change(&mut self, param: &str, query: &str) {
        self(param, query)
    }
}

/// Synchronization state of a [StateReconciler].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncState {
    /// In-memory state matches the last externally observed query string.
    Synced,
    /// A local edit has been emitted and is awaiting external confirmation.
    Editing,
}

/// Keeps an editable decoded value synchronized with an externally owned
/// query string.
///
/// The reconciler never owns canonical state: it re-derives its value
/// whenever the external query string genuinely changes, and re-encodes
/// against the most recently known base on every local edit so that rapid
/// successive edits compose instead of overwriting each other.
#[derive(Debug, Clone)]
pub struct StateReconciler<T: ParamValue> {
    state: T,
    base: QueryString,
    base_raw: String,
    sync: SyncState,
    warning: Option<DecodeWarning>,
}

impl<T: ParamValue> StateReconciler<T> {
    pub fn new(query: &str) -> Self {
        let (base, parse_warning) = parse_base::<T>(query);
        let (state, decode_warning) = codec::decode(&base);
        Self {
            state,
            base,
            base_raw: query.to_owned(),
            sync: SyncState::Synced,
            warning: parse_warning.or(decode_warning),
        }
    }

    pub fn state(&self) -> &T {
        &self.state
    }

    pub fn sync_state(&self) -> SyncState {
        self.sync
    }

    /// The warning from the most recent decode, if it fell back to the empty
    /// default.
    pub fn warning(&self) -> Option<&DecodeWarning> {
        self.warning.as_ref()
    }

    /// Observe the externally owned query string.
    ///
    /// A string identical to the reconciler's own last-pushed value only
    /// confirms the edit and must not re-decode, otherwise it could race a
    /// newer local edit. Returns whether the state was re-derived.
    pub fn external_change(&mut self, query: &str) -> bool {
        if query == self.base_raw {
            self.sync = SyncState::Synced;
            return false;
        }
        let (base, parse_warning) = parse_base::<T>(query);
        let (state, decode_warning) = codec::decode(&base);
        self.base = base;
        self.base_raw = query.to_owned();
        self.state = state;
        self.warning = parse_warning.or(decode_warning);
        self.sync = SyncState::Synced;
        true
    }

    /// Apply `update` to a copy of the current state, re-encode against the
    /// latest known base, and emit the new query string through `sink`.
    pub fn local_edit<F>(&mut self, update: F, sink: &mut impl QuerySink)
    where
        F: FnOnce(T) -> T,
    {
        let next = update(self.state.clone());
        let encoded = codec::encode(&self.base, &next);
        let raw = encoded.to_string();
        self.state = next;
        self.base = encoded;
        self.base_raw = raw;
        self.sync = SyncState::Editing;
        sink.handle_change(T::PARAM, &self.base_raw);
    }
}

/// Parse the raw query string, falling back to an empty query (with a
/// warning) when it is not valid urlencoded text.
fn parse_base<T: ParamValue>(query: &str) -> (QueryString, Option<DecodeWarning>) {
    match query.parse() {
        Ok(base) => (base, None),
        Err(e) => {
            tracing::warn!(param = T::PARAM, error = %e, "unparseable query string");
            (
                QueryString::default(),
                Some(DecodeWarning::new(T::PARAM, e.to_string())),
            )
        }
    }
}
