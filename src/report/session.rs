use tracing::{debug, warn};

use super::{FetchError, RecordSource, form_type_choices, group_by_form_type};
use crate::model::{DateWindow, FormFilter, FormGroup, RawRecord};

/// The groups one report render works on.
#[derive(Debug, Clone)]
pub struct Selection {
    pub window: DateWindow,
    pub filter: FormFilter,
    /// Every form type in the fetched window, for the selection list.
    pub form_types: Vec<String>,
    pub groups: Vec<FormGroup>,
}

#[derive(Debug)]
struct CachedFetch {
    window: DateWindow,
    records: Vec<RawRecord>,
}

/// Keeps the last fetch so the report can be re-filtered by form type
/// without querying again. Only a new `fetch` or `invalidate` replaces it.
pub struct ReportSession<S> {
    source: S,
    cache: Option<CachedFetch>,
}

impl<S: RecordSource> ReportSession<S> {
    pub fn new(source: S) -> Self {
        Self {
            source,
            cache: None,
        }
    }

    /// Queries the source and replaces the cache. A failed fetch caches an
    /// empty record set for the window and hands the error back for display.
    pub fn fetch(&mut self, window: DateWindow) -> Result<&[RawRecord], FetchError> {
        self.invalidate();
        let (records, outcome) = match self.source.fetch(&window) {
            Ok(records) => (records, Ok(())),
            Err(err) => {
                warn!(window = %window.label(), error = %err, "fetch failed; caching empty result");
                (Vec::new(), Err(err))
            }
        };

        let cached: &CachedFetch = self.cache.insert(CachedFetch { window, records });
        outcome.map(|()| cached.records.as_slice())
    }

    pub fn get_or_fetch(&mut self, window: DateWindow) -> Result<&[RawRecord], FetchError> {
        if self.cached(&window).is_none() {
            return self.fetch(window);
        }
        debug!(window = %window.label(), "reusing cached fetch");
        Ok(self.records())
    }

    pub fn cached(&self, window: &DateWindow) -> Option<&[RawRecord]> {
        self.cache
            .as_ref()
            .filter(|cached| cached.window == *window)
            .map(|cached| cached.records.as_slice())
    }

    pub fn invalidate(&mut self) {
        self.cache = None;
    }

    pub fn records(&self) -> &[RawRecord] {
        self.cache
            .as_ref()
            .map(|cached| cached.records.as_slice())
            .unwrap_or(&[])
    }

    /// Regroups the cached records and keeps the groups the filter selects.
    /// `None` when nothing has been fetched yet.
    pub fn select(&self, filter: &FormFilter) -> Option<Selection> {
        let cached = self.cache.as_ref()?;
        let groups = group_by_form_type(cached.records.iter().cloned());
        let form_types = form_type_choices(&groups);
        let groups = groups
            .into_values()
            .filter(|group| !group.is_empty() && filter.matches(group.form_type()))
            .collect();

        Some(Selection {
            window: cached.window,
            filter: filter.clone(),
            form_types,
            groups,
        })
    }
}
