#![forbid(unsafe_code)]

//! Active-section tracking for the navigation bar.
//!
//! A [`ScrollSpy`] starts with the first section of its list as active and
//! observes every present section element through an [`IntersectionHost`].
//! Whenever an entry reports the element as intersecting the spy band, that
//! section becomes active. When several sections report in one flush, the
//! last callback wins.
//!
//! # Invariants
//!
//! 1. The active id is always one of the ids ever given to the spy, or
//!    `None` when the first list was empty.
//! 2. Replacing the list or detaching disconnects every observer; changing
//!    the list does not reset the active id.
//! 3. Missing elements are skipped; the remaining ones are still tracked.

use tracing::debug;

use crate::intersection::{IntersectionEntry, IntersectionHost, ObserverHandle, ObserverOptions};
use crate::reactive::Observable;

/// Scroll-driven "which section is on screen" tracker.
#[derive(Debug)]
pub struct ScrollSpy {
    sections: Vec<String>,
    options: ObserverOptions,
    active: Observable<Option<String>>,
    tracked: Vec<String>,
    handles: Vec<ObserverHandle>,
}

impl ScrollSpy {
    /// Spy over `section_ids` with the default band and thresholds.
    #[must_use]
    pub fn new<I, S>(section_ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::with_options(section_ids, ObserverOptions::scroll_spy())
    }

    #[must_use]
    pub fn with_options<I, S>(section_ids: I, options: ObserverOptions) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let sections: Vec<String> = section_ids.into_iter().map(Into::into).collect();
        let initial = sections.first().cloned();
        Self {
            sections,
            options,
            active: Observable::new(initial),
            tracked: Vec::new(),
            handles: Vec::new(),
        }
    }

    /// Observe every present section. Replaces earlier observations.
    ///
    /// Returns the number of sections now tracked.
    pub fn attach(&mut self, host: &dyn IntersectionHost) -> usize {
        self.detach();
        if !host.is_supported() {
            debug!(target: "folio.viewport", "intersection observation unsupported, spy stays static");
            return 0;
        }
        for id in &self.sections {
            let active = self.active.clone();
            let callback = Box::new(move |entries: &[IntersectionEntry]| {
                for entry in entries.iter().filter(|e| e.is_intersecting) {
                    active.set(Some(entry.target_id.clone()));
                }
            });
            match host.observe(id, &self.options, callback) {
                Some(handle) => {
                    self.tracked.push(id.clone());
                    self.handles.push(handle);
                }
                None => debug!(target: "folio.viewport", section = %id, "section element missing, skipped"),
            }
        }
        self.tracked.len()
    }

    /// Swap the section list and re-observe; the active id is kept.
    pub fn set_sections<I, S>(&mut self, host: &dyn IntersectionHost, section_ids: I) -> usize
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.detach();
        self.sections = section_ids.into_iter().map(Into::into).collect();
        self.attach(host)
    }

    /// Disconnect every observer.
    pub fn detach(&mut self) {
        self.handles.clear();
        self.tracked.clear();
    }

    #[must_use]
    pub fn active(&self) -> Option<String> {
        self.active.get()
    }

    #[must_use]
    pub fn is_active(&self, section_id: &str) -> bool {
        self.active.with(|a| a.as_deref() == Some(section_id))
    }

    /// Shared handle for subscribing to active-id changes.
    #[must_use]
    pub fn active_observable(&self) -> Observable<Option<String>> {
        self.active.clone()
    }

    #[must_use]
    pub fn sections(&self) -> &[String] {
        &self.sections
    }

    /// Sections with a live observer.
    #[must_use]
    pub fn tracked(&self) -> &[String] {
        &self.tracked
    }
}
