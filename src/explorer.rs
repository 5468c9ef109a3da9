//! The map explorer: wires user events to the filter engine, the selection
//! controller and the data orchestrator.
//!
//! All methods run on one event context. Background fetch results are only
//! applied by [`Explorer::pump`] / [`Explorer::wait_idle`].

use crate::directory::{CountryDirectory, Region};
use crate::element::{Palette, VisualElement};
use crate::filter::{FilterState, VisualOutcome, apply_outcomes, compute_outcomes};
use crate::models::CountryCode;
use crate::orchestrator::{DataOrchestrator, DataState};
use crate::selection::{Restored, Selection, SelectionController};
use crate::store::PersistenceStore;
use std::sync::Arc;
use std::time::Duration;

pub struct Explorer<E: VisualElement> {
    elements: Vec<E>,
    directory: CountryDirectory,
    palette: Palette,
    filter: FilterState,
    outcomes: Vec<VisualOutcome>,
    matches: usize,
    selection: SelectionController,
    orchestrator: DataOrchestrator,
}

impl<E: VisualElement> Explorer<E> {
    /// Build over the shapes of a loaded map and paint the initial state.
    pub fn new(
        elements: Vec<E>,
        directory: CountryDirectory,
        store: Arc<PersistenceStore>,
        orchestrator: DataOrchestrator,
        palette: Palette,
    ) -> Self {
        let mut explorer = Self {
            elements,
            directory,
            palette,
            filter: FilterState::default(),
            outcomes: Vec::new(),
            matches: 0,
            selection: SelectionController::new(store, palette),
            orchestrator,
        };
        explorer.refresh_filters();
        explorer
    }

    pub fn elements(&self) -> &[E] {
        &self.elements
    }

    pub fn directory(&self) -> &CountryDirectory {
        &self.directory
    }

    pub fn filter(&self) -> &FilterState {
        &self.filter
    }

    pub fn selection(&self) -> &Selection {
        self.selection.selection()
    }

    pub fn data(&self) -> &DataState {
        self.orchestrator.state()
    }

    pub fn orchestrator_mut(&mut self) -> &mut DataOrchestrator {
        &mut self.orchestrator
    }

    /// Outcome of the last filter pass, one per element.
    pub fn outcomes(&self) -> &[VisualOutcome] {
        &self.outcomes
    }

    /// Number of shapes passing the current filter.
    pub fn match_count(&self) -> usize {
        self.matches
    }

    /// Codes of the shapes passing the current filter, in map order.
    pub fn matching_codes(&self) -> Vec<CountryCode> {
        self.elements
            .iter()
            .filter(|el| self.filter.matches(el.identifier().as_ref(), &self.directory))
            .filter_map(|el| el.identifier())
            .collect()
    }

    pub fn find_element(&self, code: &CountryCode) -> Option<usize> {
        self.elements
            .iter()
            .position(|el| el.identifier().as_ref() == Some(code))
    }

    pub fn on_search_change(&mut self, query: &str) {
        self.filter.set_query(query);
        self.refresh_filters();
    }

    pub fn on_region_change(&mut self, region: Option<Region>) {
        self.filter.set_region(region);
        self.refresh_filters();
    }

    /// Reset query and region.
    pub fn clear_filters(&mut self) {
        self.filter.clear();
        self.refresh_filters();
    }

    /// Recompute and repaint every shape.
    pub fn refresh_filters(&mut self) {
        let out = compute_outcomes(
            &self.elements,
            &self.filter,
            &self.directory,
            self.selection.selection(),
            &self.palette,
        );
        apply_outcomes(&mut self.elements, &out.outcomes, &self.palette);
        self.outcomes = out.outcomes;
        self.matches = out.matches;
    }

    fn is_interactive(&self, index: usize) -> bool {
        self.outcomes
            .get(index)
            .is_none_or(VisualOutcome::is_interactive)
    }

    /// Click on the shape at `index`. Dimmed shapes do not receive clicks.
    pub fn click(&mut self, index: usize) -> Option<CountryCode> {
        if !self.is_interactive(index) {
            return None;
        }
        let prev = self.selection.selection().element();
        let code = self
            .selection
            .click(&mut self.elements, index, &mut self.orchestrator)?;
        self.sync_outcome(prev);
        self.sync_outcome(Some(index));
        Some(code)
    }

    /// Click on the shape carrying `code`, if the map has one.
    pub fn click_code(&mut self, code: &CountryCode) -> Option<CountryCode> {
        let index = self.find_element(code)?;
        self.click(index)
    }

    /// Keep the cached outcome of `index` in line with the selection after a click.
    fn sync_outcome(&mut self, index: Option<usize>) {
        let Some(i) = index else { return };
        let is_selected = self.selection.selection().is_element(i);
        if let Some(o) = self.outcomes.get_mut(i) {
            match (*o, is_selected) {
                (_, true) => *o = VisualOutcome::Selected,
                (VisualOutcome::Selected, false) => {
                    // previous selection repainted to default by the controller
                    *o = VisualOutcome::Default;
                }
                _ => {}
            }
        }
    }

    pub fn pointer_enter(&mut self, index: usize) {
        if self.is_interactive(index) {
            self.selection.pointer_enter(&mut self.elements, index);
        }
    }

    pub fn pointer_leave(&mut self, index: usize) {
        if self.is_interactive(index) {
            self.selection.pointer_leave(&mut self.elements, index);
        }
    }

    /// Drop the selection and its data. Filters survive unless `reset_filters`.
    pub fn clear(&mut self, reset_filters: bool) {
        self.selection
            .clear(&mut self.elements, &mut self.orchestrator);
        if reset_filters {
            self.filter.clear();
        }
        self.refresh_filters();
    }

    /// Restore the persisted selection; call once before any user event.
    pub fn restore_from_persistence(&mut self) -> Restored {
        let restored = self
            .selection
            .restore_from_persistence(&mut self.elements, &mut self.orchestrator);
        self.refresh_filters();
        restored
    }

    /// Retry the last persisted selection after a profile failure.
    pub fn retry(&mut self) -> Option<u64> {
        self.orchestrator.retry()
    }

    /// Apply completed fetches.
    pub fn pump(&mut self) -> usize {
        self.orchestrator.pump()
    }

    pub fn wait_idle(&mut self, timeout: Duration) -> bool {
        self.orchestrator.wait_idle(timeout)
    }
}
