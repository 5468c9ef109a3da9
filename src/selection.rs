//! Single-selection state machine and its visual and storage side effects.

use crate::element::{Palette, VisualElement};
use crate::models::{CountryCode, CountryProfile};
use crate::orchestrator::DataOrchestrator;
use crate::store::{Lookup, PROFILE_KEY, PersistenceStore, SELECTED_CODE_KEY};
use std::sync::Arc;

/// At most one selected country, with the index of its shape.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Selection {
    #[default]
    Unselected,
    Selected { code: CountryCode, element: usize },
}

impl Selection {
    pub fn code(&self) -> Option<&CountryCode> {
        match self {
            Selection::Selected { code, .. } => Some(code),
            Selection::Unselected => None,
        }
    }

    pub fn element(&self) -> Option<usize> {
        match self {
            Selection::Selected { element, .. } => Some(*element),
            Selection::Unselected => None,
        }
    }

    pub fn is_element(&self, index: usize) -> bool {
        self.element() == Some(index)
    }
}

/// Result of [`SelectionController::restore_from_persistence`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Restored {
    /// Nothing usable was stored.
    Nothing,
    /// The stored profile had expired; both keys were removed.
    Expired,
    /// The stored code has no shape on this map.
    NoSuchElement(CountryCode),
    /// Selection restored, with the cached profile when still valid.
    Selected {
        code: CountryCode,
        profile: Option<CountryProfile>,
    },
}

/// Owns the [`Selection`] and keeps the selected shape painted.
#[derive(Debug)]
pub struct SelectionController {
    selection: Selection,
    palette: Palette,
    store: Arc<PersistenceStore>,
}

impl SelectionController {
    pub fn new(store: Arc<PersistenceStore>, palette: Palette) -> Self {
        Self {
            selection: Selection::Unselected,
            palette,
            store,
        }
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    /// Select the shape at `index`, persist its code and start loading its data.
    ///
    /// Shapes without an identifier (or out of range) are ignored. Returns
    /// the newly selected code.
    pub fn click<E: VisualElement>(
        &mut self,
        elements: &mut [E],
        index: usize,
        orchestrator: &mut DataOrchestrator,
    ) -> Option<CountryCode> {
        let code = elements.get(index)?.identifier()?;

        if let Some(prev) = self.selection.element()
            && prev != index
            && let Some(el) = elements.get_mut(prev)
        {
            el.set_fill_color(self.palette.default);
        }

        self.selection = Selection::Selected {
            code: code.clone(),
            element: index,
        };
        elements[index].set_fill_color(self.palette.selected);
        log::info!("country selected: {code}");

        // the cached profile always belongs to the stored code
        if self.store.get_raw(SELECTED_CODE_KEY).as_deref() != Some(code.as_str())
            && let Err(e) = self.store.remove(PROFILE_KEY)
        {
            log::warn!("error removing {PROFILE_KEY:?}: {e}");
        }
        if let Err(e) = self.store.set_raw(SELECTED_CODE_KEY, code.as_str()) {
            log::error!("error saving selected country: {e}");
        }
        orchestrator.load_country_data(code.clone());
        Some(code)
    }

    /// Drop the selection, its data and its persisted keys.
    ///
    /// Filters are untouched; the caller re-runs the filter pass.
    pub fn clear<E: VisualElement>(
        &mut self,
        elements: &mut [E],
        orchestrator: &mut DataOrchestrator,
    ) {
        if let Some(el) = self.selection.element().and_then(|i| elements.get_mut(i)) {
            el.set_fill_color(self.palette.default);
        }
        self.selection = Selection::Unselected;
        orchestrator.reset();
        for key in [PROFILE_KEY, SELECTED_CODE_KEY] {
            if let Err(e) = self.store.remove(key) {
                log::warn!("error removing {key:?}: {e}");
            }
        }
    }

    /// Re-select the persisted country without fetching anything.
    ///
    /// An expired profile invalidates the whole stored selection. A missing
    /// profile keeps the selection but shows no data until reselected.
    pub fn restore_from_persistence<E: VisualElement>(
        &mut self,
        elements: &mut [E],
        orchestrator: &mut DataOrchestrator,
    ) -> Restored {
        let profile = match self.store.lookup::<CountryProfile>(PROFILE_KEY) {
            Lookup::Fresh(p) => Some(p),
            Lookup::Expired => {
                if let Err(e) = self.store.remove(SELECTED_CODE_KEY) {
                    log::warn!("error removing {SELECTED_CODE_KEY:?}: {e}");
                }
                return Restored::Expired;
            }
            Lookup::Missing | Lookup::Corrupt => None,
        };

        let Some(raw) = self.store.get_raw(SELECTED_CODE_KEY) else {
            return Restored::Nothing;
        };
        let code = match CountryCode::parse(&raw) {
            Ok(c) => c,
            Err(e) => {
                log::warn!("evicting stored selection: {e}");
                if let Err(e) = self.store.remove(SELECTED_CODE_KEY) {
                    log::warn!("error removing {SELECTED_CODE_KEY:?}: {e}");
                }
                return Restored::Nothing;
            }
        };

        let Some(index) = elements
            .iter()
            .position(|el| el.identifier().as_ref() == Some(&code))
        else {
            return Restored::NoSuchElement(code);
        };

        elements[index].set_fill_color(self.palette.selected);
        self.selection = Selection::Selected {
            code: code.clone(),
            element: index,
        };
        if let Some(p) = &profile {
            log::info!("loaded saved country: {}", p.name);
            orchestrator.restore_cached(code.clone(), p.clone());
        }
        Restored::Selected { code, profile }
    }

    /// Pointer entered a shape: hover color unless it is the selection.
    pub fn pointer_enter<E: VisualElement>(&self, elements: &mut [E], index: usize) {
        if !self.selection.is_element(index)
            && let Some(el) = elements.get_mut(index)
        {
            el.set_fill_color(self.palette.hover);
        }
    }

    /// Pointer left a shape: default color unless it is the selection.
    pub fn pointer_leave<E: VisualElement>(&self, elements: &mut [E], index: usize) {
        if !self.selection.is_element(index)
            && let Some(el) = elements.get_mut(index)
        {
            el.set_fill_color(self.palette.default);
        }
    }
}
