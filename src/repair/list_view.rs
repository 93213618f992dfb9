//! Action list view state: visible cards, selection marks, reflow debounce

use std::time::{Duration, Instant};

use super::catalog::{ActionDefinition, Catalog};

/// Resize events closer together than this collapse into one reflow
pub const REFLOW_DEBOUNCE: Duration = Duration::from_millis(50);

/// Narrowest wrap width for card descriptions
pub const MIN_WRAP_WIDTH: f32 = 180.0;

/// Width used until the first layout pass reports a real one
pub const DEFAULT_ROW_WIDTH: f32 = 496.0;

/// Events emitted by the list view
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ListEvent {
    Selected(&'static str),
}

/// One visible card
#[derive(Clone, Debug)]
pub struct ActionRow {
    pub action: &'static ActionDefinition,
    pub selected: bool,
}

pub struct ActionListView {
    rows: Vec<ActionRow>,
    row_width: f32,
    pending_width: Option<(f32, Instant)>,
}

impl ActionListView {
    pub fn new() -> Self {
        Self {
            rows: Vec::new(),
            row_width: DEFAULT_ROW_WIDTH,
            pending_width: None,
        }
    }

    /// Rebuild the visible rows for a category and re-apply the highlight
    pub fn render(&mut self, catalog: &Catalog, category: &str, selection: Option<&str>) {
        self.rows = catalog
            .filter(category)
            .into_iter()
            .map(|action| ActionRow {
                action,
                selected: selection == Some(action.key),
            })
            .collect();
    }

    pub fn rows(&self) -> &[ActionRow] {
        &self.rows
    }

    /// A card was clicked
    pub fn activate(&self, key: &'static str) -> ListEvent {
        ListEvent::Selected(key)
    }

    /// Mark exactly one row, clearing any previous mark
    pub fn mark_selected(&mut self, key: Option<&str>) {
        for row in &mut self.rows {
            row.selected = Some(row.action.key) == key;
        }
    }

    #[cfg(test)]
    pub fn selected_keys(&self) -> Vec<&'static str> {
        self.rows
            .iter()
            .filter(|r| r.selected)
            .map(|r| r.action.key)
            .collect()
    }

    /// Record a container width change; the reflow happens in `poll`
    pub fn on_resize(&mut self, width: f32, now: Instant) {
        // the window reports its width every frame; only changes restart the timer
        let current = self.pending_width.map_or(self.row_width, |(w, _)| w);
        if (width - current).abs() < 0.5 {
            return;
        }
        self.pending_width = Some((width, now));
    }

    /// Apply the last recorded width once the debounce window is quiet.
    ///
    /// Returns the new row width when a reflow happened.
    pub fn poll(&mut self, now: Instant) -> Option<f32> {
        let (width, at) = self.pending_width?;
        if now.duration_since(at) < REFLOW_DEBOUNCE {
            return None;
        }
        self.pending_width = None;
        self.row_width = width;
        Some(width)
    }

    /// Time left until a pending reflow is due
    pub fn reflow_due_in(&self, now: Instant) -> Option<Duration> {
        self.pending_width
            .map(|(_, at)| REFLOW_DEBOUNCE.saturating_sub(now.duration_since(at)))
    }

    pub fn row_width(&self) -> f32 {
        self.row_width
    }

    pub fn wrap_width(&self) -> f32 {
        (self.row_width - 40.0).max(MIN_WRAP_WIDTH)
    }
}

impl Default for ActionListView {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repair::catalog::{ALL_CATEGORIES, CATALOG};

    #[test]
    fn selecting_b_after_a_leaves_only_b() {
        let mut view = ActionListView::new();
        view.render(&CATALOG, ALL_CATEGORIES, None);
        assert!(view.selected_keys().is_empty());

        view.mark_selected(Some("sfc_scannow"));
        assert_eq!(view.selected_keys(), vec!["sfc_scannow"]);

        view.mark_selected(Some("net_reset"));
        assert_eq!(view.selected_keys(), vec!["net_reset"]);
    }

    #[test]
    fn rerender_keeps_highlight() {
        let mut view = ActionListView::new();
        view.render(&CATALOG, ALL_CATEGORIES, Some("temp_cleanup"));
        assert_eq!(view.selected_keys(), vec!["temp_cleanup"]);

        view.render(&CATALOG, "Cleanup / Updates", Some("temp_cleanup"));
        assert_eq!(view.rows().len(), 2);
        assert_eq!(view.selected_keys(), vec!["temp_cleanup"]);

        // selection outside the category is simply not visible
        view.render(&CATALOG, "Network", Some("temp_cleanup"));
        assert!(view.selected_keys().is_empty());
    }

    #[test]
    fn activate_reports_the_key() {
        let view = ActionListView::new();
        assert_eq!(view.activate("wu_reset"), ListEvent::Selected("wu_reset"));
    }

    #[test]
    fn resize_burst_coalesces_into_one_reflow() {
        let mut view = ActionListView::new();
        let t0 = Instant::now();
        view.on_resize(600.0, t0);
        view.on_resize(620.0, t0 + Duration::from_millis(20));
        view.on_resize(640.0, t0 + Duration::from_millis(40));

        // 50ms after the first event, but only 20ms after the last
        assert_eq!(view.poll(t0 + Duration::from_millis(60)), None);
        assert_eq!(view.poll(t0 + Duration::from_millis(95)), Some(640.0));
        assert_eq!(view.poll(t0 + Duration::from_millis(200)), None);
        assert_eq!(view.row_width(), 640.0);
        assert_eq!(view.wrap_width(), 600.0);
    }

    #[test]
    fn repeated_width_does_not_postpone_reflow() {
        let mut view = ActionListView::new();
        let t0 = Instant::now();
        view.on_resize(600.0, t0);
        view.on_resize(600.0, t0 + Duration::from_millis(30));
        view.on_resize(600.0, t0 + Duration::from_millis(45));
        assert_eq!(view.poll(t0 + Duration::from_millis(50)), Some(600.0));
    }

    #[test]
    fn same_width_does_not_schedule_reflow() {
        let mut view = ActionListView::new();
        let t0 = Instant::now();
        view.on_resize(DEFAULT_ROW_WIDTH, t0);
        assert_eq!(view.reflow_due_in(t0), None);
        assert_eq!(view.poll(t0 + Duration::from_secs(1)), None);
    }

    #[test]
    fn wrap_width_has_a_floor() {
        let mut view = ActionListView::new();
        let t0 = Instant::now();
        view.on_resize(100.0, t0);
        view.poll(t0 + REFLOW_DEBOUNCE);
        assert_eq!(view.wrap_width(), MIN_WRAP_WIDTH);
    }
}
