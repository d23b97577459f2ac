//! Practice session context.
//!
//! Owns the state the flow needs across steps: the active script, the
//! progress store, the plan source, and one recorder per locale. The
//! presenter calls these entry points on user interaction and reads back
//! snapshots; it never mutates component state directly.

use std::collections::HashMap;

use crate::locale::Locale;
use crate::plan::PlanSource;
use crate::progress::{completion_percent, DayUpdate, ProgressRecord, ProgressStore, StoreUpdate};
use crate::recorder::RecorderController;
use crate::storage::KeyValueStore;

/// Number of wizard steps in the flow.
pub const STEP_COUNT: u32 = 3;

/// Snapshot handed to the presenter for rendering the active plan.
#[derive(Debug, Clone, PartialEq)]
pub struct PlanView {
    pub script_id: String,
    pub record: ProgressRecord,
    pub total_days: u32,
    pub completion_percent: u8,
}

pub struct PracticeSession<S: KeyValueStore> {
    progress: ProgressStore<S>,
    plans: PlanSource,
    recorders: HashMap<Locale, RecorderController>,
    active_script: Option<String>,
    active_total_days: u32,
}

impl<S: KeyValueStore> PracticeSession<S> {
    pub fn new(store: S, plans: PlanSource) -> Self {
        Self {
            progress: ProgressStore::new(store),
            plans,
            recorders: HashMap::new(),
            active_script: None,
            active_total_days: 0,
        }
    }

    /// Register the recorder for its locale. Replaces any previous one.
    pub fn add_recorder(&mut self, controller: RecorderController) {
        self.recorders.insert(controller.locale(), controller);
    }

    pub fn active_script(&self) -> Option<&str> {
        self.active_script.as_deref()
    }

    /// Switch to a script (or clear the selection with `None`). Loads the
    /// plan document, toggles recorder availability, and returns the render
    /// snapshot — `None` when no plan data is available.
    pub async fn select_script(&mut self, script_id: Option<&str>) -> Option<PlanView> {
        let Some(script_id) = script_id else {
            self.active_script = None;
            self.active_total_days = 0;
            self.set_recorders_active(false);
            return None;
        };

        self.active_script = Some(script_id.to_string());
        self.active_total_days = self
            .plans
            .script(script_id)
            .await
            .map(|doc| doc.total_days())
            .unwrap_or(0);

        let active = self.active_total_days > 0;
        self.set_recorders_active(active);
        if active {
            self.plan_view()
        } else {
            None
        }
    }

    /// Current render snapshot for the active plan.
    pub fn plan_view(&mut self) -> Option<PlanView> {
        let script_id = self.active_script.clone()?;
        if self.active_total_days == 0 {
            return None;
        }
        let record = self.progress.get(&script_id);
        let percent = completion_percent(&record, self.active_total_days);
        Some(PlanView {
            script_id,
            record,
            total_days: self.active_total_days,
            completion_percent: percent,
        })
    }

    /// The cached plan document for the active script, for card rendering.
    pub async fn active_plan(&mut self) -> Option<&crate::plan::PlanDocument> {
        let script_id = self.active_script.clone()?;
        self.plans.script(&script_id).await
    }

    /// Merge a day update into the active script's progress.
    pub fn update_day(&mut self, day: u32, update: DayUpdate) -> Option<StoreUpdate> {
        let script_id = self.active_script.clone()?;
        Some(self.progress.update(&script_id, day, update))
    }

    /// Set the daily-reminder opt-in for the active script.
    pub fn set_reminder(&mut self, enabled: bool) -> Option<StoreUpdate> {
        let script_id = self.active_script.clone()?;
        Some(self.progress.set_reminder(&script_id, enabled))
    }

    pub fn recorder(&self, locale: Locale) -> Option<&RecorderController> {
        self.recorders.get(&locale)
    }

    pub fn recorder_mut(&mut self, locale: Locale) -> Option<&mut RecorderController> {
        self.recorders.get_mut(&locale)
    }

    fn set_recorders_active(&mut self, active: bool) {
        for controller in self.recorders.values_mut() {
            controller.set_active(active);
        }
    }
}
