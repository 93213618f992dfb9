//! Application state owned by the UI thread
//!
//! The window code only draws what `AppState` exposes and forwards clicks as
//! calls; workers talk to it through the runner and probe channels, drained in
//! `pump` once per frame.

use std::sync::mpsc::{Receiver, TryRecvError};
use std::time::{Duration, Instant};

use super::catalog::{ActionDefinition, Catalog, ALL_CATEGORIES, CHKDSK_C, UPGRADE_PRO};
use super::error::RepairError;
use super::host::Host;
use super::list_view::{ActionListView, ListEvent};
use super::log::LogView;
use super::probe::{self, SystemInfoSnapshot};
use super::runner::{ActionRunner, Launcher, RunEvent, RunOutcome};
use super::Repaint;

pub const README_URL: &str = "https://github.com/SD-ITLab/SD-TechTools";
pub const BRAND_URL: &str = "https://sd-itlab.de";

pub const STATUS_READY: &str = "Ready.";
pub const STATUS_RESTARTING: &str = "Restarting ...";

const PROBE_DELAY: Duration = Duration::from_millis(200);
const LAUNCH_FAILURE_RESET: Duration = Duration::from_millis(1200);
const COMPLETION_RESET: Duration = Duration::from_millis(1500);

const PROGRESS_STARTING: f32 = 0.1;
const PROGRESS_RUNNING: f32 = 0.2;

/// Modal questions the window has to ask
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Dialog {
    /// Destructive action, asked before anything starts
    ConfirmRun(&'static str),
    /// CHKDSK was scheduled; offer an immediate restart
    ConfirmRestart,
}

impl Dialog {
    pub fn title(&self) -> &'static str {
        match self {
            Dialog::ConfirmRun(_) => "Upgrade Windows edition",
            Dialog::ConfirmRestart => "Restart for CHKDSK",
        }
    }

    pub fn message(&self) -> &'static str {
        match self {
            Dialog::ConfirmRun(_) => {
                "This action tries to upgrade Windows Home to Windows Pro.\n\
                 Only run it on systems where you really want that.\n\nContinue?"
            }
            Dialog::ConfirmRestart => {
                "The repair of drive C: has been scheduled with CHKDSK /F for the next system start.\n\n\
                 Restart the computer now?"
            }
        }
    }
}

pub struct AppState {
    catalog: &'static Catalog,
    categories: Vec<String>,
    category: String,
    list: ActionListView,
    selection: Option<&'static str>,
    log: LogView,
    status: String,
    progress: f32,
    progress_reset_at: Option<Instant>,
    runner: ActionRunner,
    running: Option<&'static ActionDefinition>,
    dialog: Option<Dialog>,
    notice: Option<String>,
    snapshot: SystemInfoSnapshot,
    probe_due_at: Option<Instant>,
    probe_rx: Option<Receiver<SystemInfoSnapshot>>,
    host: Box<dyn Host>,
}

impl AppState {
    pub fn new(catalog: &'static Catalog, launcher: Launcher, host: Box<dyn Host>, now: Instant) -> Self {
        if let Err(e) = catalog.validate() {
            tracing::error!("action catalog is inconsistent: {}", e);
            debug_assert!(false, "action catalog is inconsistent: {e}");
        }

        let mut list = ActionListView::new();
        list.render(catalog, ALL_CATEGORIES, None);

        Self {
            catalog,
            categories: catalog.list_categories(),
            category: ALL_CATEGORIES.to_string(),
            list,
            selection: None,
            log: LogView::new(),
            status: STATUS_READY.to_string(),
            progress: 0.0,
            progress_reset_at: None,
            runner: ActionRunner::new(launcher),
            running: None,
            dialog: None,
            notice: None,
            snapshot: SystemInfoSnapshot::placeholder(),
            probe_due_at: Some(now + PROBE_DELAY),
            probe_rx: None,
            host,
        }
    }

    pub fn categories(&self) -> &[String] {
        &self.categories
    }

    pub fn category(&self) -> &str {
        &self.category
    }

    pub fn list(&self) -> &ActionListView {
        &self.list
    }

    #[cfg(test)]
    pub fn selection(&self) -> Option<&'static str> {
        self.selection
    }

    pub fn log(&self) -> &LogView {
        &self.log
    }

    pub fn status(&self) -> &str {
        &self.status
    }

    pub fn progress(&self) -> f32 {
        self.progress
    }

    pub fn dialog(&self) -> Option<Dialog> {
        self.dialog
    }

    pub fn notice(&self) -> Option<&str> {
        self.notice.as_deref()
    }

    pub fn snapshot(&self) -> &SystemInfoSnapshot {
        &self.snapshot
    }

    pub fn is_running(&self) -> bool {
        self.runner.is_busy()
    }

    #[cfg(test)]
    pub fn runner(&self) -> &ActionRunner {
        &self.runner
    }

    pub fn select_category(&mut self, category: &str) {
        if !self.categories.iter().any(|c| c == category) {
            return;
        }
        self.category = category.to_string();
        self.list.render(self.catalog, &self.category, self.selection);
    }

    pub fn handle_list_event(&mut self, event: ListEvent) {
        match event {
            ListEvent::Selected(key) => {
                self.selection = Some(key);
                self.list.mark_selected(Some(key));
            }
        }
    }

    /// Width of the action list changed
    pub fn on_list_resize(&mut self, width: f32, now: Instant) {
        self.list.on_resize(width, now);
    }

    /// The Run button
    pub fn run_selected(&mut self, repaint: &Repaint) {
        let Some(key) = self.selection else {
            self.log.append("Please select an action first.");
            return;
        };
        let Some(action) = self.catalog.get(key) else {
            tracing::error!("selected action {} is not in the catalog", key);
            debug_assert!(false, "selected action {key} is not in the catalog");
            return;
        };
        if self.runner.is_busy() {
            tracing::warn!("ignoring run of {} while another action is active", key);
            return;
        }

        if action.key == UPGRADE_PRO {
            self.dialog = Some(Dialog::ConfirmRun(action.key));
            return;
        }
        self.begin(action, repaint);
    }

    /// Answer to the open dialog
    pub fn answer_dialog(&mut self, accepted: bool, repaint: &Repaint) {
        let Some(dialog) = self.dialog.take() else {
            return;
        };
        match dialog {
            Dialog::ConfirmRun(key) => {
                if !accepted {
                    tracing::debug!("user declined {}", key);
                    return;
                }
                if let Some(action) = self.catalog.get(key) {
                    self.begin(action, repaint);
                }
            }
            Dialog::ConfirmRestart => {
                if accepted {
                    self.log.append("\nRestart is being prepared ...\nWindows runs CHKDSK before booting.");
                    match self.host.restart() {
                        Ok(()) => self.status = STATUS_RESTARTING.to_string(),
                        Err(e) => {
                            tracing::warn!("restart failed: {}", e);
                            self.log.append(&format!("[Restart failed] {e}"));
                        }
                    }
                } else {
                    self.log.append(
                        "\nRestart cancelled by the user. \
                         CHKDSK will still run at the next manual restart.",
                    );
                }
            }
        }
    }

    pub fn open_link(&mut self, url: &str) {
        if let Err(e) = self.host.open_url(url) {
            tracing::warn!("{}", e);
            self.notice = Some(format!("Link could not be opened:\n{e}"));
        }
    }

    pub fn dismiss_notice(&mut self) {
        self.notice = None;
    }

    fn begin(&mut self, action: &'static ActionDefinition, repaint: &Repaint) {
        if !self.runner.start(action, repaint.clone()) {
            return;
        }
        self.running = Some(action);
        self.status = format!("Running action: {}", action.title);
        self.progress = PROGRESS_STARTING;
        self.progress_reset_at = None;
    }

    /// Drain worker messages and fire timers.
    ///
    /// Returns how long until the next timer, if one is pending.
    pub fn pump(&mut self, now: Instant, repaint: &Repaint) -> Option<Duration> {
        if self.probe_due_at.is_some_and(|due| now >= due) {
            self.probe_due_at = None;
            self.probe_rx = Some(probe::spawn(repaint.clone()));
        }
        if let Some(rx) = &self.probe_rx {
            match rx.try_recv() {
                Ok(snapshot) => {
                    self.snapshot = snapshot;
                    self.probe_rx = None;
                }
                Err(TryRecvError::Empty) => {}
                Err(TryRecvError::Disconnected) => self.probe_rx = None,
            }
        }

        for event in self.runner.poll() {
            self.handle_run_event(event, now);
        }

        if self.progress_reset_at.is_some_and(|at| now >= at) {
            self.progress_reset_at = None;
            self.progress = 0.0;
        }

        if let Some(width) = self.list.poll(now) {
            tracing::debug!("reflowing action list to {}px", width);
        }

        [
            self.probe_due_at.map(|due| due.saturating_duration_since(now)),
            self.progress_reset_at.map(|at| at.saturating_duration_since(now)),
            self.list.reflow_due_in(now),
        ]
        .into_iter()
        .flatten()
        .min()
    }

    fn handle_run_event(&mut self, event: RunEvent, now: Instant) {
        let title = self.running.map(|a| a.title).unwrap_or_default();
        match event {
            RunEvent::Started { script } => {
                self.log.clear();
                self.log.append(&format!("Starting action: {title}"));
                self.log.append(&format!("Script: {script}"));
                self.log
                    .append(&format!("Started at: {}\n", chrono::Local::now().format("%H:%M:%S")));
            }
            RunEvent::Spawned => self.progress = PROGRESS_RUNNING,
            RunEvent::Output(line) => self.log.append(&line),
            RunEvent::Finished(outcome) => self.finish(outcome, now),
        }
    }

    fn finish(&mut self, outcome: RunOutcome, now: Instant) {
        let action = self.running.take();
        let title = action.map(|a| a.title).unwrap_or_default();
        match outcome {
            RunOutcome::Success => {
                tracing::info!("action {} completed", title);
                self.progress = 1.0;
                self.status = format!("Done: {title} (OK)");
                self.progress_reset_at = Some(now + COMPLETION_RESET);
                if action.is_some_and(|a| a.key == CHKDSK_C) {
                    self.dialog = Some(Dialog::ConfirmRestart);
                }
            }
            RunOutcome::Failed { code } => {
                tracing::info!("action {} failed with exit code {}", title, code);
                self.log.append(&format!("\nScript exit code: {code}"));
                self.progress = 1.0;
                self.status = format!("Failed: {title} (exit code {code})");
                self.progress_reset_at = Some(now + COMPLETION_RESET);
            }
            RunOutcome::LaunchFailed(e) => {
                tracing::warn!("action {} could not be launched: {}", title, e);
                match &e {
                    RepairError::ScriptMissing(_) => self.log.append(&e.to_string()),
                    _ => self.log.append(&format!("[Error] {e}")),
                }
                self.status = format!("Action failed: {title} ({})", e.short_label());
                self.progress_reset_at = Some(now + LAUNCH_FAILURE_RESET);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repair::catalog::CATALOG;
    use crate::repair::log::LOG_INTRO;
    use crate::repair::runner::tests::{no_repaint, sh_launcher, write_script};
    use crate::repair::runner::SCRIPT_NAME;
    use std::cell::RefCell;
    use std::path::PathBuf;
    use std::rc::Rc;

    #[derive(Clone, Default)]
    struct RecordingHost {
        calls: Rc<RefCell<Vec<String>>>,
        fail_urls: bool,
        fail_restart: bool,
    }

    impl Host for RecordingHost {
        fn open_url(&self, url: &str) -> crate::repair::error::Result<()> {
            self.calls.borrow_mut().push(format!("open {url}"));
            if self.fail_urls {
                return Err(RepairError::OpenUrl {
                    url: url.to_string(),
                    source: std::io::Error::other("no browser"),
                });
            }
            Ok(())
        }

        fn restart(&self) -> crate::repair::error::Result<()> {
            self.calls.borrow_mut().push("restart".to_string());
            if self.fail_restart {
                return Err(RepairError::Restart(std::io::Error::other("access denied")));
            }
            Ok(())
        }
    }

    fn state_with(script: PathBuf, host: RecordingHost) -> AppState {
        AppState::new(&CATALOG, sh_launcher(script), Box::new(host), Instant::now())
    }

    fn select(state: &mut AppState, key: &'static str) {
        let event = state.list().activate(key);
        state.handle_list_event(event);
    }

    fn pump_until_idle(state: &mut AppState) {
        let deadline = Instant::now() + Duration::from_secs(20);
        let repaint = no_repaint();
        loop {
            state.pump(Instant::now(), &repaint);
            if !state.is_running() {
                return;
            }
            assert!(Instant::now() < deadline, "run did not finish");
            std::thread::sleep(Duration::from_millis(10));
        }
    }

    #[test]
    fn run_without_selection_only_logs_a_prompt() {
        let dir = tempfile::tempdir().unwrap();
        let mut state = state_with(dir.path().join(SCRIPT_NAME), RecordingHost::default());

        state.run_selected(&no_repaint());
        assert_eq!(state.log().lines(), &[LOG_INTRO, "Please select an action first."]);
        assert_eq!(state.status(), STATUS_READY);
        assert_eq!(state.runner().launches(), 0);
    }

    #[test]
    fn selection_is_single_and_survives_category_switch() {
        let dir = tempfile::tempdir().unwrap();
        let mut state = state_with(dir.path().join(SCRIPT_NAME), RecordingHost::default());

        select(&mut state, "dism_scanhealth");
        select(&mut state, "sfc_scannow");
        assert_eq!(state.selection(), Some("sfc_scannow"));
        assert_eq!(state.list().selected_keys(), vec!["sfc_scannow"]);

        state.select_category("System files / DISM");
        assert_eq!(state.list().rows().len(), 6);
        assert_eq!(state.list().selected_keys(), vec!["sfc_scannow"]);

        // unknown categories are ignored
        state.select_category("Games");
        assert_eq!(state.category(), "System files / DISM");
    }

    #[cfg(unix)]
    #[test]
    fn successful_run_streams_into_the_log() {
        let dir = tempfile::tempdir().unwrap();
        let script = write_script(dir.path(), "printf 'L1\\nL2\\n'\n");
        let mut state = state_with(script, RecordingHost::default());

        select(&mut state, "sfc_scannow");
        state.run_selected(&no_repaint());
        assert!(state.status().starts_with("Running action:"));
        pump_until_idle(&mut state);

        let lines = state.log().lines();
        assert!(lines[0].starts_with("Starting action: Check & repair system files"));
        let l1 = lines.iter().position(|l| l == "L1").unwrap();
        let l2 = lines.iter().position(|l| l == "L2").unwrap();
        assert!(l1 < l2);
        assert!(!state.log().contains(LOG_INTRO));
        assert_eq!(state.status(), "Done: Check & repair system files [sfc /scannow] (OK)");
        assert_eq!(state.progress(), 1.0);
        assert_eq!(state.dialog(), None);
    }

    #[cfg(unix)]
    #[test]
    fn failed_run_reports_the_exit_code() {
        let dir = tempfile::tempdir().unwrap();
        let script = write_script(dir.path(), "echo working\nexit 7\n");
        let mut state = state_with(script, RecordingHost::default());

        select(&mut state, "net_reset");
        state.run_selected(&no_repaint());
        pump_until_idle(&mut state);

        assert!(state.status().starts_with("Failed:"));
        assert!(state.status().contains('7'));
        assert!(state.log().contains("Script exit code: 7"));
    }

    #[test]
    fn missing_script_fails_without_a_process() {
        let dir = tempfile::tempdir().unwrap();
        let mut state = state_with(dir.path().join(SCRIPT_NAME), RecordingHost::default());

        select(&mut state, "temp_cleanup");
        state.run_selected(&no_repaint());
        pump_until_idle(&mut state);

        assert!(state.log().contains("winrep_actions.ps1 was not found."));
        assert_eq!(
            state.status(),
            "Action failed: Clean up temporary files (script missing)"
        );

        // progress drops back after the short delay
        let later = Instant::now() + Duration::from_secs(2);
        state.pump(later, &no_repaint());
        assert_eq!(state.progress(), 0.0);
    }

    #[test]
    fn declining_the_upgrade_changes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let script = write_script(dir.path(), "exit 0\n");
        let mut state = state_with(script, RecordingHost::default());

        select(&mut state, UPGRADE_PRO);
        let log_before = state.log().lines().to_vec();
        let status_before = state.status().to_string();
        let progress_before = state.progress();

        state.run_selected(&no_repaint());
        assert_eq!(state.dialog(), Some(Dialog::ConfirmRun(UPGRADE_PRO)));

        state.answer_dialog(false, &no_repaint());
        assert_eq!(state.dialog(), None);
        assert_eq!(state.runner().launches(), 0);
        assert_eq!(state.log().lines(), log_before.as_slice());
        assert_eq!(state.status(), status_before);
        assert_eq!(state.progress(), progress_before);
    }

    #[cfg(unix)]
    #[test]
    fn accepting_the_upgrade_runs_it() {
        let dir = tempfile::tempdir().unwrap();
        let script = write_script(dir.path(), "echo \"$2\"\n");
        let mut state = state_with(script, RecordingHost::default());

        select(&mut state, UPGRADE_PRO);
        state.run_selected(&no_repaint());
        state.answer_dialog(true, &no_repaint());
        assert_eq!(state.runner().launches(), 1);
        pump_until_idle(&mut state);
        assert!(state.log().contains(UPGRADE_PRO));
    }

    #[cfg(unix)]
    #[test]
    fn chkdsk_success_offers_restart() {
        let dir = tempfile::tempdir().unwrap();
        let script = write_script(dir.path(), "echo scheduled\n");
        let host = RecordingHost::default();
        let calls = Rc::clone(&host.calls);
        let mut state = state_with(script, host);

        select(&mut state, CHKDSK_C);
        state.run_selected(&no_repaint());
        pump_until_idle(&mut state);
        assert_eq!(state.dialog(), Some(Dialog::ConfirmRestart));

        state.answer_dialog(false, &no_repaint());
        assert!(state.log().contains("Restart cancelled by the user."));
        assert!(calls.borrow().is_empty());

        // second run, this time accepting
        state.run_selected(&no_repaint());
        pump_until_idle(&mut state);
        state.answer_dialog(true, &no_repaint());
        assert!(state.log().contains("Restart is being prepared ..."));
        assert_eq!(calls.borrow().as_slice(), &["restart".to_string()]);
        assert_eq!(state.status(), STATUS_RESTARTING);
    }

    #[cfg(unix)]
    #[test]
    fn failed_restart_is_logged_and_status_kept() {
        let dir = tempfile::tempdir().unwrap();
        let script = write_script(dir.path(), "echo scheduled\n");
        let host = RecordingHost {
            fail_restart: true,
            ..RecordingHost::default()
        };
        let calls = Rc::clone(&host.calls);
        let mut state = state_with(script, host);

        select(&mut state, CHKDSK_C);
        state.run_selected(&no_repaint());
        pump_until_idle(&mut state);
        let done_status = state.status().to_string();
        assert!(done_status.starts_with("Done:"));

        state.answer_dialog(true, &no_repaint());
        assert_eq!(calls.borrow().as_slice(), &["restart".to_string()]);
        assert!(state.log().contains("[Restart failed]"));
        assert!(state.log().contains("access denied"));
        assert_eq!(state.status(), done_status);
        assert_eq!(state.dialog(), None);
    }

    #[cfg(unix)]
    #[test]
    fn run_request_while_busy_leaves_the_active_run_alone() {
        let dir = tempfile::tempdir().unwrap();
        let script = write_script(dir.path(), "echo first\nsleep 1\necho second\n");
        let mut state = state_with(script, RecordingHost::default());

        select(&mut state, "sfc_scannow");
        state.run_selected(&no_repaint());
        assert!(state.is_running());

        // wait until the run has written into the log
        let deadline = Instant::now() + Duration::from_secs(10);
        while !state.log().contains("first") {
            assert!(Instant::now() < deadline, "no output from the run");
            state.pump(Instant::now(), &no_repaint());
            std::thread::sleep(Duration::from_millis(10));
        }
        let log_before = state.log().lines().to_vec();
        let status_before = state.status().to_string();
        let progress_before = state.progress();

        select(&mut state, "net_reset");
        state.run_selected(&no_repaint());
        assert_eq!(state.log().lines(), log_before.as_slice());
        assert_eq!(state.status(), status_before);
        assert_eq!(state.progress(), progress_before);
        assert_eq!(state.runner().launches(), 1);

        pump_until_idle(&mut state);
        let headers = state
            .log()
            .lines()
            .iter()
            .filter(|l| l.starts_with("Starting action:"))
            .count();
        assert_eq!(headers, 1);
        assert!(state.log().contains("second"));
        assert_eq!(state.status(), "Done: Check & repair system files [sfc /scannow] (OK)");
    }

    #[test]
    fn broken_link_becomes_a_notice() {
        let dir = tempfile::tempdir().unwrap();
        let host = RecordingHost {
            fail_urls: true,
            ..RecordingHost::default()
        };
        let mut state = state_with(dir.path().join(SCRIPT_NAME), host);

        state.open_link(README_URL);
        assert!(state.notice().unwrap().starts_with("Link could not be opened:"));
        state.dismiss_notice();
        assert_eq!(state.notice(), None);
    }

    #[test]
    fn pump_reports_the_next_timer() {
        let dir = tempfile::tempdir().unwrap();
        let now = Instant::now();
        let mut state = AppState::new(
            &CATALOG,
            sh_launcher(dir.path().join(SCRIPT_NAME)),
            Box::new(RecordingHost::default()),
            now,
        );
        state.on_list_resize(700.0, now);
        let wait = state.pump(now, &no_repaint()).unwrap();
        assert!(wait <= Duration::from_millis(50));
    }
}
