//! Explicit reactive graph driving the viewer.
//!
//! Every piece of selection state lives in a named cell. External events
//! write source cells; derived cells recompute in a fixed topological
//! order, and only when one of their declared inputs changed during the
//! pass. A cell written directly by the triggering event is pinned and
//! not recomputed in that pass, so a dropdown pick is never clobbered by
//! its own propagation.

use crate::resolve::image_route;
use crate::scan::{Scanner, SessionEntry};
use crate::steps::PreprocStep;
use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};

pub const KEY_LEFT: &str = "ArrowLeft";
pub const KEY_RIGHT: &str = "ArrowRight";

/// Names of the state cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CellId {
    Subject,
    Step,
    Key,
    SessionOptions,
    LeftPressed,
    RightPressed,
    CurrentIndex,
    SelectedSession,
    ImagePath,
}

pub const CELL_COUNT: usize = 9;

impl CellId {
    /// Declared inputs of each derived cell; source cells have none.
    ///
    /// `CurrentIndex` additionally reads the previous pass's selection to
    /// resolve its base position, which is state, not an input: a freshly
    /// picked session is located on the next traversal, not eagerly.
    pub fn inputs(self) -> &'static [CellId] {
        use CellId::*;
        match self {
            Subject | Step | Key => &[],
            SessionOptions => &[Subject],
            LeftPressed => &[Key],
            RightPressed => &[Key],
            CurrentIndex => &[SessionOptions, Key, LeftPressed, RightPressed],
            SelectedSession => &[
                Subject,
                SessionOptions,
                Key,
                CurrentIndex,
                LeftPressed,
                RightPressed,
            ],
            ImagePath => &[Subject, SelectedSession, Step],
        }
    }

    fn index(self) -> usize {
        self as usize
    }
}

/// Recompute order for derived cells; a topological order of
/// [`CellId::inputs`], checked by a test below.
pub const SCHEDULE: [CellId; 6] = [
    CellId::SessionOptions,
    CellId::LeftPressed,
    CellId::RightPressed,
    CellId::CurrentIndex,
    CellId::SelectedSession,
    CellId::ImagePath,
];

#[derive(Default)]
struct DirtySet {
    flags: [bool; CELL_COUNT],
}

impl DirtySet {
    fn mark(&mut self, cell: CellId) {
        self.flags[cell.index()] = true;
    }

    fn contains(&self, cell: CellId) -> bool {
        self.flags[cell.index()]
    }
}

/// External events delivered by the UI.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum UiEvent {
    PickSubject { subject: String },
    PickSession { filename: String },
    PickStep { step: PreprocStep },
    KeyDown { key: String },
}

/// A step offered by the viewer, paired with its display title.
#[derive(Debug, Clone, Serialize)]
pub struct StepChoice {
    pub step: PreprocStep,
    pub title: &'static str,
}

/// Full state snapshot handed to the UI after every event.
#[derive(Debug, Clone, Serialize)]
pub struct ViewerSnapshot {
    pub subjects: Vec<String>,
    pub subject: String,
    pub steps: Vec<StepChoice>,
    pub step: PreprocStep,
    pub session_options: Vec<SessionEntry>,
    pub selected_session: Option<String>,
    pub current_index: usize,
    pub image_path: Option<String>,
}

/// The viewer's only mutable state: source cells written by events and
/// derived cells recomputed from them.
#[derive(Debug)]
pub struct ViewerGraph {
    scanner: Scanner,
    subjects: Vec<String>,
    steps: Vec<PreprocStep>,
    // source cells
    subject: String,
    step: PreprocStep,
    key: Option<String>,
    key_count: u64,
    // derived cells
    session_options: Vec<SessionEntry>,
    left_pressed: bool,
    right_pressed: bool,
    current_index: usize,
    selected_session: Option<String>,
    image_path: Option<String>,
}

impl ViewerGraph {
    /// Scan the derivatives tree once for subjects, seed the graph with
    /// the first subject's sessions and run an initial propagation.
    pub fn open(scanner: Scanner) -> Result<Self> {
        let subjects = scanner.list_subjects()?;
        if subjects.is_empty() {
            bail!(
                "no sub-* directories under {}",
                scanner.root().display()
            );
        }
        let subject = subjects[0].clone();
        let session_options = scanner.list_sessions(&subject)?;
        let steps = match session_options.first() {
            Some(first) => scanner.list_steps(&subject, &first.label)?,
            None => Vec::new(),
        };
        let step = steps.first().copied().unwrap_or(PreprocStep::DEFAULT);
        let selected_session = session_options.first().map(|s| s.filename.clone());
        let image_path = selected_session
            .as_deref()
            .map(|filename| image_route(&subject, filename, step));
        Ok(Self {
            scanner,
            subjects,
            steps,
            subject,
            step,
            key: None,
            key_count: 0,
            session_options,
            left_pressed: false,
            right_pressed: false,
            current_index: 0,
            selected_session,
            image_path,
        })
    }

    pub fn subjects(&self) -> &[String] {
        &self.subjects
    }

    pub fn subject(&self) -> &str {
        &self.subject
    }

    pub fn steps(&self) -> &[PreprocStep] {
        &self.steps
    }

    pub fn step(&self) -> PreprocStep {
        self.step
    }

    pub fn session_options(&self) -> &[SessionEntry] {
        &self.session_options
    }

    /// Total key presses seen; every press is observable even when the
    /// key string repeats.
    pub fn key_count(&self) -> u64 {
        self.key_count
    }

    pub fn selected_session(&self) -> Option<&str> {
        self.selected_session.as_deref()
    }

    pub fn current_index(&self) -> usize {
        self.current_index
    }

    pub fn image_path(&self) -> Option<&str> {
        self.image_path.as_deref()
    }

    pub fn snapshot(&self) -> ViewerSnapshot {
        ViewerSnapshot {
            subjects: self.subjects.clone(),
            subject: self.subject.clone(),
            steps: self
                .steps
                .iter()
                .map(|&step| StepChoice {
                    step,
                    title: step.title(),
                })
                .collect(),
            step: self.step,
            session_options: self.session_options.clone(),
            selected_session: self.selected_session.clone(),
            current_index: self.current_index,
            image_path: self.image_path.clone(),
        }
    }

    /// Ingest one external event and run a propagation pass.
    pub fn apply(&mut self, event: UiEvent) -> Result<()> {
        let mut dirty = DirtySet::default();
        let mut pinned = None;
        // arrow flags only carry meaning within a key-triggered pass
        if !matches!(event, UiEvent::KeyDown { .. }) {
            self.left_pressed = false;
            self.right_pressed = false;
        }
        match event {
            UiEvent::PickSubject { subject } => {
                if !self.subjects.contains(&subject) {
                    bail!("unknown subject {subject:?}");
                }
                if self.subject != subject {
                    self.subject = subject;
                    dirty.mark(CellId::Subject);
                }
            }
            UiEvent::PickSession { filename } => {
                if self.selected_session.as_deref() != Some(filename.as_str()) {
                    self.selected_session = Some(filename);
                    dirty.mark(CellId::SelectedSession);
                    pinned = Some(CellId::SelectedSession);
                }
            }
            UiEvent::PickStep { step } => {
                if self.step != step {
                    self.step = step;
                    dirty.mark(CellId::Step);
                }
            }
            UiEvent::KeyDown { key } => {
                self.key = Some(key);
                self.key_count += 1;
                dirty.mark(CellId::Key);
            }
        }
        self.propagate(dirty, pinned)
    }

    fn propagate(&mut self, mut dirty: DirtySet, pinned: Option<CellId>) -> Result<()> {
        for cell in SCHEDULE {
            if Some(cell) == pinned {
                continue;
            }
            if !cell.inputs().iter().any(|input| dirty.contains(*input)) {
                continue;
            }
            if self.recompute(cell)? {
                dirty.mark(cell);
            }
        }
        Ok(())
    }

    /// Re-evaluate one derived cell; true when its value changed.
    fn recompute(&mut self, cell: CellId) -> Result<bool> {
        match cell {
            CellId::SessionOptions => {
                let options = self.scanner.list_sessions(&self.subject)?;
                Ok(replace_if_changed(&mut self.session_options, options))
            }
            CellId::LeftPressed => {
                let pressed = self.key.as_deref() == Some(KEY_LEFT);
                Ok(replace_if_changed(&mut self.left_pressed, pressed))
            }
            CellId::RightPressed => {
                let pressed = self.key.as_deref() == Some(KEY_RIGHT);
                Ok(replace_if_changed(&mut self.right_pressed, pressed))
            }
            CellId::CurrentIndex => {
                let mut index = self.current_index;
                for (pos, entry) in self.session_options.iter().enumerate() {
                    if self.selected_session.as_deref() == Some(entry.filename.as_str()) {
                        index = pos;
                    }
                }
                if self.right_pressed {
                    if index + 1 < self.session_options.len() {
                        index += 1;
                    }
                } else if self.left_pressed {
                    index = index.saturating_sub(1);
                }
                Ok(replace_if_changed(&mut self.current_index, index))
            }
            CellId::SelectedSession => {
                let pick = if self.left_pressed || self.right_pressed {
                    self.session_options
                        .get(self.current_index)
                        .or_else(|| self.session_options.first())
                } else {
                    self.session_options.first()
                };
                let selected = pick.map(|entry| entry.filename.clone());
                Ok(replace_if_changed(&mut self.selected_session, selected))
            }
            CellId::ImagePath => {
                let path = self
                    .selected_session
                    .as_deref()
                    .map(|filename| image_route(&self.subject, filename, self.step));
                Ok(replace_if_changed(&mut self.image_path, path))
            }
            CellId::Subject | CellId::Step | CellId::Key => Ok(false),
        }
    }
}

fn replace_if_changed<T: PartialEq>(slot: &mut T, value: T) -> bool {
    if *slot == value {
        false
    } else {
        *slot = value;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::{tempdir, TempDir};

    fn figure(dir: &TempDir, subject: &str, rest: &str) {
        let figures = dir.path().join(format!("sub-{subject}")).join("figures");
        fs::create_dir_all(&figures).unwrap();
        fs::write(figures.join(format!("sub-{subject}_{rest}")), b"<svg/>").unwrap();
    }

    fn fixture() -> TempDir {
        let dir = tempdir().unwrap();
        for ses in ["A", "B", "C"] {
            figure(
                &dir,
                "01",
                &format!("ses-{ses}_task-rest_desc-carpetplot_bold.svg"),
            );
            figure(&dir, "01", &format!("ses-{ses}_task-rest_desc-sdc_bold.svg"));
        }
        figure(&dir, "02", "ses-A_task-rest_desc-carpetplot_bold.svg");
        dir
    }

    fn graph(dir: &TempDir) -> ViewerGraph {
        ViewerGraph::open(Scanner::new(dir.path())).unwrap()
    }

    fn key(graph: &mut ViewerGraph, key: &str) {
        graph
            .apply(UiEvent::KeyDown {
                key: key.to_string(),
            })
            .unwrap();
    }

    #[test]
    fn schedule_is_a_topological_order() {
        for (pos, cell) in SCHEDULE.iter().enumerate() {
            for input in cell.inputs() {
                let upstream = SCHEDULE.iter().position(|c| c == input);
                if let Some(upstream) = upstream {
                    assert!(
                        upstream < pos,
                        "{input:?} must be scheduled before {cell:?}"
                    );
                }
            }
        }
    }

    #[test]
    fn opens_on_first_subject_and_session() {
        let dir = fixture();
        let g = graph(&dir);
        assert_eq!(g.subject(), "01");
        assert_eq!(g.session_options().len(), 3);
        assert_eq!(
            g.selected_session(),
            Some("sub-01_ses-A_task-rest_desc-carpetplot_bold.svg")
        );
        // first discovered step in filename order
        assert_eq!(g.step(), PreprocStep::Carpetplot);
        assert_eq!(
            g.image_path(),
            Some("/images/01/sub-01_ses-A_task-rest_desc-carpetplot_bold.svg")
        );
    }

    #[test]
    fn open_fails_on_empty_root() {
        let dir = tempdir().unwrap();
        let err = ViewerGraph::open(Scanner::new(dir.path())).unwrap_err();
        assert!(err.to_string().contains("no sub-"));
    }

    #[test]
    fn right_advances_and_clamps_at_end() {
        let dir = fixture();
        let mut g = graph(&dir);
        for expected in [1, 2, 2, 2] {
            key(&mut g, KEY_RIGHT);
            assert_eq!(g.current_index(), expected);
        }
        assert_eq!(
            g.selected_session(),
            Some("sub-01_ses-C_task-rest_desc-carpetplot_bold.svg")
        );
    }

    #[test]
    fn left_retreats_and_clamps_at_zero() {
        let dir = fixture();
        let mut g = graph(&dir);
        key(&mut g, KEY_RIGHT);
        key(&mut g, KEY_RIGHT);
        for expected in [1, 0, 0] {
            key(&mut g, KEY_LEFT);
            assert_eq!(g.current_index(), expected);
        }
        assert_eq!(
            g.selected_session(),
            Some("sub-01_ses-A_task-rest_desc-carpetplot_bold.svg")
        );
    }

    #[test]
    fn other_keys_reset_to_first_session() {
        let dir = fixture();
        let mut g = graph(&dir);
        key(&mut g, KEY_RIGHT);
        assert_eq!(g.current_index(), 1);
        key(&mut g, "a");
        assert_eq!(
            g.selected_session(),
            Some("sub-01_ses-A_task-rest_desc-carpetplot_bold.svg")
        );
    }

    #[test]
    fn subject_change_resets_selection_to_first() {
        let dir = fixture();
        let mut g = graph(&dir);
        key(&mut g, KEY_RIGHT);
        g.apply(UiEvent::PickSubject {
            subject: "02".into(),
        })
        .unwrap();
        assert_eq!(g.session_options().len(), 1);
        assert_eq!(
            g.selected_session(),
            Some("sub-02_ses-A_task-rest_desc-carpetplot_bold.svg")
        );
        assert_eq!(
            g.image_path(),
            Some("/images/02/sub-02_ses-A_task-rest_desc-carpetplot_bold.svg")
        );
    }

    #[test]
    fn unknown_subject_is_rejected() {
        let dir = fixture();
        let mut g = graph(&dir);
        assert!(g
            .apply(UiEvent::PickSubject {
                subject: "99".into()
            })
            .is_err());
        assert_eq!(g.subject(), "01");
    }

    #[test]
    fn session_pick_survives_its_own_pass() {
        let dir = fixture();
        let mut g = graph(&dir);
        g.apply(UiEvent::PickSession {
            filename: "sub-01_ses-B_task-rest_desc-carpetplot_bold.svg".into(),
        })
        .unwrap();
        assert_eq!(
            g.selected_session(),
            Some("sub-01_ses-B_task-rest_desc-carpetplot_bold.svg")
        );
        assert_eq!(
            g.image_path(),
            Some("/images/01/sub-01_ses-B_task-rest_desc-carpetplot_bold.svg")
        );
        // the next traversal starts from the picked session
        key(&mut g, KEY_RIGHT);
        assert_eq!(g.current_index(), 2);
        assert_eq!(
            g.selected_session(),
            Some("sub-01_ses-C_task-rest_desc-carpetplot_bold.svg")
        );
    }

    #[test]
    fn step_pick_only_retags_the_image() {
        let dir = fixture();
        let mut g = graph(&dir);
        key(&mut g, KEY_RIGHT);
        g.apply(UiEvent::PickStep {
            step: PreprocStep::Sdc,
        })
        .unwrap();
        assert_eq!(
            g.selected_session(),
            Some("sub-01_ses-B_task-rest_desc-carpetplot_bold.svg")
        );
        assert_eq!(
            g.image_path(),
            Some("/images/01/sub-01_ses-B_task-rest_desc-sdc_bold.svg")
        );
    }

    #[test]
    fn subject_without_sessions_leaves_empty_state() {
        let dir = fixture();
        fs::create_dir_all(dir.path().join("sub-03")).unwrap();
        let mut g = graph(&dir);
        g.apply(UiEvent::PickSubject {
            subject: "03".into(),
        })
        .unwrap();
        assert!(g.session_options().is_empty());
        assert_eq!(g.selected_session(), None);
        assert_eq!(g.image_path(), None);
        // traversal on an empty list stays empty
        key(&mut g, KEY_RIGHT);
        assert_eq!(g.selected_session(), None);
    }

    #[test]
    fn discovered_steps_follow_filename_order() {
        let dir = fixture();
        let g = graph(&dir);
        assert_eq!(g.steps(), [PreprocStep::Carpetplot, PreprocStep::Sdc]);
    }
}
