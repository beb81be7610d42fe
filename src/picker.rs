use crate::core::FileEntry;
use crate::keys::{KeyDecoder, KeySource, TtySource};
use crate::selection::{Flow, PickOutcome, SelectionState};
use crate::terminal::{SessionError, TerminalSession};
use crate::ui::{RenderSettings, Renderer};
use std::io::{self, BufWriter, Write};
use tracing::{debug, info};

pub struct Picker<'a> {
    files: &'a [FileEntry],
    state: SelectionState,
    renderer: Renderer,
}

impl<'a> Picker<'a> {
    pub fn new(files: &'a [FileEntry], filters: Vec<String>, renderer: Renderer) -> Self {
        Self {
            files,
            state: SelectionState::new(files.len(), filters),
            renderer,
        }
    }

    pub fn preselect_all(mut self) -> Self {
        let count = self.files.len();
        self.state = self.state.with_selected(0..count);
        self
    }

    /// Reads keys until Enter or quit. Every key is followed by a redraw
    /// request; the renderer skips it when nothing visible changed, except
    /// while the filter prompt is open or the mode just switched.
    pub fn run<K: KeySource, W: Write>(
        mut self,
        keys: &mut K,
        out: &mut W,
    ) -> Result<PickOutcome, SessionError> {
        self.renderer.draw(out, &self.state, self.files, true)?;
        loop {
            let key = keys.next_key()?;
            let was_editing = self.state.is_editing();
            let flow = self.state.handle(key);
            debug!(?key, ?flow, cursor = self.state.cursor(), "key handled");
            if flow == Flow::Done {
                break;
            }
            let force = was_editing || self.state.is_editing();
            self.renderer.draw(out, &self.state, self.files, force)?;
        }
        Ok(self.state.into_outcome(self.files))
    }
}

/// Runs the picker on the controlling terminal. The terminal is restored
/// before this returns, whether the loop finished or failed.
pub fn pick(
    files: &[FileEntry],
    filters: Vec<String>,
    preselect: bool,
    settings: RenderSettings,
) -> Result<PickOutcome, SessionError> {
    let session = TerminalSession::acquire()?;
    let mut keys = KeyDecoder::new(TtySource::stdin());
    let mut out = BufWriter::new(io::stderr());
    let mut picker = Picker::new(files, filters, Renderer::new(settings));
    if preselect {
        picker = picker.preselect_all();
    }
    let result = picker.run(&mut keys, &mut out);
    drop(out);
    drop(keys);
    let released = session.release();
    let outcome = result?;
    released?;
    info!(
        selected = outcome.selected.len(),
        filters = ?outcome.filters,
        "picker finished"
    );
    Ok(outcome)
}
