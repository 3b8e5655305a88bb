use indicatif::{ProgressBar, ProgressStyle};
use qcbatch::progress::{Progress, ProgressCallback};
use std::sync::{Arc, Mutex};
use tracing::warn;

/// Bridges the core pipeline's progress events onto an indicatif bar: one
/// bar per step, one tick per submitted job.
#[derive(Clone)]
pub struct CliProgressHandler {
    pb: Arc<Mutex<ProgressBar>>,
}

impl CliProgressHandler {
    pub fn new() -> Self {
        let pb = ProgressBar::new(0).with_style(Self::bar_style());
        pb.set_draw_target(indicatif::ProgressDrawTarget::stderr());
        pb.finish_and_clear();

        Self {
            pb: Arc::new(Mutex::new(pb)),
        }
    }

    pub fn get_callback(&self) -> ProgressCallback<'static> {
        let pb_clone = self.pb.clone();

        Box::new(move |progress: Progress| {
            let Ok(pb) = pb_clone.lock() else {
                warn!("Progress bar mutex was poisoned. Cannot update progress.");
                return;
            };

            match progress {
                Progress::StepStart { name, jobs } => {
                    pb.reset();
                    pb.set_length(jobs);
                    pb.set_position(0);
                    pb.set_style(Self::bar_style());
                    pb.set_message(name);
                }
                Progress::JobDone { mol_id, success } => {
                    if !success {
                        pb.println(format!("  ✗ submission failed for {mol_id}"));
                    }
                    pb.inc(1);
                }
                Progress::StepFinish => {
                    pb.finish();
                }
                Progress::Message(msg) => {
                    pb.println(format!("  {msg}"));
                }
            }
        })
    }

    fn bar_style() -> ProgressStyle {
        ProgressStyle::with_template("{msg:<16} [{bar:40.cyan/blue}] {pos}/{len}")
            .expect("Failed to create bar style template")
            .progress_chars("##-")
    }
}

impl Default for CliProgressHandler {
    fn default() -> Self {
        Self::new()
    }
}
