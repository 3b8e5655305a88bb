/// Pipeline progress events, consumed by whatever front-end drives the run.
#[derive(Debug, Clone)]
pub enum Progress {
    /// A pipeline step begins; `jobs` scripts will be generated and
    /// submitted for it.
    StepStart { name: String, jobs: u64 },
    /// One submission attempt finished (successfully or not).
    JobDone { mol_id: String, success: bool },
    StepFinish,

    Message(String),
}

pub type ProgressCallback<'a> = Box<dyn Fn(Progress) + Send + Sync + 'a>;

#[derive(Default)]
pub struct ProgressReporter<'a> {
    callback: Option<ProgressCallback<'a>>,
}

impl<'a> ProgressReporter<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_callback(callback: ProgressCallback<'a>) -> Self {
        Self {
            callback: Some(callback),
        }
    }

    #[inline]
    pub fn report(&self, event: Progress) {
        if let Some(cb) = &self.callback {
            cb(event);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[test]
    fn silent_reporter_ignores_events() {
        let reporter = ProgressReporter::new();
        reporter.report(Progress::StepFinish);
    }

    #[test]
    fn callback_receives_events_in_order() {
        let seen: Mutex<Vec<String>> = Mutex::new(Vec::new());
        let reporter = ProgressReporter::with_callback(Box::new(|event| {
            seen.lock().unwrap().push(format!("{event:?}"));
        }));

        reporter.report(Progress::StepStart {
            name: "opt".to_string(),
            jobs: 2,
        });
        reporter.report(Progress::JobDone {
            mol_id: "water".to_string(),
            success: true,
        });
        reporter.report(Progress::StepFinish);

        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 3);
        assert!(seen[0].contains("StepStart"));
        assert!(seen[2].contains("StepFinish"));
    }
}
