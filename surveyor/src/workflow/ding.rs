use std::path::PathBuf;
use surveycore::collector::{CommandRunner, SystemRunner};
use surveycore::telemetry::LogManager;

/// Audible cue played when a point finishes, e.g. `paplay done.wav`.
pub struct Ding {
    command: String,
    sound: PathBuf,
    runner: Box<dyn CommandRunner>,
}

impl Ding {
    pub fn new(command: impl Into<String>, sound: impl Into<PathBuf>) -> Self {
        Self::with_runner(command, sound, Box::new(SystemRunner))
    }

    pub fn with_runner(
        command: impl Into<String>,
        sound: impl Into<PathBuf>,
        runner: Box<dyn CommandRunner>,
    ) -> Self {
        Self {
            command: command.into(),
            sound: sound.into(),
            runner,
        }
    }

    /// Play the sound. A broken player never interrupts the survey.
    pub fn play(&self, logger: &LogManager) {
        let sound = self.sound.to_string_lossy();
        match self.runner.run(&self.command, &[sound.as_ref()]) {
            Ok(output) if output.success => {}
            Ok(output) => logger.warn(&format!(
                "{} {} exited with {}",
                self.command, sound, output.status
            )),
            Err(err) => logger.warn(&format!("ding failed: {err}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;
    use surveycore::collector::CommandOutput;
    use surveycore::prelude::CollectorResult;

    struct Recorder(Rc<RefCell<Vec<String>>>);

    impl CommandRunner for Recorder {
        fn run(&self, program: &str, args: &[&str]) -> CollectorResult<CommandOutput> {
            self.0
                .borrow_mut()
                .push(format!("{program} {}", args.join(" ")));
            Ok(CommandOutput {
                success: false,
                status: "exit status: 1".into(),
                ..Default::default()
            })
        }
    }

    #[test]
    fn ding_runs_player_with_sound_path() {
        let calls = Rc::new(RefCell::new(Vec::new()));
        let ding = Ding::with_runner(
            "/usr/bin/paplay",
            "/tmp/done.wav",
            Box::new(Recorder(calls.clone())),
        );
        ding.play(&LogManager::new("test"));
        assert_eq!(*calls.borrow(), vec!["/usr/bin/paplay /tmp/done.wav"]);
    }

    #[test]
    fn missing_player_is_not_fatal() {
        let ding = Ding::new("surveyor-no-such-player", "/tmp/done.wav");
        ding.play(&LogManager::new("test"));
    }
}
