//! Interactive and headless command sessions.

use std::io::{BufRead, Write};
use std::path::Path;

use eventcal_core::{CalendarCollection, Event};
use tracing::{debug, info, warn};

use crate::config::CliConfig;
use crate::error::{CliError, CliResult};
use crate::export::export;
use crate::parser::{Command, parse_line};
use crate::render::{OutputFormat, render};

const PROMPT: &str = "> ";

/// What the caller should do after a command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    /// Keep reading commands, printing the text if any.
    Continue(Option<String>),
    /// The session asked to end.
    Exit,
}

/// A calendar collection driven by command lines.
pub struct Session {
    collection: CalendarCollection,
    config: CliConfig,
    format: OutputFormat,
}

impl Session {
    /// Starts a session, creating and selecting the configured calendar if
    /// there is one.
    pub fn new(config: CliConfig, format: OutputFormat) -> CliResult<Self> {
        let mut collection = CalendarCollection::new();
        if let Some((name, timezone)) = config.calendar.startup_calendar()? {
            collection.create_calendar(&name, timezone)?;
            collection.use_calendar(&name)?;
            info!(calendar = %name, timezone = %timezone, "Started with default calendar");
        }
        Ok(Self {
            collection,
            config,
            format,
        })
    }

    pub fn collection(&self) -> &CalendarCollection {
        &self.collection
    }

    /// Parses and runs one line.
    pub fn run_line(&mut self, line: &str) -> CliResult<Step> {
        match parse_line(line)? {
            Some(command) => self.execute(command),
            None => Ok(Step::Continue(None)),
        }
    }

    /// Runs one parsed command.
    pub fn execute(&mut self, command: Command) -> CliResult<Step> {
        match command {
            Command::Exit => Ok(Step::Exit),
            Command::Core(request) => {
                let outcome = self.collection.execute(request)?;
                Ok(Step::Continue(Some(render(&outcome, self.format)?)))
            }
            Command::Export { file } => {
                let path = self.config.export.resolve(&file);
                let calendar = self.collection.active()?;
                let events: Vec<Event> = calendar.events().iter().cloned().collect();
                let written = export(calendar.name(), &events, &path)?;
                Ok(Step::Continue(Some(format!(
                    "Exported '{}' to {}",
                    calendar.name(),
                    written.display()
                ))))
            }
        }
    }

    /// Reads commands until `exit` or end of input.
    ///
    /// A failing command is reported on `err` and the loop carries on.
    pub fn run_interactive<R, W, E>(&mut self, input: R, mut out: W, mut err: E) -> CliResult<()>
    where
        R: BufRead,
        W: Write,
        E: Write,
    {
        let mut lines = input.lines();
        loop {
            write!(out, "{}", PROMPT)?;
            out.flush()?;
            let Some(line) = lines.next() else {
                writeln!(out)?;
                return Ok(());
            };
            match self.run_line(&line?) {
                Ok(Step::Exit) => return Ok(()),
                Ok(Step::Continue(Some(text))) => writeln!(out, "{}", text)?,
                Ok(Step::Continue(None)) => {}
                Err(e) => {
                    warn!(error = %e, "Command failed");
                    writeln!(err, "error: {}", e)?;
                }
            }
        }
    }

    /// Runs a command file. The file must end with `exit`; the first failing
    /// command stops the run.
    pub fn run_headless<W: Write>(&mut self, path: &Path, out: W) -> CliResult<()> {
        let script = std::fs::read_to_string(path)?;
        self.run_script(&script, path, out)
    }

    /// Runs the text of a command file; `path` is only used in errors.
    pub fn run_script<W: Write>(&mut self, script: &str, path: &Path, mut out: W) -> CliResult<()> {
        let last = script
            .lines()
            .map(str::trim)
            .rfind(|line| !line.is_empty() && !line.starts_with('#'));
        if last != Some("exit") {
            return Err(CliError::MissingExit {
                path: path.to_path_buf(),
            });
        }

        for (number, line) in script.lines().enumerate() {
            debug!(line = number + 1, "Running command");
            match self.run_line(line)? {
                Step::Exit => break,
                Step::Continue(Some(text)) => writeln!(out, "{}", text)?,
                Step::Continue(None) => {}
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;
    use std::path::PathBuf;

    use eventcal_core::{CalendarError, ErrorKind};

    fn session() -> Session {
        Session::new(CliConfig::default(), OutputFormat::Text).unwrap()
    }

    fn interactive(input: &str) -> (String, String) {
        let mut out = Vec::new();
        let mut err = Vec::new();
        session()
            .run_interactive(Cursor::new(input), &mut out, &mut err)
            .unwrap();
        (String::from_utf8(out).unwrap(), String::from_utf8(err).unwrap())
    }

    fn calendar_kind(result: CliResult<()>) -> Option<ErrorKind> {
        match result {
            Err(CliError::Calendar(err)) => Some(err.kind()),
            _ => None,
        }
    }

    mod startup {
        use super::*;

        #[test]
        fn no_calendar_by_default() {
            let session = session();
            assert!(session.collection().is_empty());
        }

        #[test]
        fn configured_calendar_is_created_and_selected() {
            let config = CliConfig::parse(
                "[calendar]\ndefault_name = \"home\"\ndefault_timezone = \"Europe/Paris\"\n",
            )
            .unwrap();
            let session = Session::new(config, OutputFormat::Text).unwrap();
            assert_eq!(session.collection().active_name(), Some("home"));
        }
    }

    mod interactive {
        use super::*;

        #[test]
        fn runs_until_exit() {
            let (out, err) = interactive(
                "create calendar --name work --timezone America/New_York\n\
                 use calendar --name work\n\
                 create event Standup from 2025-05-05T09:00 to 2025-05-05T09:15\n\
                 print events on 2025-05-05\n\
                 exit\n\
                 print events on 2025-05-05\n",
            );
            assert!(err.is_empty());
            assert_eq!(
                out,
                "> Created calendar 'work' (America/New_York)\n\
                 > Using calendar 'work'\n\
                 > Created 1 event:\n\
                 - Standup: 2025-05-05T09:00 to 2025-05-05T09:15\n\
                 > - Standup: 2025-05-05T09:00 to 2025-05-05T09:15\n\
                 > "
            );
        }

        #[test]
        fn errors_are_reported_and_the_loop_continues() {
            let (out, err) = interactive(
                "print events on 2025-05-05\n\
                 create calendar --name work --timezone UTC\n\
                 use calendar --name work\n\
                 show status on 2025-05-05T09:00\n",
            );
            assert_eq!(err, "error: calendar not found: no calendar in use\n");
            assert!(out.contains("Using calendar 'work'"));
            assert!(out.contains("available"));
        }

        #[test]
        fn end_of_input_ends_the_session() {
            let (out, err) = interactive("");
            assert_eq!(out, "> \n");
            assert!(err.is_empty());
        }
    }

    mod headless {
        use super::*;

        const SETUP: &str = "create calendar --name work --timezone America/New_York\n\
                             use calendar --name work\n";

        #[test]
        fn missing_exit_is_rejected_before_running() {
            let mut session = session();
            let mut out = Vec::new();
            let script = format!("{}print events on 2025-05-05\n", SETUP);
            let result = session.run_script(&script, Path::new("cmds.txt"), &mut out);
            assert!(matches!(result, Err(CliError::MissingExit { .. })));
            assert!(session.collection().is_empty());
            assert!(out.is_empty());
        }

        #[test]
        fn trailing_blank_lines_and_comments_after_exit_are_fine() {
            let mut session = session();
            let script = format!("{}exit\n\n# done\n", SETUP);
            session
                .run_script(&script, Path::new("cmds.txt"), Vec::new())
                .unwrap();
            assert_eq!(session.collection().len(), 1);
        }

        #[test]
        fn first_failure_aborts() {
            let mut session = session();
            let mut out = Vec::new();
            let script = format!(
                "{}create event Standup from 2025-05-05T09:00 to 2025-05-05T09:15\n\
                 create event Standup from 2025-05-05T09:00 to 2025-05-05T09:15\n\
                 create event Lunch from 2025-05-05T12:00 to 2025-05-05T13:00\n\
                 exit\n",
                SETUP
            );
            let result = session.run_script(&script, Path::new("cmds.txt"), &mut out);
            assert_eq!(calendar_kind(result), Some(ErrorKind::Duplicate));
            assert_eq!(session.collection().active().unwrap().len(), 1);
        }

        #[test]
        fn runs_a_command_file() {
            let dir = tempfile::tempdir().unwrap();
            let path = dir.path().join("cmds.txt");
            std::fs::write(
                &path,
                format!(
                    "{}create event Gym from 2025-05-05T07:00 to 2025-05-05T08:00 repeats MWF for 3 times\n\
                     edit series location Gym from 2025-05-07T07:00 with Pool\n\
                     print events from 2025-05-05T00:00 to 2025-05-10T00:00\n\
                     exit\n",
                    SETUP
                ),
            )
            .unwrap();
            let mut out = Vec::new();
            let mut session = session();
            session.run_headless(&path, &mut out).unwrap();
            let out = String::from_utf8(out).unwrap();
            assert!(out.ends_with(
                "- Gym: 2025-05-05T07:00 to 2025-05-05T08:00 @ Pool\n\
                 - Gym: 2025-05-07T07:00 to 2025-05-07T08:00 @ Pool\n\
                 - Gym: 2025-05-09T07:00 to 2025-05-09T08:00 @ Pool\n"
            ));
        }

        #[test]
        fn missing_file_is_an_io_error() {
            let mut session = session();
            let result = session.run_headless(Path::new("/nonexistent/cmds.txt"), Vec::new());
            assert!(matches!(result, Err(CliError::Io(_))));
        }
    }

    mod exporting {
        use super::*;

        #[test]
        fn export_needs_an_active_calendar() {
            let mut session = session();
            let result = session.execute(Command::Export {
                file: PathBuf::from("out.csv"),
            });
            assert!(matches!(
                result,
                Err(CliError::Calendar(CalendarError::NotFound { .. }))
            ));
        }

        #[test]
        fn export_goes_to_configured_directory() {
            let dir = tempfile::tempdir().unwrap();
            let mut config = CliConfig::default();
            config.export.directory = Some(dir.path().to_path_buf());
            let mut session = Session::new(config, OutputFormat::Text).unwrap();
            for line in [
                "create calendar --name work --timezone UTC",
                "use calendar --name work",
                "create event Holiday on 2025-07-04",
            ] {
                session.run_line(line).unwrap();
            }

            let step = session.run_line("export cal work.ics").unwrap();
            let Step::Continue(Some(message)) = step else {
                panic!("expected a message, got {:?}", step);
            };
            assert!(message.starts_with("Exported 'work' to "));
            assert!(dir.path().join("work.ics").exists());
        }
    }
}
