//! Line-oriented interactive session.
//!
//! Commands are read from stdin one per line. Result requests are dispatched
//! without waiting, so several may be in flight; frames for their responses
//! are presented as they are applied.
use super::{connect, output_format};
use crate::catalog::Step;
use crate::cli::SessionArgs;
use crate::engine::Engine;
use crate::error::SequencerError;
use crate::orchestrator::{lock_session, Dispatcher};
use crate::presenter::{Frame, Presenter, TerminalPresenter};
use crate::session::{Applied, Session};
use anyhow::{Context, Result};
use std::io::BufRead;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

const HELP: &str = "commands: upload <file.csv> | add <step> | select <index> | clear | status | wait | help | quit";

#[derive(Debug, Clone, PartialEq, Eq)]
enum SessionCommand {
    Upload(PathBuf),
    Add(Step),
    Select(usize),
    Clear,
    Status,
    Wait,
    Help,
    Quit,
}

enum Flow {
    Continue,
    Quit,
}

pub fn run_session(args: &SessionArgs) -> Result<()> {
    let engine: Arc<dyn Engine> = Arc::new(connect(&args.engine)?);
    let presenter: Arc<dyn Presenter> = Arc::new(TerminalPresenter::new(output_format(args.json)));
    let stdin = std::io::stdin();
    run_commands(stdin.lock(), engine, presenter)
}

/// Blank lines and `#` comments yield `None`.
fn parse_command(line: &str) -> Result<Option<SessionCommand>, String> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return Ok(None);
    }
    let (verb, rest) = match line.split_once(char::is_whitespace) {
        Some((verb, rest)) => (verb, rest.trim()),
        None => (line, ""),
    };
    let command = match (verb.to_ascii_lowercase().as_str(), rest) {
        ("upload", "") => return Err("upload needs a file path".to_string()),
        ("upload", path) => SessionCommand::Upload(PathBuf::from(path)),
        ("add", raw) => SessionCommand::Add(raw.parse()?),
        ("select", raw) => SessionCommand::Select(
            raw.parse()
                .map_err(|_| format!("select needs a step index, got {raw:?}"))?,
        ),
        ("clear", "") => SessionCommand::Clear,
        ("status", "") => SessionCommand::Status,
        ("wait", "") => SessionCommand::Wait,
        ("help", "") => SessionCommand::Help,
        ("quit" | "exit", "") => SessionCommand::Quit,
        _ => return Err(format!("unrecognized command {line:?} (try help)")),
    };
    Ok(Some(command))
}

fn run_commands(
    input: impl BufRead,
    engine: Arc<dyn Engine>,
    presenter: Arc<dyn Presenter>,
) -> Result<()> {
    let session = Arc::new(Mutex::new(Session::new()));
    let on_applied = Arc::clone(&presenter);
    let mut dispatcher = Dispatcher::new(Arc::clone(&session), Arc::clone(&engine))
        .on_applied(move |current, applied| {
            let Applied::Shown(result) = applied else {
                return;
            };
            let shown = on_applied
                .present(&Frame::from_session(current))
                .and_then(|()| match &result.error {
                    Some(message) => on_applied.notify(message),
                    None => Ok(()),
                });
            if let Err(err) = shown {
                tracing::warn!(error = %err, "failed to present engine result");
            }
        });

    presenter.present(&Frame::from_session(&lock_session(&session)))?;
    for line in input.lines() {
        let line = line.context("read session command")?;
        let command = match parse_command(&line) {
            Ok(Some(command)) => command,
            Ok(None) => continue,
            Err(message) => {
                presenter.notify(&message)?;
                continue;
            }
        };
        tracing::debug!(?command, "session command");
        let flow = execute(
            command,
            &mut dispatcher,
            engine.as_ref(),
            presenter.as_ref(),
        )?;
        if let Flow::Quit = flow {
            break;
        }
    }
    dispatcher.wait_idle();
    Ok(())
}

fn execute(
    command: SessionCommand,
    dispatcher: &mut Dispatcher,
    engine: &dyn Engine,
    presenter: &dyn Presenter,
) -> Result<Flow> {
    match command {
        SessionCommand::Upload(path) => upload(&path, dispatcher, engine, presenter)?,
        SessionCommand::Add(step) => {
            let selection = {
                let mut session = lock_session(dispatcher.session());
                let selection = session.select_step(step);
                presenter.present(&Frame::from_session(&session))?;
                selection
            };
            match selection.index() {
                Some(index) => request(index, dispatcher, presenter)?,
                None => presenter.notify("upload a dataset before selecting steps")?,
            }
        }
        SessionCommand::Select(index) => request(index, dispatcher, presenter)?,
        SessionCommand::Clear => {
            let mut session = lock_session(dispatcher.session());
            session.reset();
            presenter.present(&Frame::from_session(&session))?;
        }
        SessionCommand::Status => {
            presenter.present(&Frame::from_session(&lock_session(dispatcher.session())))?;
            let in_flight = dispatcher.in_flight();
            if in_flight > 0 {
                presenter.notify(&format!("{in_flight} request(s) in flight"))?;
            }
        }
        SessionCommand::Wait => {
            let applied = dispatcher.wait_idle();
            tracing::debug!(responses = applied.len(), "in-flight requests settled");
        }
        SessionCommand::Help => presenter.notify(HELP)?,
        SessionCommand::Quit => return Ok(Flow::Quit),
    }
    Ok(Flow::Continue)
}

/// Upload runs on the command thread; controls stay disabled until it settles.
fn upload(
    path: &Path,
    dispatcher: &Dispatcher,
    engine: &dyn Engine,
    presenter: &dyn Presenter,
) -> Result<()> {
    lock_session(dispatcher.session()).begin_upload();
    let outcome = engine.upload(path);
    let mut session = lock_session(dispatcher.session());
    match outcome {
        Ok(receipt) => {
            session.attach_dataset(receipt);
            presenter.present(&Frame::from_session(&session))
        }
        Err(err) => {
            session.upload_failed();
            presenter.notify(&err.to_string())
        }
    }
}

fn request(index: usize, dispatcher: &mut Dispatcher, presenter: &dyn Presenter) -> Result<()> {
    match dispatcher.dispatch(index) {
        Ok(()) => Ok(()),
        Err(err @ SequencerError::IndexBlocked { .. }) => {
            tracing::debug!(reason = %err, "blocked step selected");
            // Suppressed quietly; the frame shows the cleared display.
            presenter.present(&Frame::from_session(&lock_session(dispatcher.session())))
        }
        Err(err) => presenter.notify(&err.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::fake::FakeEngine;
    use crate::presenter::ResultView;
    use crate::workflow::test_support::RecordingPresenter;
    use std::io::Cursor;

    fn run_script(script: &str) -> (Arc<FakeEngine>, Arc<RecordingPresenter>) {
        let engine = Arc::new(FakeEngine::new());
        let presenter = Arc::new(RecordingPresenter::default());
        run_commands(
            Cursor::new(script.to_string()),
            engine.clone(),
            presenter.clone(),
        )
        .expect("session script");
        (engine, presenter)
    }

    #[test]
    fn parses_commands_and_reports_bad_input() {
        assert_eq!(parse_command("   "), Ok(None));
        assert_eq!(parse_command("# comment"), Ok(None));
        let dataset = PathBuf::from("data/people.csv");
        assert_eq!(
            parse_command("upload data/people.csv"),
            Ok(Some(SessionCommand::Upload(dataset)))
        );
        assert_eq!(
            parse_command("ADD 3nf"),
            Ok(Some(SessionCommand::Add(Step::ThirdNf)))
        );
        assert_eq!(
            parse_command("select 2"),
            Ok(Some(SessionCommand::Select(2)))
        );
        assert_eq!(parse_command("exit"), Ok(Some(SessionCommand::Quit)));
        assert!(parse_command("upload").is_err());
        assert!(parse_command("add bcnf").is_err());
        assert!(parse_command("select two").is_err());
        assert!(parse_command("frobnicate").is_err());
    }

    #[test]
    fn steps_are_inert_until_a_dataset_is_uploaded() {
        let (engine, presenter) = run_script("add clean\nselect 0\nquit\n");
        assert!(engine.calls().is_empty());
        let notices = presenter.notices();
        assert_eq!(notices[0], "upload a dataset before selecting steps");
        assert_eq!(notices[1], "no dataset uploaded");
        assert!(presenter
            .frames()
            .iter()
            .all(|frame| !frame.controls_enabled && frame.nodes.is_empty()));
    }

    #[test]
    fn reverse_step_blocks_its_request() {
        let (engine, presenter) =
            run_script("upload people.csv\nadd clean\nadd 3nf\nadd fd\nwait\nstatus\n");

        let calls = engine.calls();
        assert_eq!(calls.len(), 2, "blocked fd is never sent");
        assert!(calls.iter().all(|call| call.steps.len() <= 2));
        assert!(
            presenter.notices().is_empty(),
            "blocked selection is not reported: {:?}",
            presenter.notices()
        );
        let last = presenter.frames().pop().expect("status frame");
        assert_eq!(last.result, ResultView::Empty);
        assert_eq!(last.blocked_from_index, Some(2));
        assert_eq!(last.advisories.len(), 2);
        assert!(last.nodes[2].blocked);
    }

    #[test]
    fn clear_disables_requests_until_next_upload() {
        let (engine, presenter) = run_script(
            "upload people.csv\nadd clean\nwait\nclear\nselect 0\nupload people.csv\nadd fd\nwait\n",
        );

        let calls = engine.calls();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[1].steps, vec![Step::Fd]);
        assert!(presenter
            .notices()
            .contains(&"no dataset uploaded".to_string()));
        let last = presenter.frames().pop().expect("frame");
        assert!(matches!(
            last.result,
            ResultView::Fragment { step: Step::Fd, .. }
        ));
    }

    #[test]
    fn rejected_upload_is_reported() {
        let (engine, presenter) = run_script("upload notes.txt\nadd clean\n");
        assert!(engine.calls().is_empty());
        let notices = presenter.notices();
        assert!(
            notices[0].contains("please upload a valid CSV file"),
            "{notices:?}"
        );
    }
}
