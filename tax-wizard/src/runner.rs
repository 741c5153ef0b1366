//! Line-oriented driver that feeds commands and task completions into a
//! [`WizardSession`] and prints the rendered wizard after every change.

use std::{io::Write, time::Duration};

use anyhow::{Context, Result};
use tokio::{
    io::{AsyncBufRead, AsyncBufReadExt},
    sync::mpsc::UnboundedReceiver,
    time::{Instant, sleep_until},
};
use tracing::{debug, info, warn};

use crate::command::{self, Command, HELP};
use crate::logging;
use crate::session::WizardSession;
use crate::tasks::TaskReport;
use crate::view;

enum Flow {
    Continue,
    Quit,
}

/// Runs until `quit` or end of input. Task completions that arrive while
/// waiting for input are applied and re-rendered immediately.
pub async fn run<R, W>(
    session: &mut WizardSession,
    events: &mut UnboundedReceiver<TaskReport>,
    input: R,
    out: &mut W,
) -> Result<()>
where
    R: AsyncBufRead + Unpin,
    W: Write,
{
    let mut lines = input.lines();
    print_view(session, out)?;

    loop {
        tokio::select! {
            biased;
            Some(report) = events.recv() => {
                debug!(?report, "task report");
                session.apply_event(report);
                print_view(session, out)?;
            }
            line = lines.next_line() => {
                let Some(line) = line.context("failed to read input")? else {
                    info!("end of input");
                    break;
                };
                if let Flow::Quit = handle_line(session, events, &line, out).await? {
                    break;
                }
            }
        }
    }

    let pending = session.pending_tasks();
    if pending > 0 {
        info!(pending, "exiting with simulated tasks still running; their results are discarded");
        writeln!(out, "{pending} background task(s) still running were discarded")?;
    }
    out.flush()?;
    Ok(())
}

async fn handle_line<W: Write>(
    session: &mut WizardSession,
    events: &mut UnboundedReceiver<TaskReport>,
    line: &str,
    out: &mut W,
) -> Result<Flow> {
    let command = match command::parse(line) {
        Ok(command) => command,
        Err(e) => {
            writeln!(out, "error: {e}")?;
            return Ok(Flow::Continue);
        }
    };

    match command {
        Command::Empty => {}
        Command::Action(action) => match session.dispatch(action) {
            Ok(()) => print_view(session, out)?,
            Err(e) => {
                warn!(error = %e, "action rejected");
                writeln!(out, "error: {e}")?;
            }
        },
        Command::Download(label) => match session.download_summary(&label) {
            Ok(path) => writeln!(out, "Summary saved to {}", path.display())?,
            Err(e) => writeln!(out, "error: {e}")?,
        },
        Command::Wait(duration) => {
            wait(session, events, duration).await;
            print_view(session, out)?;
        }
        Command::SetLogLevel(filter) => match logging::set_log_level(&filter) {
            Ok(()) => writeln!(out, "Log filter set to '{filter}'")?,
            Err(e) => writeln!(out, "error: {e:#}")?,
        },
        Command::Show => print_view(session, out)?,
        Command::Help => writeln!(out, "{HELP}")?,
        Command::Quit => return Ok(Flow::Quit),
    }
    Ok(Flow::Continue)
}

/// Sleeps for `duration`, applying task events as they complete.
async fn wait(
    session: &mut WizardSession,
    events: &mut UnboundedReceiver<TaskReport>,
    duration: Duration,
) {
    let deadline = Instant::now() + duration;
    loop {
        tokio::select! {
            _ = sleep_until(deadline) => break,
            Some(report) = events.recv() => session.apply_event(report),
        }
    }
}

fn print_view<W: Write>(
    session: &WizardSession,
    out: &mut W,
) -> Result<()> {
    writeln!(out, "{}", view::render(session))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::WizardConfig;
    use crate::step::Step;

    async fn run_script(script: &str) -> (WizardSession, String) {
        let (mut session, mut events) = WizardSession::new(&WizardConfig::default()).unwrap();
        let mut out = Vec::new();
        run(&mut session, &mut events, script.as_bytes(), &mut out)
            .await
            .unwrap();
        (session, String::from_utf8(out).unwrap())
    }

    #[tokio::test(start_paused = true)]
    async fn bad_commands_are_reported_and_skipped() {
        let (session, output) = run_script("fly\nnext\nemail a@b.co\n").await;

        assert!(output.contains("error: unknown command 'fly'"));
        assert_eq!(session.step(), Step::Registration);
        assert_eq!(session.registration().email, "a@b.co");
    }

    #[tokio::test(start_paused = true)]
    async fn quit_stops_before_remaining_lines() {
        let (session, _) = run_script("quit\nemail a@b.co\n").await;

        assert_eq!(session.registration().email, "");
    }

    #[tokio::test(start_paused = true)]
    async fn wait_lets_identity_check_finish() {
        let script = "verify document\nupload-id\nwait 2000\ncode 123456\n";
        let (session, output) = run_script(script).await;

        assert!(session.record().verification.is_verified());
        assert!(!output.contains("error:"));
    }

    #[tokio::test(start_paused = true)]
    async fn exit_reports_unfinished_tasks() {
        let (session, output) = run_script("verify document\nupload-id\nquit\n").await;

        assert_eq!(session.pending_tasks(), 1);
        assert!(output.contains("1 background task(s) still running were discarded"));
    }

    #[tokio::test(start_paused = true)]
    async fn exit_without_pending_tasks_is_quiet() {
        let (_, output) = run_script("show\n").await;

        assert!(!output.contains("still running"));
    }

    #[tokio::test(start_paused = true)]
    async fn help_lists_commands() {
        let (_, output) = run_script("help\n").await;

        assert!(output.contains("Navigation:"));
    }
}
