use std::time::Duration;

use clap::Subcommand;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::time::MissedTickBehavior;
use tracing::debug;

use agendaroom_core::Event;

use crate::session::{print_events, print_json, CliResult, Session};

#[derive(Subcommand)]
pub enum TimerAction {
    /// Start the current item and keep ticking until Ctrl-C or the meeting ends
    Run,
    /// Complete the current item and select the next one
    Next,
    /// Stop the current item early (same as next outside of `run`)
    Stop,
    /// Print current timer state as JSON
    Status,
    /// Catch the timer up with the wall clock
    Sync,
}

pub fn run(action: TimerAction) -> CliResult {
    let mut session = Session::open()?;

    match action {
        TimerAction::Run => {
            let runtime = tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()?;
            runtime.block_on(drive(&mut session))?;
        }
        TimerAction::Next => {
            let events = session.engine.next_agenda();
            finish_step(&session, &events)?;
        }
        TimerAction::Stop => {
            let events = session.engine.stop_timer();
            finish_step(&session, &events)?;
        }
        TimerAction::Status => {
            print_json(&session.engine.snapshot())?;
        }
        TimerAction::Sync => {
            // Timer state is not persisted, so a fresh process has nothing to
            // catch up; this still reports where the meeting stands.
            let events = session.engine.sync_time();
            print_events(&events)?;
            print_json(&session.engine.snapshot())?;
        }
    }

    session.save()?;
    Ok(())
}

fn finish_step(session: &Session, events: &[Event]) -> CliResult {
    if events.is_empty() {
        println!("No change: nothing to advance");
        return Ok(());
    }
    print_events(events)?;
    session.record_completed(events)
}

fn is_completion(events: &[Event]) -> bool {
    events
        .iter()
        .any(|e| matches!(e, Event::MeetingCompleted { .. }))
}

/// A line typed while `timer run` is active.
#[derive(Debug, PartialEq, Eq)]
enum LiveCommand {
    /// Finish the current item early.
    Next,
    /// Pause, or resume when paused.
    Toggle,
    Quit,
}

impl LiveCommand {
    fn parse(line: &str) -> Option<Self> {
        match line.trim() {
            "n" | "next" => Some(Self::Next),
            "p" | "pause" | "resume" => Some(Self::Toggle),
            "q" | "quit" => Some(Self::Quit),
            _ => None,
        }
    }
}

/// Drive the engine from a tokio interval until the meeting completes or
/// the user quits. Lines on stdin control the run: `n`, `p`, `q`.
async fn drive(session: &mut Session) -> CliResult {
    match session.engine.start_timer() {
        Some(event) => print_events(&[event])?,
        None if session.engine.is_running() => {}
        None => return Err("nothing to run: no current meeting or pending agenda item".into()),
    }
    session.save()?;

    let period = Duration::from_millis(session.config.timer.tick_interval_ms.max(50));
    let mut ticker = tokio::time::interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdin_open = true;

    loop {
        let events = tokio::select! {
            _ = ticker.tick() => {
                let mut events = session.engine.tick();
                events.extend(session.engine.run_scheduled());
                events
            }
            line = lines.next_line(), if stdin_open => {
                let Some(line) = line? else {
                    stdin_open = false;
                    continue;
                };
                let command = LiveCommand::parse(&line);
                debug!(?command, "live command");
                match command {
                    Some(LiveCommand::Next) => {
                        // Fold the time since the last tick in before finishing.
                        let mut events = session.engine.tick();
                        events.extend(session.engine.stop_timer());
                        events
                    }
                    Some(LiveCommand::Toggle) if session.engine.is_running() => {
                        let mut events = session.engine.tick();
                        events.extend(session.engine.pause_timer());
                        events
                    }
                    Some(LiveCommand::Toggle) => {
                        session.engine.cancel_scheduled();
                        session.engine.start_timer().into_iter().collect()
                    }
                    Some(LiveCommand::Quit) => break,
                    None => {
                        eprintln!("commands: n (next), p (pause/resume), q (quit)");
                        continue;
                    }
                }
            }
            res = &mut ctrl_c => {
                res?;
                break;
            }
        };
        if events.is_empty() {
            continue;
        }
        print_events(&events)?;
        session.save()?;
        if is_completion(&events) {
            session.record_completed(&events)?;
            return Ok(());
        }
    }

    // Account for the partial interval before pausing.
    let mut events = session.engine.tick();
    events.extend(session.engine.pause_timer());
    print_events(&events)?;
    session.save()?;
    if is_completion(&events) {
        session.record_completed(&events)?;
    }
    Ok(())
}
