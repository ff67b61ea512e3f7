//! One-shot device commands: snapshot, stream, arm, disarm, mode.

use std::io::IsTerminal;
use std::sync::Arc;
use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};

use arlo_core::{Action, ClientConfig, CommandDispatcher, CommandResult, SessionManager};

use crate::cli::GlobalOpts;
use crate::error::CliError;
use crate::output;

fn detail(result: &CommandResult) -> String {
    match result {
        CommandResult::SnapshotReady { url, timestamp } => {
            format!("Snapshot: {url}\nTaken:    {timestamp}")
        }
        CommandResult::StreamReady { url, timestamp } => {
            format!("Stream:   {url}\nStarted:  {timestamp}")
        }
        CommandResult::ArmAck => "Armed".into(),
        CommandResult::DisarmAck => "Disarmed".into(),
        CommandResult::ModeInfo { mode, schedule } => {
            let schedule = if schedule.is_empty() { "-" } else { schedule };
            format!("Mode:     {mode}\nSchedule: {schedule}")
        }
        CommandResult::Failure { reason, message } => format!("{reason}: {message}"),
    }
}

fn plain(result: &CommandResult) -> String {
    match result {
        CommandResult::SnapshotReady { url, .. } | CommandResult::StreamReady { url, .. } => {
            url.clone()
        }
        CommandResult::ArmAck => "armed".into(),
        CommandResult::DisarmAck => "disarmed".into(),
        CommandResult::ModeInfo { mode, .. } => mode.clone(),
        CommandResult::Failure { message, .. } => message.clone(),
    }
}

fn spinner(action: Action, device: &str, quiet: bool) -> Option<ProgressBar> {
    if quiet || !std::io::stderr().is_terminal() {
        return None;
    }
    let pb = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::with_template("{spinner} {msg}") {
        pb.set_style(style);
    }
    pb.set_message(format!("{action} {device}"));
    pb.enable_steady_tick(Duration::from_millis(100));
    Some(pb)
}

pub async fn handle(
    config: &ClientConfig,
    device: &str,
    action: Action,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let dispatcher = CommandDispatcher::new(Arc::new(SessionManager::from_config(config)));

    let progress = spinner(action, device, global.quiet);
    let result = dispatcher.execute(device, action, true).await;
    if let Some(pb) = progress {
        pb.finish_and_clear();
    }

    let result = result.ok_or_else(|| CliError::Internal(format!("{action} produced no result")))?;
    if let CommandResult::Failure { reason, message } = result {
        return Err(CliError::from_failure(reason, message));
    }

    let out = output::render_single(global.output, &result, detail, plain)?;
    output::print_output(&out, global.quiet);
    Ok(())
}
