//! Realtime watch: print each change notification as a JSON line.

use serde_json::json;
use tokio::sync::mpsc;
use tracing::{info, warn};

use foundation_core::{ConnectionState, Foundation};

use crate::cli::{GlobalOpts, OutputFormat, WatchArgs};
use crate::error::CliError;
use crate::output;

pub async fn handle(client: &Foundation, args: WatchArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let (tx, mut rx) = mpsc::unbounded_channel();
    client.subscribe(move |event, data, error| {
        let line = json!({
            "event": event,
            "data": data,
            "error": error.map(ToString::to_string),
        });
        let _ = tx.send(line);
    });

    let Some(mut state) = client.connection_state() else {
        return Err(CliError::RealtimeFailed);
    };

    // Pretty JSON would split one notification over many lines.
    let format = match global.output {
        OutputFormat::Json => OutputFormat::JsonCompact,
        other => other,
    };

    let mut seen = 0_usize;
    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                info!("interrupted");
                break;
            }
            changed = state.changed() => {
                if changed.is_err() {
                    break;
                }
                let current = *state.borrow_and_update();
                info!(state = ?current, "realtime connection");
                if current == ConnectionState::Failed {
                    warn!("realtime loop gave up");
                    client.unsubscribe();
                    return Err(CliError::RealtimeFailed);
                }
            }
            Some(line) = rx.recv() => {
                output::print_line(&output::render(format, &line))?;
                seen += 1;
                if args.count.is_some_and(|limit| seen >= limit) {
                    break;
                }
            }
        }
    }

    client.unsubscribe();
    client.shutdown();
    Ok(())
}
