use std::io::BufRead;
use std::time::Duration;

use kanal::{AsyncReceiver, AsyncSender, Sender};
use tokio_util::sync::CancellationToken;

use crate::events::ConsoleEvent;
use crate::input::parse_command;

/// Read console lines on a dedicated thread; blocking stdin never sits on
/// the runtime
pub fn spawn_stdin_reader(events: AsyncSender<ConsoleEvent>, output: AsyncSender<String>) {
    let events = events.to_sync();
    let output = output.to_sync();

    std::thread::spawn(move || {
        let stdin = std::io::stdin();
        forward_lines(stdin.lock(), &events, &output);
    });
}

/// Parse each line into a command event; usage errors go straight to the
/// output. Ends with `InputClosed` at end of input.
pub fn forward_lines(reader: impl BufRead, events: &Sender<ConsoleEvent>, output: &Sender<String>) {
    for line in reader.lines() {
        let line = match line {
            Ok(line) => line,
            Err(e) => {
                tracing::error!("stdin read failed: {}", e);
                break;
            }
        };

        let sent = match parse_command(&line) {
            Ok(Some(command)) => events.send(ConsoleEvent::Command(command)).is_ok(),
            Ok(None) => true,
            Err(message) => output.send(format!("error: {message}")).is_ok(),
        };
        if !sent {
            return;
        }
    }

    tracing::info!("Console input closed");
    if events.send(ConsoleEvent::InputClosed).is_err() {
        tracing::debug!("view is gone, input close not delivered");
    }
}

/// Print view output until cancelled, then flush whatever is queued
pub async fn output_loop(output: AsyncReceiver<String>, cancel: CancellationToken) -> anyhow::Result<()> {
    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            line = output.recv() => println!("{}", line?),
        }
    }

    while let Ok(Some(line)) = output.try_recv() {
        println!("{line}");
    }
    Ok(())
}

/// Housekeeping ticks for notification expiry
pub async fn tick_loop(
    period: Duration,
    events: AsyncSender<ConsoleEvent>,
    cancel: CancellationToken,
) -> anyhow::Result<()> {
    let mut interval = tokio::time::interval(period);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = interval.tick() => events.send(ConsoleEvent::Tick).await?,
        }
    }

    tracing::debug!("tick loop stopping");
    Ok(())
}
