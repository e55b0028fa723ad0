use std::time::Duration;

use kanal::{AsyncReceiver, AsyncSender};
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

use crate::events::ConsoleEvent;
use crate::io::{output_loop, spawn_stdin_reader, tick_loop};
use crate::view::{ConsoleView, view_loop};

/// Centralized channel management
pub struct ChannelSet {
    pub events: (AsyncSender<ConsoleEvent>, AsyncReceiver<ConsoleEvent>),
    pub output: (AsyncSender<String>, AsyncReceiver<String>),
}

impl ChannelSet {
    pub fn new() -> Self {
        Self {
            events: kanal::bounded_async(64),   // input, responses, ticks
            output: kanal::bounded_async(256),  // rendered pages and toasts
        }
    }
}

impl Default for ChannelSet {
    fn default() -> Self {
        Self::new()
    }
}

/// Console controller for task spawning and lifecycle
pub struct ConsoleController {
    channels: ChannelSet,
    cancel_token: CancellationToken,
}

impl ConsoleController {
    pub fn new() -> Self {
        Self {
            channels: ChannelSet::new(),
            cancel_token: CancellationToken::new(),
        }
    }

    pub fn events_tx(&self) -> AsyncSender<ConsoleEvent> {
        self.channels.events.0.clone()
    }

    pub fn output_tx(&self) -> AsyncSender<String> {
        self.channels.output.0.clone()
    }

    pub fn spawn_tasks(&self, view: ConsoleView, tick: Duration, poll: bool) -> JoinSet<anyhow::Result<()>> {
        let mut tasks = JoinSet::new();

        // View loop
        tasks.spawn(view_loop(
            view,
            self.channels.events.1.clone(),
            self.cancel_token.clone(),
            poll,
        ));

        // Output
        tasks.spawn(output_loop(
            self.channels.output.1.clone(),
            self.cancel_token.child_token(),
        ));

        // Notification expiry
        tasks.spawn(tick_loop(
            tick,
            self.channels.events.0.clone(),
            self.cancel_token.child_token(),
        ));

        spawn_stdin_reader(self.events_tx(), self.output_tx());

        tasks
    }

    pub fn shutdown(&self) {
        self.cancel_token.cancel();
    }
}

impl Default for ConsoleController {
    fn default() -> Self {
        Self::new()
    }
}
