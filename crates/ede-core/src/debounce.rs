use std::time::Duration;

use kanal::AsyncSender;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Forward only the last value of each burst, once `delay` has passed
/// without a newer one. Pending input is dropped when the input closes.
pub async fn debounce<T, U, F>(
    mut input: mpsc::UnboundedReceiver<T>,
    delay: Duration,
    output: AsyncSender<U>,
    wrap: F,
) where
    F: Fn(T) -> U,
{
    let mut pending: Option<T> = None;

    loop {
        if pending.is_none() {
            match input.recv().await {
                Some(value) => pending = Some(value),
                None => return,
            }
            continue;
        }

        tokio::select! {
            next = input.recv() => match next {
                Some(value) => pending = Some(value),
                None => return,
            },
            _ = tokio::time::sleep(delay) => {
                if let Some(value) = pending.take()
                    && output.send(wrap(value)).await.is_err()
                {
                    return;
                }
            }
        }
    }
}

/// Handle to a running debounce task; dropping it stops the task
pub struct Debouncer<T> {
    input: mpsc::UnboundedSender<T>,
    task: JoinHandle<()>,
}

impl<T: Send + 'static> Debouncer<T> {
    pub fn spawn<U, F>(delay: Duration, output: AsyncSender<U>, wrap: F) -> Self
    where
        U: Send + 'static,
        F: Fn(T) -> U + Send + 'static,
    {
        let (input, rx) = mpsc::unbounded_channel();
        let task = tokio::spawn(debounce(rx, delay, output, wrap));
        Self { input, task }
    }

    pub fn push(&self, value: T) {
        if self.input.send(value).is_err() {
            tracing::warn!("debounce task is gone, input dropped");
        }
    }
}

impl<T> Drop for Debouncer<T> {
    fn drop(&mut self) {
        self.task.abort();
    }
}
