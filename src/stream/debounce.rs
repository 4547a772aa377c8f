//! Stream debouncing

use futures::{Stream, ready};
use pin_project_lite::pin_project;
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::Duration;
use tokio::time::{Instant, Sleep, sleep};

/// Extension trait to add debouncing to any Stream
pub trait DebounceExt: Stream {
    /// Emit an item only once the stream has been quiet for `window`
    ///
    /// Uses "latest-wins" semantics - every new item replaces the pending one
    /// and restarts the quiet window. A pending item is flushed immediately
    /// when the inner stream ends.
    fn debounce(self, window: Duration) -> Debounce<Self>
    where
        Self: Sized,
    {
        Debounce::new(self, window)
    }
}

impl<T: Stream> DebounceExt for T {}

pin_project! {
    /// A stream combinator that collapses bursts into their latest item
    pub struct Debounce<S: Stream> {
        #[pin]
        stream: S,
        #[pin]
        sleep: Sleep,
        window: Duration,
        pending: Option<S::Item>,
        done: bool,
    }
}

impl<S: Stream> Debounce<S> {
    /// Create a new debounced stream
    pub fn new(stream: S, window: Duration) -> Self {
        Self { stream, sleep: sleep(window), window, pending: None, done: false }
    }

    /// Whether an item is waiting for the quiet window to elapse
    pub fn has_pending(&self) -> bool {
        self.pending.is_some()
    }
}

impl<S: Stream> Stream for Debounce<S> {
    type Item = S::Item;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let mut this = self.project();

        // Drain everything available; each item restarts the window
        while !*this.done {
            match this.stream.as_mut().poll_next(cx) {
                Poll::Ready(Some(item)) => {
                    *this.pending = Some(item);
                    this.sleep.as_mut().reset(Instant::now() + *this.window);
                }
                Poll::Ready(None) => *this.done = true,
                Poll::Pending => break,
            }
        }

        if this.pending.is_none() {
            return if *this.done { Poll::Ready(None) } else { Poll::Pending };
        }
        if *this.done {
            return Poll::Ready(this.pending.take());
        }

        ready!(this.sleep.poll(cx));
        Poll::Ready(this.pending.take())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::StreamExt;
    use tokio::sync::mpsc;
    use tokio_stream::wrappers::UnboundedReceiverStream;

    const WINDOW: Duration = Duration::from_millis(600);

    #[tokio::test(start_paused = true)]
    async fn burst_collapses_to_latest() {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut debounced = Box::pin(UnboundedReceiverStream::new(rx).debounce(WINDOW));

        tokio::spawn(async move {
            for i in 0..5 {
                tx.send(i).unwrap();
                tokio::time::sleep(Duration::from_millis(100)).await;
            }
            tokio::time::sleep(Duration::from_secs(10)).await;
        });

        let start = Instant::now();
        assert_eq!(debounced.next().await, Some(4));
        // last item at 400ms, then one full quiet window
        assert_eq!(start.elapsed(), Duration::from_millis(1000));
    }

    #[tokio::test(start_paused = true)]
    async fn quiet_gaps_emit_each_item() {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut debounced = Box::pin(UnboundedReceiverStream::new(rx).debounce(WINDOW));

        tx.send("a").unwrap();
        assert_eq!(debounced.next().await, Some("a"));
        tx.send("b").unwrap();
        assert_eq!(debounced.next().await, Some("b"));
    }

    #[tokio::test(start_paused = true)]
    async fn pending_item_flushes_on_end() {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut debounced = Box::pin(UnboundedReceiverStream::new(rx).debounce(WINDOW));

        tx.send(1).unwrap();
        tx.send(2).unwrap();
        drop(tx);

        let start = Instant::now();
        assert_eq!(debounced.next().await, Some(2));
        assert_eq!(start.elapsed(), Duration::ZERO);
        assert_eq!(debounced.next().await, None);
    }

    #[tokio::test(start_paused = true)]
    async fn dropping_cancels_pending_item() {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut debounced = Box::pin(UnboundedReceiverStream::new(rx).debounce(WINDOW));

        tx.send(1).unwrap();
        let early = tokio::time::timeout(Duration::from_millis(100), debounced.next()).await;
        assert!(early.is_err());
        assert!(debounced.has_pending());
        drop(debounced);
        // the sender sees the receiver gone, nothing was emitted
        assert!(tx.send(2).is_err());
    }
}
