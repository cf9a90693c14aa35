use futures_util::{stream, Stream};
use std::{pin::Pin, sync::Arc};
use tokio::sync::watch;

/// Distinct connectivity readings, `true` meaning the internet is
/// reachable.
pub type ConnectivityStream = Pin<Box<dyn Stream<Item = bool> + Send>>;

/// A source of device connectivity.
pub trait ConnectivityMonitor: Send + Sync {
    /// Start monitoring. The stream yields the current reading once one
    /// is known, then every change. Dropping it stops the monitoring.
    fn monitor(&self) -> ConnectivityStream;
}

/// A [ConnectivityMonitor] fed by the host application (or a test)
/// through [ConnectivitySignal::report()].
#[derive(Debug, Clone)]
pub struct ConnectivitySignal {
    sender: Arc<watch::Sender<Option<bool>>>,
}

impl Default for ConnectivitySignal {
    fn default() -> Self {
        Self::new()
    }
}

impl ConnectivitySignal {
    pub fn new() -> Self {
        let (sender, _) = watch::channel(None);
        ConnectivitySignal {
            sender: Arc::new(sender),
        }
    }

    pub fn report(&self, available: bool) {
        self.sender.send_replace(Some(available));
    }

    /// The last reported value, `None` before the first report.
    pub fn current(&self) -> Option<bool> {
        *self.sender.borrow()
    }

    /// Number of streams currently monitoring this signal.
    pub fn monitoring_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl ConnectivityMonitor for ConnectivitySignal {
    fn monitor(&self) -> ConnectivityStream {
        let mut receiver = self.sender.subscribe();
        receiver.mark_changed();

        let readings = stream::unfold(
            (receiver, None::<bool>),
            |(mut receiver, last)| async move {
                loop {
                    if receiver.changed().await.is_err() {
                        return None;
                    }
                    let current = *receiver.borrow_and_update();
                    match current {
                        Some(available) if last != Some(available) => {
                            return Some((available, (receiver, Some(available))));
                        }
                        _ => continue,
                    }
                }
            },
        );
        Box::pin(readings)
    }
}
