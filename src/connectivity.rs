/// Connectivity indicator fed by periodic probes of the telemetry store
use log::{info, warn};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{interval, Duration, MissedTickBehavior};

use crate::remote::RemoteStore;

/// Status icon name and color for the connectivity state. Unknown shows as offline.
pub fn connectivity_icon(connected: Option<bool>) -> (&'static str, &'static str) {
    if connected == Some(true) {
        ("wifi-arrow-up-down", "#4CAF50")
    } else {
        ("wifi-off", "#F44336")
    }
}

/// Probe the store every `period` and publish the state when it changes.
pub fn watch_connectivity(
    store: RemoteStore,
    period: Duration,
) -> (watch::Receiver<Option<bool>>, JoinHandle<()>) {
    let (tx, rx) = watch::channel(None);

    let handle = tokio::spawn(async move {
        let mut ticker = interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            let connected = store.is_reachable().await;
            let changed = tx.send_if_modified(|state| {
                if *state == Some(connected) {
                    return false;
                }
                *state = Some(connected);
                true
            });
            if changed {
                if connected {
                    info!("Telemetry store reachable");
                } else {
                    warn!("Telemetry store unreachable");
                }
            }
            if tx.is_closed() {
                break;
            }
        }
    });

    (rx, handle)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn icons() {
        assert_eq!(connectivity_icon(Some(true)).0, "wifi-arrow-up-down");
        assert_eq!(connectivity_icon(Some(false)), ("wifi-off", "#F44336"));
        assert_eq!(connectivity_icon(None).0, "wifi-off");
    }

    #[tokio::test]
    async fn reports_reachable_store() {
        let mut server = mockito::Server::new_async().await;
        let _probe = server
            .mock("GET", "/.info/connected.json")
            .with_status(200)
            .with_body("true")
            .create_async()
            .await;
        let store = RemoteStore::new(&server.url(), None).unwrap();

        let (mut rx, handle) = watch_connectivity(store, Duration::from_secs(60));
        tokio::time::timeout(Duration::from_secs(5), rx.changed())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(*rx.borrow(), Some(true));
        handle.abort();
    }

    #[tokio::test]
    async fn reports_unreachable_store() {
        let store = RemoteStore::new("http://127.0.0.1:9", None).unwrap();
        let (mut rx, handle) = watch_connectivity(store, Duration::from_secs(60));
        tokio::time::timeout(Duration::from_secs(15), rx.changed())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(*rx.borrow(), Some(false));
        handle.abort();
    }
}
