use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::constants::{ALERT_SLIDE_OUT_MS, ALERT_VISIBLE_MS};

/// Transient banners the page can raise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AlertKind {
    WalletMissing,
    NoTokenBalance,
}

impl AlertKind {
    pub fn title(&self) -> &'static str {
        match self {
            AlertKind::WalletMissing => "No Ethereum Wallet detected",
            AlertKind::NoTokenBalance => "No USDT Balance Found",
        }
    }

    pub fn detail(&self) -> &'static str {
        match self {
            AlertKind::WalletMissing => "Please install MetaMask or Trust Wallet",
            AlertKind::NoTokenBalance => "You need USDT tokens to proceed",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "wallet-missing" => Some(AlertKind::WalletMissing),
            "no-token-balance" => Some(AlertKind::NoTokenBalance),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertPhase {
    Hidden,
    Visible,
    SlidingOut,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AlertTiming {
    pub visible: Duration,
    pub slide_out: Duration,
}

impl Default for AlertTiming {
    fn default() -> Self {
        Self {
            visible: Duration::from_millis(ALERT_VISIBLE_MS),
            slide_out: Duration::from_millis(ALERT_SLIDE_OUT_MS),
        }
    }
}

/// hidden -> visible -> sliding_out -> hidden, timer driven.
///
/// At most one timer task is alive per banner. It is aborted when the banner
/// is re-shown, dismissed, hidden, or dropped, so a stale timer never writes
/// a phase after its banner moved on.
pub struct AlertBanner {
    kind: AlertKind,
    timing: AlertTiming,
    phase: Arc<watch::Sender<AlertPhase>>,
    timer: Mutex<Option<JoinHandle<()>>>,
}

impl AlertBanner {
    pub fn new(kind: AlertKind, timing: AlertTiming) -> Self {
        let (phase, _) = watch::channel(AlertPhase::Hidden);
        Self {
            kind,
            timing,
            phase: Arc::new(phase),
            timer: Mutex::new(None),
        }
    }

    pub fn kind(&self) -> AlertKind {
        self.kind
    }

    pub fn phase(&self) -> AlertPhase {
        *self.phase.borrow()
    }

    pub fn is_shown(&self) -> bool {
        self.phase() != AlertPhase::Hidden
    }

    pub fn subscribe(&self) -> watch::Receiver<AlertPhase> {
        self.phase.subscribe()
    }

    /// Shows the banner and restarts its auto-hide countdown.
    pub fn show(&self) {
        let mut timer = self.timer_slot();
        abort(&mut timer);
        self.phase.send_replace(AlertPhase::Visible);
        tracing::debug!("Alert {:?} shown", self.kind);

        let phase = self.phase.clone();
        let timing = self.timing;
        *timer = Some(tokio::spawn(async move {
            tokio::time::sleep(timing.visible).await;
            phase.send_replace(AlertPhase::SlidingOut);
            tokio::time::sleep(timing.slide_out).await;
            phase.send_replace(AlertPhase::Hidden);
        }));
    }

    /// Starts the slide-out right away; the auto-hide countdown is cancelled.
    pub fn dismiss(&self) {
        let mut timer = self.timer_slot();
        match self.phase() {
            AlertPhase::Hidden => {}
            AlertPhase::SlidingOut => {
                // Keep the running slide-out timer.
                if timer.as_ref().map_or(true, JoinHandle::is_finished) {
                    self.phase.send_replace(AlertPhase::Hidden);
                }
            }
            AlertPhase::Visible => {
                abort(&mut timer);
                self.phase.send_replace(AlertPhase::SlidingOut);
                tracing::debug!("Alert {:?} dismissed", self.kind);

                let phase = self.phase.clone();
                let slide_out = self.timing.slide_out;
                *timer = Some(tokio::spawn(async move {
                    tokio::time::sleep(slide_out).await;
                    phase.send_replace(AlertPhase::Hidden);
                }));
            }
        }
    }

    /// Hides immediately without animation.
    pub fn hide(&self) {
        let mut timer = self.timer_slot();
        abort(&mut timer);
        self.phase.send_replace(AlertPhase::Hidden);
    }

    fn timer_slot(&self) -> MutexGuard<'_, Option<JoinHandle<()>>> {
        self.timer.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Drop for AlertBanner {
    fn drop(&mut self) {
        let timer = self
            .timer
            .get_mut()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        abort(timer);
    }
}

fn abort(timer: &mut Option<JoinHandle<()>>) {
    if let Some(handle) = timer.take() {
        handle.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn banner() -> AlertBanner {
        AlertBanner::new(AlertKind::WalletMissing, AlertTiming::default())
    }

    async fn advance_ms(ms: u64) {
        tokio::time::sleep(Duration::from_millis(ms)).await;
    }

    #[test]
    fn kinds_round_trip_through_route_names() {
        for kind in [AlertKind::WalletMissing, AlertKind::NoTokenBalance] {
            let name = serde_json::to_value(kind).expect("serialize");
            assert_eq!(AlertKind::parse(name.as_str().expect("string")), Some(kind));
        }
        assert_eq!(AlertKind::parse("other"), None);
    }

    #[tokio::test(start_paused = true)]
    async fn auto_hide_follows_visible_then_slide_out() {
        let banner = banner();
        assert_eq!(banner.phase(), AlertPhase::Hidden);

        banner.show();
        assert_eq!(banner.phase(), AlertPhase::Visible);

        advance_ms(1999).await;
        assert_eq!(banner.phase(), AlertPhase::Visible);

        advance_ms(2).await;
        assert_eq!(banner.phase(), AlertPhase::SlidingOut);

        advance_ms(500).await;
        assert_eq!(banner.phase(), AlertPhase::Hidden);
    }

    #[tokio::test(start_paused = true)]
    async fn dismiss_cancels_the_countdown() {
        let banner = banner();
        let mut phases = banner.subscribe();
        banner.show();

        advance_ms(1000).await;
        banner.dismiss();
        assert_eq!(banner.phase(), AlertPhase::SlidingOut);

        advance_ms(501).await;
        assert_eq!(banner.phase(), AlertPhase::Hidden);

        phases.borrow_and_update();
        advance_ms(5000).await;
        assert_eq!(banner.phase(), AlertPhase::Hidden);
        assert!(!phases.has_changed().expect("sender alive"));
    }

    #[tokio::test(start_paused = true)]
    async fn reshow_restarts_the_timer() {
        let banner = banner();
        banner.show();
        advance_ms(1500).await;
        banner.show();

        advance_ms(1000).await;
        assert_eq!(banner.phase(), AlertPhase::Visible);
        advance_ms(1001).await;
        assert_eq!(banner.phase(), AlertPhase::SlidingOut);
    }

    #[tokio::test(start_paused = true)]
    async fn dismiss_while_sliding_out_keeps_the_running_timer() {
        let banner = banner();
        banner.show();
        advance_ms(2100).await;
        assert_eq!(banner.phase(), AlertPhase::SlidingOut);

        banner.dismiss();
        assert_eq!(banner.phase(), AlertPhase::SlidingOut);
        advance_ms(401).await;
        assert_eq!(banner.phase(), AlertPhase::Hidden);
    }

    #[tokio::test(start_paused = true)]
    async fn dropping_the_banner_aborts_its_timer() {
        let banner = banner();
        let mut phases = banner.subscribe();
        banner.show();
        phases.borrow_and_update();
        drop(banner);

        advance_ms(3000).await;
        // The sender went away with the banner and nothing was published.
        assert!(phases.has_changed().is_err());
        assert_eq!(*phases.borrow(), AlertPhase::Visible);
    }

    #[tokio::test(start_paused = true)]
    async fn hide_is_immediate() {
        let banner = banner();
        banner.show();
        banner.hide();
        assert!(!banner.is_shown());
        advance_ms(3000).await;
        assert_eq!(banner.phase(), AlertPhase::Hidden);
    }
}
