//! Display preferences shared by every calculator on a page.
//!
//! One [`PreferenceHandle`] owns the current value; each widget holds a
//! [`PreferenceSubscription`] and re-renders when it reports a change.
//! Nothing here touches the numbers a calculator produces.

use serde::{Deserialize, Serialize};
use tokio::sync::watch;

use crate::types::{Currency, Money};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScheduleView {
    Monthly,
    #[default]
    Yearly,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisplayPreferences {
    #[serde(default)]
    pub currency: Currency,
    #[serde(default)]
    pub schedule_view: ScheduleView,
}

impl DisplayPreferences {
    pub fn format_amount(&self, amount: Money) -> String {
        self.currency.display(amount)
    }
}

/// Owner of the shared preferences. Cloning yields another writer.
#[derive(Debug, Clone)]
pub struct PreferenceHandle {
    tx: watch::Sender<DisplayPreferences>,
}

impl PreferenceHandle {
    pub fn new(initial: DisplayPreferences) -> Self {
        let (tx, _rx) = watch::channel(initial);
        Self { tx }
    }

    pub fn current(&self) -> DisplayPreferences {
        self.tx.borrow().clone()
    }

    pub fn set_currency(&self, currency: Currency) {
        self.update(|prefs| {
            if prefs.currency == currency {
                false
            } else {
                prefs.currency = currency;
                true
            }
        });
    }

    pub fn set_schedule_view(&self, view: ScheduleView) {
        self.update(|prefs| {
            let changed = prefs.schedule_view != view;
            prefs.schedule_view = view;
            changed
        });
    }

    /// Apply `f`; subscribers are only notified when it returns `true`.
    pub fn update(&self, f: impl FnOnce(&mut DisplayPreferences) -> bool) {
        let changed = self.tx.send_if_modified(f);
        if changed {
            let prefs = self.current();
            tracing::debug!(?prefs, "display preferences changed");
        }
    }

    pub fn subscribe(&self) -> PreferenceSubscription {
        PreferenceSubscription {
            rx: self.tx.subscribe(),
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for PreferenceHandle {
    fn default() -> Self {
        Self::new(DisplayPreferences::default())
    }
}

/// A widget's view of the shared preferences.
#[derive(Debug, Clone)]
pub struct PreferenceSubscription {
    rx: watch::Receiver<DisplayPreferences>,
}

impl PreferenceSubscription {
    /// True when a change has not been seen yet through [`Self::latest`].
    /// Stays false once every handle has been dropped.
    pub fn has_changed(&self) -> bool {
        self.rx.has_changed().unwrap_or(false)
    }

    /// Current value, marking it as seen.
    pub fn latest(&mut self) -> DisplayPreferences {
        self.rx.borrow_and_update().clone()
    }

    /// Current value without marking it as seen.
    pub fn peek(&self) -> DisplayPreferences {
        self.rx.borrow().clone()
    }

    /// Wait for the next change. Returns `None` once every handle is gone.
    pub async fn changed(&mut self) -> Option<DisplayPreferences> {
        self.rx.changed().await.ok()?;
        Some(self.latest())
    }
}
