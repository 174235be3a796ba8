//! Spinner on stderr driven by the store's loading and operation events.

use std::io::{self, IsTerminal};
use std::time::Duration;

use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};

use dbmon_core::{EventKind, InstanceStore, StoreEvent, Subscription};

/// Shows a spinner while anything in the store is pending.
///
/// Detaches its handlers and clears the line on drop.
pub struct Spinner<'a> {
    store: &'a InstanceStore,
    bar: ProgressBar,
    subscriptions: Vec<Subscription>,
}

impl<'a> Spinner<'a> {
    pub fn attach(store: &'a InstanceStore, quiet: bool) -> Self {
        let bar = ProgressBar::new_spinner();
        if quiet || !io::stderr().is_terminal() {
            bar.set_draw_target(ProgressDrawTarget::hidden());
        }
        if let Ok(style) = ProgressStyle::with_template("{spinner:.cyan} {msg}") {
            bar.set_style(style);
        }

        let on_loading = {
            let bar = bar.clone();
            store.subscribe(EventKind::Loading, move |event| {
                if let StoreEvent::Loading {
                    target, loading, ..
                } = event
                {
                    if *loading {
                        bar.set_message(format!("loading {target}"));
                        bar.enable_steady_tick(Duration::from_millis(100));
                    } else if !event.state().loading.any() {
                        bar.disable_steady_tick();
                        bar.set_message("");
                    }
                }
            })
        };

        let on_operation = {
            let bar = bar.clone();
            store.subscribe(EventKind::Operation, move |event| {
                let state = event.state();
                if state.operations.is_idle() {
                    bar.disable_steady_tick();
                    bar.set_message("");
                } else if state.operations.collection_busy() {
                    bar.set_message("syncing all accounts");
                    bar.enable_steady_tick(Duration::from_millis(100));
                } else {
                    bar.set_message("syncing");
                    bar.enable_steady_tick(Duration::from_millis(100));
                }
            })
        };

        Self {
            store,
            bar,
            subscriptions: vec![on_loading, on_operation],
        }
    }
}

impl Drop for Spinner<'_> {
    fn drop(&mut self) {
        for subscription in &self.subscriptions {
            self.store.unsubscribe(subscription);
        }
        self.bar.finish_and_clear();
    }
}
