use std::panic::{catch_unwind, AssertUnwindSafe};

use crate::settings::Settings;

/// Opaque handle returned by [`SettingsBroadcaster::subscribe`], used to
/// remove the subscription later.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubscriptionHandle(u64);

/// Registry of display surfaces interested in settings changes.
///
/// Subscribers are data, not a class hierarchy: each is a boxed closure
/// that receives the new settings snapshot. The registry lives for the
/// application lifetime and is torn down deterministically when dropped.
pub struct SettingsBroadcaster {
    handlers: Vec<(u64, Box<dyn FnMut(&Settings)>)>,
    next_id: u64,
}

impl SettingsBroadcaster {
    pub fn new() -> Self {
        Self {
            handlers: Vec::new(),
            next_id: 0,
        }
    }

    /// Register a handler. Handlers are invoked in subscription order.
    pub fn subscribe<F>(&mut self, handler: F) -> SubscriptionHandle
    where
        F: FnMut(&Settings) + 'static,
    {
        let id = self.next_id;
        self.next_id += 1;
        self.handlers.push((id, Box::new(handler)));
        SubscriptionHandle(id)
    }

    /// Remove a subscription. Returns false if the handle was already
    /// removed (or never existed).
    pub fn unsubscribe(&mut self, handle: SubscriptionHandle) -> bool {
        let before = self.handlers.len();
        self.handlers.retain(|(id, _)| *id != handle.0);
        self.handlers.len() != before
    }

    /// Invoke every current handler synchronously, in subscription order,
    /// with the same snapshot. A panicking handler is logged and skipped;
    /// the remaining handlers still run.
    pub fn publish(&mut self, settings: &Settings) {
        for (id, handler) in &mut self.handlers {
            if catch_unwind(AssertUnwindSafe(|| handler(settings))).is_err() {
                log::error!("settings subscriber {id} panicked during publish");
            }
        }
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

impl Default for SettingsBroadcaster {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn test_publish_in_subscription_order() {
        let mut broadcaster = SettingsBroadcaster::new();
        let order = Rc::new(RefCell::new(Vec::new()));
        for i in 0..3 {
            let order = Rc::clone(&order);
            broadcaster.subscribe(move |_| order.borrow_mut().push(i));
        }
        broadcaster.publish(&Settings::default());
        assert_eq!(*order.borrow(), vec![0, 1, 2]);
    }

    #[test]
    fn test_panicking_handler_is_isolated() {
        let mut broadcaster = SettingsBroadcaster::new();
        let seen = Rc::new(RefCell::new(Vec::new()));

        let s = Rc::clone(&seen);
        broadcaster.subscribe(move |_| s.borrow_mut().push("first"));
        broadcaster.subscribe(|_| panic!("display surface blew up"));
        let s = Rc::clone(&seen);
        broadcaster.subscribe(move |_| s.borrow_mut().push("last"));

        broadcaster.publish(&Settings::default());
        assert_eq!(*seen.borrow(), vec!["first", "last"]);
    }

    #[test]
    fn test_handler_receives_snapshot() {
        let mut broadcaster = SettingsBroadcaster::new();
        let seen = Rc::new(RefCell::new(None));
        let s = Rc::clone(&seen);
        broadcaster.subscribe(move |settings| *s.borrow_mut() = Some(settings.clone()));

        let mut settings = Settings::default();
        settings.opacity = 0.25;
        broadcaster.publish(&settings);
        assert_eq!(seen.borrow().as_ref().unwrap().opacity, 0.25);
    }

    #[test]
    fn test_unsubscribe() {
        let mut broadcaster = SettingsBroadcaster::new();
        let count = Rc::new(RefCell::new(0));

        let c = Rc::clone(&count);
        let handle = broadcaster.subscribe(move |_| *c.borrow_mut() += 1);
        assert_eq!(broadcaster.len(), 1);

        assert!(broadcaster.unsubscribe(handle));
        assert!(!broadcaster.unsubscribe(handle));
        assert!(broadcaster.is_empty());

        broadcaster.publish(&Settings::default());
        assert_eq!(*count.borrow(), 0);
    }

    #[test]
    fn test_publish_invokes_each_handler_exactly_once() {
        let mut broadcaster = SettingsBroadcaster::new();
        let count = Rc::new(RefCell::new(0));
        let c = Rc::clone(&count);
        broadcaster.subscribe(move |_| *c.borrow_mut() += 1);

        broadcaster.publish(&Settings::default());
        assert_eq!(*count.borrow(), 1);
        broadcaster.publish(&Settings::default());
        assert_eq!(*count.borrow(), 2);
    }
}
