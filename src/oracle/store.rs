//! Observable interaction store
//!
//! A cheap-to-clone, single-threaded handle. Every action mutates the state,
//! releases its borrow, then notifies subscribers with a snapshot.
//!
//! Each fetch carries a request token. `reset_ball` bumps the latest token,
//! so a request that resolves after a reset is discarded instead of
//! overwriting the fresh idle state.

use std::cell::RefCell;
use std::rc::Rc;

use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

use super::fallback::CLIENT_FALLBACKS;
use super::state::InteractionState;
use crate::api::PredictionRequest;
use crate::client::{FetchError, PredictionSource};

/// Length of the per-call session identifier
const SESSION_ID_LEN: usize = 7;
const BASE36: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// Handle returned by [`OracleStore::subscribe`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

/// An outstanding request, as issued by [`OracleStore::begin_fetch`]
#[derive(Debug, Clone, PartialEq)]
pub struct FetchTicket {
    pub token: u64,
    pub request: PredictionRequest,
}

type Subscriber = Box<dyn FnMut(&InteractionState)>;

#[derive(Default)]
struct Subscribers {
    list: Vec<(SubscriptionId, Subscriber)>,
    /// A notification pass is running; its callbacks are out of `list`
    notifying: bool,
    /// Ids whose callbacks are out of `list` during the current pass
    in_flight: Vec<SubscriptionId>,
    /// In-flight ids unsubscribed during the current pass
    removed: Vec<SubscriptionId>,
    /// State changed during the pass; deliver again afterwards
    pending: bool,
}

struct Inner {
    state: InteractionState,
    rng: Pcg32,
    /// Token of the most recent request whose result may still be applied
    latest_token: u64,
    next_subscription: u64,
}

/// Injectable interaction store
#[derive(Clone)]
pub struct OracleStore {
    inner: Rc<RefCell<Inner>>,
    subscribers: Rc<RefCell<Subscribers>>,
}

impl OracleStore {
    /// Create a store at the idle baseline. `seed` drives session ids and
    /// fallback selection.
    pub fn new(seed: u64) -> Self {
        Self {
            inner: Rc::new(RefCell::new(Inner {
                state: InteractionState::default(),
                rng: Pcg32::seed_from_u64(seed),
                latest_token: 0,
                next_subscription: 1,
            })),
            subscribers: Rc::new(RefCell::new(Subscribers::default())),
        }
    }

    /// Snapshot of the current state
    pub fn state(&self) -> InteractionState {
        self.inner.borrow().state.clone()
    }

    /// Register a callback run after every action.
    ///
    /// Callbacks may call store actions. The resulting state is delivered to
    /// every subscriber once the current pass ends, so the last snapshot each
    /// one sees matches the store. Subscriptions added from inside a callback
    /// start receiving updates from the next pass.
    pub fn subscribe<F>(&self, callback: F) -> SubscriptionId
    where
        F: FnMut(&InteractionState) + 'static,
    {
        let id = {
            let mut inner = self.inner.borrow_mut();
            let id = SubscriptionId(inner.next_subscription);
            inner.next_subscription += 1;
            id
        };
        self.subscribers.borrow_mut().list.push((id, Box::new(callback)));
        id
    }

    /// Remove a subscription. Returns false if it was not registered.
    ///
    /// Safe to call from inside a callback, including the callback being
    /// removed; it is not called again.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut subs = self.subscribers.borrow_mut();
        let before = subs.list.len();
        subs.list.retain(|(sid, _)| *sid != id);
        if subs.list.len() != before {
            return true;
        }
        if subs.in_flight.contains(&id) && !subs.removed.contains(&id) {
            subs.removed.push(id);
            return true;
        }
        false
    }

    pub fn start_shake(&self) {
        self.update(|state| {
            state.shaking = true;
            state.response = None;
            state.fallback_used = false;
        });
    }

    pub fn stop_shake(&self) {
        self.update(|state| state.shaking = false);
    }

    pub fn set_response(&self, text: impl Into<String>) {
        let text = text.into();
        self.update(|state| {
            state.response = Some(text);
            state.loading = false;
        });
    }

    pub fn set_loading(&self, loading: bool) {
        self.update(|state| state.loading = loading);
    }

    /// Store the trimmed question; blank text clears it
    pub fn set_question(&self, text: &str) {
        let question = normalize_question(Some(text));
        self.update(|state| state.question = question);
    }

    /// Return to the idle baseline and invalidate any outstanding request
    pub fn reset_ball(&self) {
        {
            let mut inner = self.inner.borrow_mut();
            inner.latest_token += 1;
            inner.state = InteractionState::default();
        }
        log::debug!("Ball reset");
        self.notify();
    }

    /// Mark the store as loading and issue a ticket for a new request
    pub fn begin_fetch(&self, question: Option<&str>) -> FetchTicket {
        let ticket = {
            let mut inner = self.inner.borrow_mut();
            inner.latest_token += 1;
            inner.state.loading = true;
            let session_id = session_id(&mut inner.rng);
            FetchTicket {
                token: inner.latest_token,
                request: PredictionRequest {
                    timestamp: crate::now_millis(),
                    session_id,
                    question: normalize_question(question),
                },
            }
        };
        log::debug!(
            "Fetch {} started (session {})",
            ticket.token,
            ticket.request.session_id
        );
        self.notify();
        ticket
    }

    /// Apply the outcome of a request.
    ///
    /// Returns false, leaving the state untouched, when the ticket was
    /// superseded by a reset or a newer request. Otherwise stores either the
    /// prediction or a fallback string, ending both loading and shaking.
    pub fn complete_fetch(&self, ticket: &FetchTicket, result: Result<String, FetchError>) -> bool {
        {
            let mut inner = self.inner.borrow_mut();
            if ticket.token != inner.latest_token {
                log::debug!(
                    "Discarding stale fetch {} (latest {})",
                    ticket.token,
                    inner.latest_token
                );
                return false;
            }

            let (text, fallback_used) = match result {
                Ok(text) if !text.trim().is_empty() => (text.trim().to_string(), false),
                Ok(_) => {
                    log::warn!("Empty prediction, using fallback");
                    (CLIENT_FALLBACKS.pick(&mut inner.rng).to_string(), true)
                }
                Err(err) => {
                    log::warn!("Error fetching prediction: {err}");
                    (CLIENT_FALLBACKS.pick(&mut inner.rng).to_string(), true)
                }
            };

            let state = &mut inner.state;
            state.response = Some(text);
            state.fallback_used = fallback_used;
            state.loading = false;
            state.shaking = false;
        }
        log::debug!("Fetch {} completed", ticket.token);
        self.notify();
        true
    }

    /// Issue exactly one request and apply its result.
    ///
    /// Callers must not invoke this while a shake or request is already in
    /// progress. Returns whether the result was applied.
    pub async fn fetch_response<S>(&self, source: &S, question: Option<&str>) -> bool
    where
        S: PredictionSource + ?Sized,
    {
        let ticket = self.begin_fetch(question);
        let result = source.predict(&ticket.request).await;
        self.complete_fetch(&ticket, result)
    }

    fn update(&self, mutate: impl FnOnce(&mut InteractionState)) {
        mutate(&mut self.inner.borrow_mut().state);
        self.notify();
    }

    /// Deliver the current state to every subscriber.
    ///
    /// Nested calls from inside a callback only mark the pass as pending; the
    /// outermost call loops until a pass completes with no further changes.
    fn notify(&self) {
        {
            let mut subs = self.subscribers.borrow_mut();
            if subs.notifying {
                subs.pending = true;
                return;
            }
            subs.notifying = true;
        }

        loop {
            let snapshot = self.state();
            let mut active = {
                let mut subs = self.subscribers.borrow_mut();
                let active = std::mem::take(&mut subs.list);
                subs.in_flight = active.iter().map(|(id, _)| *id).collect();
                active
            };

            for (id, callback) in active.iter_mut() {
                if self.subscribers.borrow().removed.contains(id) {
                    continue;
                }
                callback(&snapshot);
            }

            let mut subs = self.subscribers.borrow_mut();
            let removed = std::mem::take(&mut subs.removed);
            active.retain(|(id, _)| !removed.contains(id));
            active.append(&mut subs.list);
            subs.list = active;
            subs.in_flight.clear();

            if !std::mem::take(&mut subs.pending) {
                subs.notifying = false;
                break;
            }
        }
    }
}

fn normalize_question(question: Option<&str>) -> Option<String> {
    question
        .map(str::trim)
        .filter(|q| !q.is_empty())
        .map(str::to_string)
}

fn session_id<R: Rng>(rng: &mut R) -> String {
    (0..SESSION_ID_LEN)
        .map(|_| BASE36[rng.random_range(0..BASE36.len())] as char)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::oracle::Mode;
    use async_trait::async_trait;
    use std::cell::Cell;

    /// Answers from a fixed script
    struct Scripted(Result<String, FetchError>);

    #[async_trait(?Send)]
    impl PredictionSource for Scripted {
        async fn predict(&self, _request: &PredictionRequest) -> Result<String, FetchError> {
            self.0.clone()
        }
    }

    /// Resets the store while the request is in flight
    struct ResetsMidFlight(OracleStore);

    #[async_trait(?Send)]
    impl PredictionSource for ResetsMidFlight {
        async fn predict(&self, _request: &PredictionRequest) -> Result<String, FetchError> {
            self.0.reset_ball();
            Ok("Too late".to_string())
        }
    }

    #[test]
    fn test_start_shake_clears_response() {
        let store = OracleStore::new(1);
        store.set_response("Old answer");
        store.start_shake();
        let state = store.state();
        assert!(state.shaking);
        assert_eq!(state.response, None);
        assert_eq!(state.mode(), Mode::Shaking);
    }

    #[test]
    fn test_set_response_clears_loading() {
        let store = OracleStore::new(1);
        store.set_loading(true);
        store.set_response("Yes");
        let state = store.state();
        assert!(!state.loading);
        assert_eq!(state.mode(), Mode::Responding);
    }

    #[test]
    fn test_set_question_trims_and_clears() {
        let store = OracleStore::new(1);
        store.set_question("  Will it rain?  ");
        assert_eq!(store.state().question.as_deref(), Some("Will it rain?"));
        store.set_question("   ");
        assert_eq!(store.state().question, None);
    }

    #[test]
    fn test_reset_returns_to_baseline() {
        let store = OracleStore::new(1);
        store.set_question("Why?");
        store.start_shake();
        store.begin_fetch(Some("Why?"));
        store.reset_ball();
        let state = store.state();
        assert!(state.is_baseline());
        assert_eq!(state.mode(), Mode::Idle);
    }

    #[test]
    fn test_begin_fetch_builds_request() {
        let store = OracleStore::new(3);
        let ticket = store.begin_fetch(Some("  Should I?  "));
        assert!(store.state().loading);
        assert_eq!(ticket.request.question.as_deref(), Some("Should I?"));
        assert_eq!(ticket.request.session_id.len(), SESSION_ID_LEN);
        assert!(
            ticket
                .request
                .session_id
                .bytes()
                .all(|b| b.is_ascii_digit() || b.is_ascii_lowercase())
        );
        assert!(ticket.request.timestamp > 0);

        let next = store.begin_fetch(None);
        assert!(next.token > ticket.token);
        assert_eq!(next.request.question, None);
    }

    #[test]
    fn test_stale_ticket_is_discarded_after_reset() {
        let store = OracleStore::new(5);
        store.start_shake();
        let ticket = store.begin_fetch(None);
        store.reset_ball();

        let applied = store.complete_fetch(&ticket, Ok("Late answer".to_string()));
        assert!(!applied);
        assert!(store.state().is_baseline());
    }

    #[test]
    fn test_error_substitutes_fallback() {
        let store = OracleStore::new(9);
        store.start_shake();
        let ticket = store.begin_fetch(None);
        assert!(store.complete_fetch(&ticket, Err(FetchError::Status(500))));

        let state = store.state();
        let response = state.response.clone().unwrap();
        assert!(CLIENT_FALLBACKS.contains(&response));
        assert!(state.fallback_used);
        assert!(!state.loading);
        assert!(!state.shaking);
        assert_eq!(state.mode(), Mode::Responding);
    }

    #[test]
    fn test_fallback_selection_is_seeded() {
        let pick = |seed| {
            let store = OracleStore::new(seed);
            let ticket = store.begin_fetch(None);
            store.complete_fetch(&ticket, Err(FetchError::Transport("down".into())));
            store.state().response.unwrap()
        };
        assert_eq!(pick(42), pick(42));
    }

    #[test]
    fn test_subscribers_see_each_action() {
        let store = OracleStore::new(1);
        let seen = Rc::new(Cell::new(0));
        let last_shaking = Rc::new(Cell::new(false));

        let id = {
            let seen = seen.clone();
            let last_shaking = last_shaking.clone();
            store.subscribe(move |state| {
                seen.set(seen.get() + 1);
                last_shaking.set(state.shaking);
            })
        };

        store.start_shake();
        assert_eq!(seen.get(), 1);
        assert!(last_shaking.get());

        store.stop_shake();
        assert_eq!(seen.get(), 2);
        assert!(!last_shaking.get());

        assert!(store.unsubscribe(id));
        assert!(!store.unsubscribe(id));
        store.reset_ball();
        assert_eq!(seen.get(), 2);
    }

    #[test]
    fn test_subscriber_may_call_actions() {
        let store = OracleStore::new(1);
        let handle = store.clone();
        store.subscribe(move |state| {
            if state.response.is_some() && state.question.is_some() {
                handle.set_question("");
            }
        });
        store.set_question("Now?");
        store.set_response("Yes");
        assert_eq!(store.state().question, None);
    }

    #[test]
    fn test_later_subscribers_see_state_changed_by_earlier_callback() {
        let store = OracleStore::new(1);
        let handle = store.clone();
        store.subscribe(move |state| {
            if state.question.is_some() {
                handle.set_question("");
            }
        });

        let last_question = Rc::new(RefCell::new(None::<Option<String>>));
        {
            let last_question = last_question.clone();
            store.subscribe(move |state| {
                *last_question.borrow_mut() = Some(state.question.clone());
            });
        }

        store.set_question("Now?");
        assert_eq!(store.state().question, None);
        assert_eq!(*last_question.borrow(), Some(None));
    }

    #[test]
    fn test_callback_may_unsubscribe_itself() {
        let store = OracleStore::new(1);
        let calls = Rc::new(Cell::new(0));
        let own_id = Rc::new(Cell::new(None::<SubscriptionId>));
        let removed = Rc::new(Cell::new(false));

        let id = {
            let handle = store.clone();
            let calls = calls.clone();
            let own_id = own_id.clone();
            let removed = removed.clone();
            store.subscribe(move |_| {
                calls.set(calls.get() + 1);
                if let Some(id) = own_id.get() {
                    removed.set(handle.unsubscribe(id));
                }
            })
        };
        own_id.set(Some(id));

        store.start_shake();
        store.stop_shake();
        assert!(removed.get());
        assert_eq!(calls.get(), 1);
        assert!(!store.unsubscribe(id));
    }

    #[test]
    fn test_unsubscribing_a_later_subscriber_mid_pass_skips_it() {
        let store = OracleStore::new(1);
        let later_calls = Rc::new(Cell::new(0));
        let later_id = Rc::new(Cell::new(None::<SubscriptionId>));

        {
            let handle = store.clone();
            let later_id = later_id.clone();
            store.subscribe(move |_| {
                if let Some(id) = later_id.get() {
                    handle.unsubscribe(id);
                }
            });
        }
        let id = {
            let later_calls = later_calls.clone();
            store.subscribe(move |_| later_calls.set(later_calls.get() + 1))
        };
        later_id.set(Some(id));

        store.start_shake();
        store.stop_shake();
        assert_eq!(later_calls.get(), 0);
    }

    #[tokio::test(flavor = "current_thread")]
    async fn test_shake_fetch_resolves_to_responding_on_success() {
        let store = OracleStore::new(11);
        store.start_shake();
        let applied = store
            .fetch_response(&Scripted(Ok("It is certain".to_string())), None)
            .await;
        assert!(applied);

        let state = store.state();
        assert_eq!(state.mode(), Mode::Responding);
        assert_eq!(state.response.as_deref(), Some("It is certain"));
        assert!(!state.fallback_used);
    }

    #[tokio::test(flavor = "current_thread")]
    async fn test_shake_fetch_resolves_to_responding_on_failure() {
        for err in [
            FetchError::Transport("refused".into()),
            FetchError::Status(503),
            FetchError::Malformed("missing prediction".into()),
        ] {
            let store = OracleStore::new(13);
            store.start_shake();
            store.fetch_response(&Scripted(Err(err)), Some("Q")).await;
            let state = store.state();
            assert_eq!(state.mode(), Mode::Responding);
            let response = state.response.unwrap();
            assert!(!response.is_empty());
        }
    }

    #[tokio::test(flavor = "current_thread")]
    async fn test_blank_prediction_falls_back() {
        let store = OracleStore::new(17);
        store
            .fetch_response(&Scripted(Ok("   ".to_string())), None)
            .await;
        let state = store.state();
        assert!(state.fallback_used);
        assert!(CLIENT_FALLBACKS.contains(state.response.as_deref().unwrap()));
    }

    #[tokio::test(flavor = "current_thread")]
    async fn test_reset_mid_flight_discards_late_result() {
        let store = OracleStore::new(19);
        store.start_shake();
        let applied = store
            .fetch_response(&ResetsMidFlight(store.clone()), None)
            .await;
        assert!(!applied);
        assert!(store.state().is_baseline());
    }
}
