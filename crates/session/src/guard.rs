//! Session guard: transparent access-token refresh with a single refresh in
//! flight.
//!
//! State machine:
//!
//! ```text
//! Empty ──login──▶ Valid ──expired / 401──▶ ExpiredRefreshing ──ok──▶ Refreshed
//!                                                  │
//!                                                  └──failure──▶ Invalid (terminal until login)
//! ```
//!
//! All reads and writes of the persisted session go through the guard. A
//! caller that finds a refresh already running waits for it on the refresh
//! gate and then re-reads the store instead of refreshing a second time.
//!
//! Login, logout and invalidation bump a session epoch. A refresh that
//! finishes under a different epoch than it started with drops its result, so
//! a logout is never undone and a new login is never overwritten.

use std::future::Future;
use std::sync::{Arc, Mutex as StdMutex, MutexGuard, RwLock};
use std::time::Duration;

use serde::Serialize;
use tokio::sync::Mutex;

use claimdesk_auth::token_expiry;

use crate::clock::{Clock, SystemClock};
use crate::config::SessionConfig;
use crate::error::SessionError;
use crate::refresh::{RefreshError, TokenRefresher};
use crate::session::Session;
use crate::store::SessionStore;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    /// Nothing has been checked or stored yet.
    Empty,
    Valid,
    ExpiredRefreshing,
    Refreshed,
    /// The session was cleared; the user must log in again.
    Invalid,
}

/// Result of one attempt of a guarded request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Attempt<T> {
    Done(T),
    /// The API answered with an authorization failure (401).
    Unauthorized,
}

pub struct SessionGuard {
    store: Arc<dyn SessionStore>,
    refresher: Arc<dyn TokenRefresher>,
    clock: Arc<dyn Clock>,
    refresh_timeout: Duration,
    default_token_ttl: Duration,
    state: RwLock<SessionState>,
    refresh_gate: Mutex<()>,
    /// Held (never across an await) while the stored session is replaced or
    /// destroyed.
    epoch: StdMutex<u64>,
}

impl core::fmt::Debug for SessionGuard {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("SessionGuard")
            .field("state", &self.state())
            .field("refresh_timeout", &self.refresh_timeout)
            .field("default_token_ttl", &self.default_token_ttl)
            .finish_non_exhaustive()
    }
}

impl SessionGuard {
    pub fn new(
        store: Arc<dyn SessionStore>,
        refresher: Arc<dyn TokenRefresher>,
        config: &SessionConfig,
    ) -> Self {
        Self {
            store,
            refresher,
            clock: Arc::new(SystemClock),
            refresh_timeout: config.refresh_timeout,
            default_token_ttl: config.default_token_ttl,
            state: RwLock::new(SessionState::Empty),
            refresh_gate: Mutex::new(()),
            epoch: StdMutex::new(0),
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn state(&self) -> SessionState {
        *self.state.read().unwrap_or_else(|e| e.into_inner())
    }

    fn set_state(&self, next: SessionState) {
        let mut state = self.state.write().unwrap_or_else(|e| e.into_inner());
        if *state != next {
            tracing::debug!(from = ?*state, to = ?next, "session state transition");
            *state = next;
        }
    }

    fn epoch(&self) -> MutexGuard<'_, u64> {
        self.epoch.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Store a freshly issued session (login flow).
    pub fn login(&self, session: Session) -> Result<(), SessionError> {
        {
            let mut epoch = self.epoch();
            self.store.save(&session)?;
            *epoch += 1;
            self.set_state(SessionState::Valid);
        }
        tracing::info!(expires_at = ?session.effective_expiry(), "session established");
        Ok(())
    }

    /// Clear the local session, then ask the auth service to end its side.
    ///
    /// The remote call is best-effort: its failure is logged and local state
    /// is cleared regardless. Only a local store failure is returned.
    pub async fn logout(&self) -> Result<(), SessionError> {
        let previous = self.store.load().ok().flatten();
        let cleared = {
            let mut epoch = self.epoch();
            *epoch += 1;
            self.set_state(SessionState::Invalid);
            self.store.clear()
        };

        if let Some(session) = previous {
            match tokio::time::timeout(self.refresh_timeout, self.refresher.revoke(&session.access_token)).await {
                Ok(Ok(())) => tracing::debug!("remote session ended"),
                Ok(Err(err)) => tracing::warn!(error = %err, "remote logout failed; local session cleared anyway"),
                Err(_elapsed) => tracing::warn!(
                    timeout = ?self.refresh_timeout,
                    "remote logout timed out; local session cleared anyway"
                ),
            }
        }

        cleared?;
        tracing::info!("session cleared by logout");
        Ok(())
    }

    /// Current access token for decorating requests; `None` once invalid.
    pub fn access_token(&self) -> Result<Option<String>, SessionError> {
        if self.state() == SessionState::Invalid {
            return Ok(None);
        }
        Ok(self.store.load()?.map(|s| s.access_token))
    }

    /// Gate for protected views: `true` to render, `false` to redirect to login.
    ///
    /// Refreshes first when the stored expiry has passed. Never errors; every
    /// failure degrades to `false`.
    pub async fn ensure_valid(&self) -> bool {
        match self.check().await {
            Ok(()) => true,
            Err(err) => {
                tracing::info!(error = %err, "protected view requires re-authentication");
                false
            }
        }
    }

    async fn check(&self) -> Result<(), SessionError> {
        if self.state() == SessionState::Invalid {
            return Err(SessionError::SessionInvalid);
        }

        let session = self.load_or_invalidate()?;
        if !session.is_expired(self.clock.now()) {
            self.mark_valid();
            return Ok(());
        }

        self.refresh_expired().await.map(|_| ())
    }

    fn mark_valid(&self) {
        let mut state = self.state.write().unwrap_or_else(|e| e.into_inner());
        if *state == SessionState::Empty {
            *state = SessionState::Valid;
        }
    }

    fn load_or_invalidate(&self) -> Result<Session, SessionError> {
        match self.store.load() {
            Ok(Some(session)) => Ok(session),
            Ok(None) => Err(self.invalidate(SessionError::SessionInvalid)),
            Err(err) => Err(self.invalidate(SessionError::Store(err))),
        }
    }

    /// Refresh path for an expired session.
    async fn refresh_expired(&self) -> Result<String, SessionError> {
        let _gate = self.refresh_gate.lock().await;
        let started = *self.epoch();
        if self.state() == SessionState::Invalid {
            return Err(SessionError::SessionInvalid);
        }

        let session = self.load_or_invalidate()?;
        if !session.is_expired(self.clock.now()) {
            tracing::debug!("session was refreshed by a concurrent caller");
            return Ok(session.access_token);
        }
        self.perform_refresh(session, started).await
    }

    /// Refresh path after the API rejected `stale_token` with a 401.
    ///
    /// If the stored token already differs from `stale_token` and is still
    /// unexpired, a concurrent caller refreshed in the meantime and its token
    /// is returned as is.
    pub async fn refresh_after_unauthorized(&self, stale_token: &str) -> Result<String, SessionError> {
        let _gate = self.refresh_gate.lock().await;
        let started = *self.epoch();
        if self.state() == SessionState::Invalid {
            return Err(SessionError::SessionInvalid);
        }

        let session = self.load_or_invalidate()?;
        if session.access_token != stale_token && !session.is_expired(self.clock.now()) {
            tracing::debug!("access token already replaced by a concurrent refresh");
            return Ok(session.access_token);
        }
        self.perform_refresh(session, started).await
    }

    /// Must be called with the refresh gate held. `started` is the epoch
    /// observed before `session` was loaded.
    async fn perform_refresh(&self, session: Session, started: u64) -> Result<String, SessionError> {
        let refresh_token = {
            let mut epoch = self.epoch();
            if *epoch != started {
                drop(epoch);
                return self.superseded();
            }
            self.set_state(SessionState::ExpiredRefreshing);
            match session.refresh_token.as_deref().filter(|t| !t.is_empty()) {
                Some(token) => token.to_string(),
                None => return Err(self.invalidate_locked(&mut epoch, SessionError::RefreshTokenMissing)),
            }
        };

        tracing::info!("refreshing access token");
        let outcome = tokio::time::timeout(self.refresh_timeout, self.refresher.refresh(&refresh_token)).await;

        let mut epoch = self.epoch();
        if *epoch != started {
            drop(epoch);
            return self.superseded();
        }

        let refreshed = match outcome {
            Ok(Ok(refreshed)) => refreshed,
            Ok(Err(RefreshError::Rejected { status, message })) => {
                return Err(self.invalidate_locked(
                    &mut epoch,
                    SessionError::RefreshTokenInvalid(format!("{status}: {message}")),
                ));
            }
            Ok(Err(RefreshError::Network(msg))) => {
                return Err(self.invalidate_locked(&mut epoch, SessionError::RefreshNetworkError(msg)));
            }
            Ok(Err(RefreshError::InvalidResponse(msg))) => {
                return Err(self.invalidate_locked(
                    &mut epoch,
                    SessionError::RefreshNetworkError(format!("invalid response: {msg}")),
                ));
            }
            Err(_elapsed) => {
                return Err(self.invalidate_locked(&mut epoch, SessionError::RefreshTimeout(self.refresh_timeout)));
            }
        };

        let now = self.clock.now();
        let expires_at = refreshed
            .expiration
            .or_else(|| token_expiry(&refreshed.access_token))
            .unwrap_or_else(|| {
                now + chrono::Duration::from_std(self.default_token_ttl).unwrap_or(chrono::Duration::hours(1))
            });

        let next = Session {
            access_token: refreshed.access_token,
            refresh_token: refreshed.refresh_token.or(session.refresh_token),
            expires_at: Some(expires_at),
        };
        if let Err(err) = self.store.save(&next) {
            return Err(self.invalidate_locked(&mut epoch, SessionError::Store(err)));
        }
        self.set_state(SessionState::Refreshed);
        drop(epoch);

        tracing::info!(%expires_at, "access token refreshed");
        Ok(next.access_token)
    }

    /// A login or logout happened while refreshing; the refresh result is
    /// dropped in favour of whatever the store holds now.
    fn superseded(&self) -> Result<String, SessionError> {
        tracing::info!("session changed during refresh; discarding refresh result");
        self.access_token()?.ok_or(SessionError::SessionInvalid)
    }

    /// Clear every session key and enter `Invalid`; returns `err` for chaining.
    fn invalidate(&self, err: SessionError) -> SessionError {
        let mut epoch = self.epoch();
        self.invalidate_locked(&mut epoch, err)
    }

    fn invalidate_locked(&self, epoch: &mut u64, err: SessionError) -> SessionError {
        *epoch += 1;
        tracing::warn!(error = %err, "session invalidated");
        self.set_state(SessionState::Invalid);
        if let Err(clear_err) = self.store.clear() {
            tracing::warn!(error = %clear_err, "failed to clear session store");
        }
        err
    }

    /// Run a request with the current token, refreshing and retrying exactly
    /// once if it comes back unauthorized.
    ///
    /// `op` receives the bearer token to use. A second `Unauthorized` yields
    /// `SessionError::RetryExhausted`.
    pub async fn run_authorized<T, E, F, Fut>(&self, op: F) -> Result<T, E>
    where
        F: Fn(String) -> Fut,
        Fut: Future<Output = Result<Attempt<T>, E>>,
        E: From<SessionError>,
    {
        self.check().await?;
        let token = self.access_token()?.ok_or(SessionError::SessionInvalid)?;

        match op(token.clone()).await? {
            Attempt::Done(value) => Ok(value),
            Attempt::Unauthorized => {
                tracing::info!("request unauthorized; refreshing before a single retry");
                let fresh = self.refresh_after_unauthorized(&token).await?;
                match op(fresh).await? {
                    Attempt::Done(value) => Ok(value),
                    Attempt::Unauthorized => {
                        tracing::warn!("request still unauthorized after refresh; giving up");
                        Err(SessionError::RetryExhausted.into())
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex as StdMutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use base64::Engine;
    use base64::engine::general_purpose::URL_SAFE_NO_PAD;
    use chrono::{DateTime, TimeZone, Utc};

    use crate::clock::ManualClock;
    use crate::refresh::RefreshedToken;
    use crate::store::InMemorySessionStore;

    struct MockRefresher {
        calls: AtomicUsize,
        seen: StdMutex<Vec<String>>,
        revoked: StdMutex<Vec<String>>,
        delay: Duration,
        result: Result<RefreshedToken, RefreshError>,
        revoke_result: Result<(), RefreshError>,
    }

    impl MockRefresher {
        fn returning(result: Result<RefreshedToken, RefreshError>) -> Self {
            Self {
                calls: AtomicUsize::new(0),
                seen: StdMutex::new(Vec::new()),
                revoked: StdMutex::new(Vec::new()),
                delay: Duration::ZERO,
                result,
                revoke_result: Ok(()),
            }
        }

        fn with_revoke_result(mut self, result: Result<(), RefreshError>) -> Self {
            self.revoke_result = result;
            self
        }

        fn succeeding(access_token: &str, expiration: Option<DateTime<Utc>>) -> Self {
            Self::returning(Ok(RefreshedToken {
                access_token: access_token.to_string(),
                refresh_token: None,
                expiration,
            }))
        }

        fn with_delay(mut self, delay: Duration) -> Self {
            self.delay = delay;
            self
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait::async_trait]
    impl TokenRefresher for MockRefresher {
        async fn refresh(&self, refresh_token: &str) -> Result<RefreshedToken, RefreshError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.seen.lock().unwrap().push(refresh_token.to_string());
            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
            self.result.clone()
        }

        async fn revoke(&self, access_token: &str) -> Result<(), RefreshError> {
            self.revoked.lock().unwrap().push(access_token.to_string());
            self.revoke_result.clone()
        }
    }

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 2, 8, 0, 0).unwrap()
    }

    fn expired_session() -> Session {
        Session::new("access-1", "refresh-1", t0() - chrono::Duration::minutes(1))
    }

    fn live_session() -> Session {
        Session::new("access-1", "refresh-1", t0() + chrono::Duration::minutes(30))
    }

    struct Fixture {
        guard: SessionGuard,
        store: Arc<InMemorySessionStore>,
        refresher: Arc<MockRefresher>,
        clock: Arc<ManualClock>,
    }

    fn fixture_with(session: Option<Session>, refresher: MockRefresher, config: SessionConfig) -> Fixture {
        let store = Arc::new(match session {
            Some(s) => InMemorySessionStore::with_session(s),
            None => InMemorySessionStore::new(),
        });
        let refresher = Arc::new(refresher);
        let clock = Arc::new(ManualClock::new(t0()));
        let guard = SessionGuard::new(store.clone(), refresher.clone(), &config).with_clock(clock.clone());
        Fixture {
            guard,
            store,
            refresher,
            clock,
        }
    }

    fn fixture(session: Option<Session>, refresher: MockRefresher) -> Fixture {
        fixture_with(session, refresher, SessionConfig::default())
    }

    fn jwt_expiring_at(exp: DateTime<Utc>) -> String {
        let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"HS256"}"#);
        let body = URL_SAFE_NO_PAD.encode(format!(r#"{{"exp":{}}}"#, exp.timestamp()));
        format!("{header}.{body}.sig")
    }

    #[tokio::test]
    async fn live_session_passes_without_refresh() {
        let fx = fixture(Some(live_session()), MockRefresher::succeeding("unused", None));

        assert!(fx.guard.ensure_valid().await);
        assert_eq!(fx.refresher.calls(), 0);
        assert_eq!(fx.guard.state(), SessionState::Valid);
    }

    #[tokio::test]
    async fn expired_session_refreshes_once_and_updates_store() {
        let new_expiry = t0() + chrono::Duration::hours(1);
        let fx = fixture(Some(expired_session()), MockRefresher::succeeding("access-2", Some(new_expiry)));

        assert!(fx.guard.ensure_valid().await);
        assert_eq!(fx.refresher.calls(), 1);
        assert_eq!(fx.refresher.seen.lock().unwrap().as_slice(), ["refresh-1"]);
        assert_eq!(fx.guard.state(), SessionState::Refreshed);

        let stored = fx.store.load().unwrap().unwrap();
        assert_eq!(stored.access_token, "access-2");
        assert_eq!(stored.refresh_token.as_deref(), Some("refresh-1"));
        assert_eq!(stored.expires_at, Some(new_expiry));

        // Still valid on the next check: no second refresh.
        assert!(fx.guard.ensure_valid().await);
        assert_eq!(fx.refresher.calls(), 1);
    }

    #[tokio::test]
    async fn expiry_exactly_now_triggers_refresh() {
        let fx = fixture(
            Some(Session::new("access-1", "refresh-1", t0())),
            MockRefresher::succeeding("access-2", Some(t0() + chrono::Duration::hours(1))),
        );

        assert!(fx.guard.ensure_valid().await);
        assert_eq!(fx.refresher.calls(), 1);
    }

    #[tokio::test]
    async fn concurrent_checks_share_a_single_refresh() {
        let refresher = MockRefresher::succeeding("access-2", Some(t0() + chrono::Duration::hours(1)))
            .with_delay(Duration::from_millis(50));
        let fx = fixture(Some(expired_session()), refresher);

        let (a, b) = tokio::join!(fx.guard.ensure_valid(), fx.guard.ensure_valid());

        assert!(a && b);
        assert_eq!(fx.refresher.calls(), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_checks_across_tasks_share_a_single_refresh() {
        let refresher = MockRefresher::succeeding("access-2", Some(t0() + chrono::Duration::hours(1)))
            .with_delay(Duration::from_millis(50));
        let fx = fixture(Some(expired_session()), refresher);
        let guard = Arc::new(fx.guard);

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let guard = Arc::clone(&guard);
                tokio::spawn(async move { guard.ensure_valid().await })
            })
            .collect();

        for handle in handles {
            assert!(handle.await.unwrap());
        }
        assert_eq!(fx.refresher.calls(), 1);
    }

    #[tokio::test]
    async fn refresh_failure_invalidates_and_clears_store() {
        let fx = fixture(
            Some(expired_session()),
            MockRefresher::returning(Err(RefreshError::Network("connection reset".to_string()))),
        );

        assert!(!fx.guard.ensure_valid().await);
        assert_eq!(fx.guard.state(), SessionState::Invalid);
        assert!(fx.store.load().unwrap().is_none());

        // Invalid is terminal: no further refresh attempts.
        assert!(!fx.guard.ensure_valid().await);
        assert_eq!(fx.refresher.calls(), 1);
    }

    #[tokio::test]
    async fn rejected_refresh_token_invalidates() {
        let fx = fixture(
            Some(expired_session()),
            MockRefresher::returning(Err(RefreshError::Rejected {
                status: 401,
                message: "refresh token expired".to_string(),
            })),
        );

        let err = fx.guard.refresh_expired().await.unwrap_err();
        assert!(matches!(err, SessionError::RefreshTokenInvalid(_)));
        assert!(err.requires_login());
        assert_eq!(fx.guard.state(), SessionState::Invalid);
    }

    #[tokio::test]
    async fn missing_refresh_token_invalidates_without_network_call() {
        let session = Session {
            refresh_token: None,
            ..expired_session()
        };
        let fx = fixture(Some(session), MockRefresher::succeeding("unused", None));

        let err = fx.guard.refresh_expired().await.unwrap_err();
        assert!(matches!(err, SessionError::RefreshTokenMissing));
        assert_eq!(fx.refresher.calls(), 0);
        assert!(fx.store.load().unwrap().is_none());
    }

    #[tokio::test]
    async fn empty_store_requires_login() {
        let fx = fixture(None, MockRefresher::succeeding("unused", None));

        assert!(!fx.guard.ensure_valid().await);
        assert_eq!(fx.guard.state(), SessionState::Invalid);
        assert_eq!(fx.refresher.calls(), 0);
    }

    #[tokio::test]
    async fn slow_refresh_times_out() {
        let config = SessionConfig::default().with_refresh_timeout(Duration::from_millis(20));
        let refresher = MockRefresher::succeeding("access-2", None).with_delay(Duration::from_millis(500));
        let fx = fixture_with(Some(expired_session()), refresher, config);

        let err = fx.guard.refresh_expired().await.unwrap_err();
        assert!(matches!(err, SessionError::RefreshTimeout(_)));
        assert_eq!(fx.guard.state(), SessionState::Invalid);
    }

    #[tokio::test]
    async fn refreshed_expiry_falls_back_to_jwt_then_default_ttl() {
        let exp = t0() + chrono::Duration::minutes(15);
        let fx = fixture(Some(expired_session()), MockRefresher::succeeding(&jwt_expiring_at(exp), None));
        assert!(fx.guard.ensure_valid().await);
        assert_eq!(fx.store.load().unwrap().unwrap().expires_at, Some(exp));

        let config = SessionConfig::default().with_default_token_ttl(Duration::from_secs(600));
        let fx = fixture_with(Some(expired_session()), MockRefresher::succeeding("opaque", None), config);
        assert!(fx.guard.ensure_valid().await);
        assert_eq!(
            fx.store.load().unwrap().unwrap().expires_at,
            Some(t0() + chrono::Duration::seconds(600))
        );
    }

    #[tokio::test]
    async fn rotated_refresh_token_is_persisted() {
        let refresher = MockRefresher::returning(Ok(RefreshedToken {
            access_token: "access-2".to_string(),
            refresh_token: Some("refresh-2".to_string()),
            expiration: Some(t0() + chrono::Duration::hours(1)),
        }));
        let fx = fixture(Some(expired_session()), refresher);

        assert!(fx.guard.ensure_valid().await);
        assert_eq!(
            fx.store.load().unwrap().unwrap().refresh_token.as_deref(),
            Some("refresh-2")
        );
    }

    #[tokio::test]
    async fn session_expiring_later_refreshes_when_clock_passes_it() {
        let fx = fixture(
            Some(live_session()),
            MockRefresher::succeeding("access-2", Some(t0() + chrono::Duration::hours(2))),
        );

        assert!(fx.guard.ensure_valid().await);
        assert_eq!(fx.refresher.calls(), 0);

        fx.clock.advance(chrono::Duration::minutes(31));
        assert!(fx.guard.ensure_valid().await);
        assert_eq!(fx.refresher.calls(), 1);
    }

    #[tokio::test]
    async fn logout_then_login_starts_a_new_session() {
        let fx = fixture(Some(live_session()), MockRefresher::succeeding("unused", None));

        fx.guard.logout().await.unwrap();
        assert!(!fx.guard.ensure_valid().await);
        assert_eq!(fx.guard.access_token().unwrap(), None);

        fx.guard.login(live_session()).unwrap();
        assert_eq!(fx.guard.state(), SessionState::Valid);
        assert!(fx.guard.ensure_valid().await);
        assert_eq!(fx.guard.access_token().unwrap().as_deref(), Some("access-1"));
    }

    #[tokio::test]
    async fn unauthorized_request_is_retried_once_with_new_token() {
        let fx = fixture(
            Some(live_session()),
            MockRefresher::succeeding("access-2", Some(t0() + chrono::Duration::hours(1))),
        );
        let tokens = StdMutex::new(Vec::new());

        let result: Result<&str, SessionError> = fx
            .guard
            .run_authorized(|token| {
                tokens.lock().unwrap().push(token.clone());
                async move {
                    if token == "access-2" {
                        Ok(Attempt::Done("approved"))
                    } else {
                        Ok(Attempt::Unauthorized)
                    }
                }
            })
            .await;

        assert_eq!(result.unwrap(), "approved");
        assert_eq!(tokens.lock().unwrap().as_slice(), ["access-1", "access-2"]);
        assert_eq!(fx.refresher.calls(), 1);
    }

    #[tokio::test]
    async fn repeated_unauthorized_is_retry_exhausted() {
        let fx = fixture(
            Some(live_session()),
            MockRefresher::succeeding("access-2", Some(t0() + chrono::Duration::hours(1))),
        );
        let attempts = AtomicUsize::new(0);

        let result: Result<(), SessionError> = fx
            .guard
            .run_authorized(|_token| {
                attempts.fetch_add(1, Ordering::SeqCst);
                async { Ok(Attempt::Unauthorized) }
            })
            .await;

        let err = result.unwrap_err();
        assert!(matches!(err, SessionError::RetryExhausted));
        assert!(!err.requires_login());
        assert_eq!(attempts.load(Ordering::SeqCst), 2);
        assert_eq!(fx.refresher.calls(), 1);
        // The refresh itself succeeded; the session stays usable.
        assert_eq!(fx.guard.state(), SessionState::Refreshed);
    }

    #[tokio::test]
    async fn concurrent_unauthorized_requests_share_a_single_refresh() {
        let refresher = MockRefresher::succeeding("access-2", Some(t0() + chrono::Duration::hours(1)))
            .with_delay(Duration::from_millis(50));
        let fx = fixture(Some(live_session()), refresher);

        let op = |token: String| async move {
            if token == "access-2" {
                Ok::<_, SessionError>(Attempt::Done(token))
            } else {
                Ok(Attempt::Unauthorized)
            }
        };

        let (a, b) = tokio::join!(fx.guard.run_authorized(op), fx.guard.run_authorized(op));

        assert_eq!(a.unwrap(), "access-2");
        assert_eq!(b.unwrap(), "access-2");
        assert_eq!(fx.refresher.calls(), 1);
    }

    #[tokio::test]
    async fn failed_refresh_on_unauthorized_requires_login() {
        let fx = fixture(
            Some(live_session()),
            MockRefresher::returning(Err(RefreshError::Rejected {
                status: 400,
                message: "invalid refresh token".to_string(),
            })),
        );

        let result: Result<(), SessionError> = fx
            .guard
            .run_authorized(|_token| async { Ok(Attempt::Unauthorized) })
            .await;

        let err = result.unwrap_err();
        assert!(err.requires_login());
        assert_eq!(fx.guard.state(), SessionState::Invalid);
        assert!(fx.store.load().unwrap().is_none());
    }

    #[tokio::test]
    async fn logout_during_refresh_is_not_undone() {
        let refresher = MockRefresher::succeeding("access-2", Some(t0() + chrono::Duration::hours(1)))
            .with_delay(Duration::from_millis(100));
        let fx = fixture(Some(expired_session()), refresher);

        let (valid, logged_out) = tokio::join!(fx.guard.ensure_valid(), async {
            tokio::time::sleep(Duration::from_millis(20)).await;
            fx.guard.logout().await
        });

        logged_out.unwrap();
        assert!(!valid);
        assert_eq!(fx.refresher.calls(), 1);
        assert_eq!(fx.guard.state(), SessionState::Invalid);
        assert!(fx.store.load().unwrap().is_none());
        assert_eq!(fx.guard.access_token().unwrap(), None);
    }

    #[tokio::test]
    async fn login_during_refresh_keeps_the_new_session() {
        let refresher = MockRefresher::succeeding("access-2", Some(t0() + chrono::Duration::hours(1)))
            .with_delay(Duration::from_millis(100));
        let fx = fixture(Some(expired_session()), refresher);
        let fresh_login = Session::new("access-login", "refresh-login", t0() + chrono::Duration::hours(8));

        let (valid, logged_in) = tokio::join!(fx.guard.ensure_valid(), async {
            tokio::time::sleep(Duration::from_millis(20)).await;
            fx.guard.login(fresh_login.clone())
        });

        logged_in.unwrap();
        assert!(valid);
        assert_eq!(fx.guard.state(), SessionState::Valid);
        assert_eq!(fx.store.load().unwrap().unwrap(), fresh_login);
    }

    #[tokio::test]
    async fn logout_ends_remote_session_with_current_token() {
        let fx = fixture(Some(live_session()), MockRefresher::succeeding("unused", None));

        fx.guard.logout().await.unwrap();

        assert_eq!(fx.refresher.revoked.lock().unwrap().as_slice(), ["access-1"]);
        assert_eq!(fx.guard.state(), SessionState::Invalid);
        assert!(fx.store.load().unwrap().is_none());
    }

    #[tokio::test]
    async fn logout_clears_locally_when_remote_logout_fails() {
        let refresher = MockRefresher::succeeding("unused", None)
            .with_revoke_result(Err(RefreshError::Network("connection refused".to_string())));
        let fx = fixture(Some(live_session()), refresher);

        fx.guard.logout().await.unwrap();

        assert_eq!(fx.refresher.revoked.lock().unwrap().len(), 1);
        assert_eq!(fx.guard.state(), SessionState::Invalid);
        assert!(fx.store.load().unwrap().is_none());
    }

    #[tokio::test]
    async fn logout_without_stored_session_skips_remote_call() {
        let fx = fixture(None, MockRefresher::succeeding("unused", None));

        fx.guard.logout().await.unwrap();

        assert!(fx.refresher.revoked.lock().unwrap().is_empty());
        assert_eq!(fx.guard.state(), SessionState::Invalid);
    }

    #[tokio::test]
    async fn replaced_but_expired_token_is_refreshed_after_unauthorized() {
        let fx = fixture(
            Some(expired_session()),
            MockRefresher::succeeding("access-2", Some(t0() + chrono::Duration::hours(1))),
        );

        let token = fx.guard.refresh_after_unauthorized("access-0").await.unwrap();

        assert_eq!(token, "access-2");
        assert_eq!(fx.refresher.calls(), 1);
    }

    #[tokio::test]
    async fn replaced_live_token_is_reused_after_unauthorized() {
        let fx = fixture(Some(live_session()), MockRefresher::succeeding("unused", None));

        let token = fx.guard.refresh_after_unauthorized("access-0").await.unwrap();

        assert_eq!(token, "access-1");
        assert_eq!(fx.refresher.calls(), 0);
    }
}
