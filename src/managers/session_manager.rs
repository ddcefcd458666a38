// SessionManager: Focused manager for concurrent tracking sessions
//
// Single Responsibility: Session registry, frame routing and record fan-out
//
// Every session owns its own state behind its own mutex. The registry lock
// is held only long enough to look a session up, so frames for different
// sessions never wait on each other.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, RwLock};
use std::time::Duration;

use serde::Serialize;
use tokio::sync::broadcast;

use crate::analysis::frame::RawAngles;
use crate::analysis::{FeedbackRecord, Session, SessionSnapshot};
use crate::clock::{Clock, MonotonicClock};
use crate::config::AppConfig;
use crate::error::{log_session_error, SessionError, ValidationError};
use crate::profile::ThresholdPreset;

/// Capacity of the record broadcast channel
const RECORD_CHANNEL_CAPACITY: usize = 256;

/// A processed frame tagged with the session it belongs to
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionEvent {
    pub session_id: String,
    pub record: FeedbackRecord,
}

type SharedSession<C> = Arc<Mutex<Session<C>>>;

/// Manages independent exercise-tracking sessions
///
/// This manager handles:
/// - Creating sessions from the configured or requested exercise profile
/// - Routing frames to the right session
/// - Switching exercises (which resets that session)
/// - Publishing every FeedbackRecord on a broadcast channel
///
/// # Example
/// ```ignore
/// let manager = SessionManager::new(AppConfig::default());
/// let mut rx = manager.subscribe();
/// manager.start_session("user-1", None)?;
/// let record = manager.process_frame("user-1", &angles)?;
/// manager.end_session("user-1")?;
/// ```
pub struct SessionManager<C: Clock + Clone = MonotonicClock> {
    config: AppConfig,
    clock: C,
    sessions: RwLock<HashMap<String, SharedSession<C>>>,
    records: broadcast::Sender<SessionEvent>,
}

impl SessionManager<MonotonicClock> {
    pub fn new(config: AppConfig) -> Self {
        Self::with_clock(config, MonotonicClock::new())
    }
}

impl<C: Clock + Clone> SessionManager<C> {
    /// Create a manager whose sessions all read `clock`
    pub fn with_clock(config: AppConfig, clock: C) -> Self {
        let (records, _) = broadcast::channel(RECORD_CHANNEL_CAPACITY);
        Self {
            config,
            clock,
            sessions: RwLock::new(HashMap::new()),
            records,
        }
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Subscribe to records from every session
    ///
    /// Subscribers that fall more than the channel capacity behind lose the
    /// oldest records.
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.records.subscribe()
    }

    /// Start tracking a new session
    ///
    /// # Arguments
    /// * `session_id` - Caller-chosen id, unique among active sessions
    /// * `exercise` - Exercise name; `None` uses the configured default
    ///
    /// # Errors
    /// - Session id already active
    /// - Exercise resolves to no profile, or the profile is invalid
    pub fn start_session(
        &self,
        session_id: &str,
        exercise: Option<&str>,
    ) -> Result<SessionSnapshot, SessionError> {
        let exercise = exercise.unwrap_or(self.config.session.exercise.as_str());
        let profile = self
            .config
            .resolve_profile(exercise, self.config.session.preset)
            .map_err(|err| self.report(err.into(), "start_session"))?;

        let mut sessions = self.write_sessions()?;
        if sessions.contains_key(session_id) {
            return Err(self.report(
                SessionError::AlreadyActive {
                    session_id: session_id.to_string(),
                },
                "start_session",
            ));
        }

        let session = Session::new(profile, self.clock.clone(), self.config.session_options())
            .map_err(|err| self.report(err.into(), "start_session"))?;
        let snapshot = session.snapshot();
        sessions.insert(session_id.to_string(), Arc::new(Mutex::new(session)));

        log::info!(
            "[SessionManager] Session {} started ({}), {} active",
            session_id,
            snapshot.exercise,
            sessions.len()
        );
        Ok(snapshot)
    }

    /// Process a frame stamped with the manager clock
    pub fn process_frame(
        &self,
        session_id: &str,
        raw: &RawAngles,
    ) -> Result<FeedbackRecord, SessionError> {
        let now = self.clock.now();
        self.process_frame_at(session_id, raw, now)
    }

    /// Process a frame with a caller-supplied timestamp and publish the record
    pub fn process_frame_at(
        &self,
        session_id: &str,
        raw: &RawAngles,
        at: Duration,
    ) -> Result<FeedbackRecord, SessionError> {
        let shared = self.get(session_id)?;
        let mut session = Self::lock_session(&shared, session_id)?;
        let record = session
            .process_frame_at(raw, at)
            .map_err(|err| self.report(err.into(), "process_frame"))?;

        // Published under the session lock so subscribers see processing order.
        // No subscribers is not an error.
        let _ = self.records.send(SessionEvent {
            session_id: session_id.to_string(),
            record: record.clone(),
        });
        drop(session);
        Ok(record)
    }

    /// Switch a session to another exercise, resetting its state
    pub fn switch_exercise(
        &self,
        session_id: &str,
        exercise: &str,
        preset: ThresholdPreset,
    ) -> Result<SessionSnapshot, SessionError> {
        let profile = self
            .config
            .resolve_profile(exercise, preset)
            .map_err(|err| self.report(err.into(), "switch_exercise"))?;

        let shared = self.get(session_id)?;
        let mut session = Self::lock_session(&shared, session_id)?;
        session
            .switch_exercise(profile)
            .map_err(|err| self.report(err.into(), "switch_exercise"))?;
        Ok(session.snapshot())
    }

    /// Stop tracking a session and return its final state
    pub fn end_session(&self, session_id: &str) -> Result<SessionSnapshot, SessionError> {
        let shared = self
            .write_sessions()?
            .remove(session_id)
            .ok_or_else(|| self.not_found(session_id, "end_session"))?;
        let session = Self::lock_session(&shared, session_id)?;
        let snapshot = session.snapshot();

        log::info!(
            "[SessionManager] Session {} ended: correct={}, incorrect={}",
            session_id,
            snapshot.correct_count,
            snapshot.incorrect_count
        );
        Ok(snapshot)
    }

    pub fn snapshot(&self, session_id: &str) -> Result<SessionSnapshot, SessionError> {
        let shared = self.get(session_id)?;
        let session = Self::lock_session(&shared, session_id)?;
        Ok(session.snapshot())
    }

    /// Ids of all active sessions, sorted
    pub fn session_ids(&self) -> Result<Vec<String>, SessionError> {
        let mut ids: Vec<String> = self.read_sessions()?.keys().cloned().collect();
        ids.sort();
        Ok(ids)
    }

    // ========================================================================
    // HELPER METHODS - Lock management
    // ========================================================================

    fn get(&self, session_id: &str) -> Result<SharedSession<C>, SessionError> {
        self.read_sessions()?
            .get(session_id)
            .cloned()
            .ok_or_else(|| self.not_found(session_id, "lookup"))
    }

    fn read_sessions(
        &self,
    ) -> Result<std::sync::RwLockReadGuard<'_, HashMap<String, SharedSession<C>>>, SessionError>
    {
        self.sessions
            .read()
            .map_err(|_| SessionError::StatePoisoned {
                session_id: "*".to_string(),
            })
    }

    fn write_sessions(
        &self,
    ) -> Result<std::sync::RwLockWriteGuard<'_, HashMap<String, SharedSession<C>>>, SessionError>
    {
        self.sessions
            .write()
            .map_err(|_| SessionError::StatePoisoned {
                session_id: "*".to_string(),
            })
    }

    fn lock_session<'a>(
        shared: &'a SharedSession<C>,
        session_id: &str,
    ) -> Result<MutexGuard<'a, Session<C>>, SessionError> {
        shared.lock().map_err(|_| SessionError::StatePoisoned {
            session_id: session_id.to_string(),
        })
    }

    fn not_found(&self, session_id: &str, context: &str) -> SessionError {
        self.report(
            ValidationError::SessionNotFound {
                session_id: session_id.to_string(),
            }
            .into(),
            context,
        )
    }

    fn report(&self, err: SessionError, context: &str) -> SessionError {
        log_session_error(&err, context);
        err
    }
}

impl Default for SessionManager<MonotonicClock> {
    fn default() -> Self {
        Self::new(AppConfig::default())
    }
}
