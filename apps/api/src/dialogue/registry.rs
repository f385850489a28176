use std::collections::HashMap;
use std::ops::{Deref, DerefMut};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{watch, Mutex, MutexGuard, RwLock};
use tokio::task::JoinHandle;
use tokio::time::{interval, Instant};
use tracing::{debug, info};
use uuid::Uuid;

use crate::dialogue::controller::DialogueController;
use crate::dialogue::session::SessionView;
use crate::errors::AppError;
use crate::services::Services;

/// One live session: its controller plus a receiver for the latest view.
pub struct SessionHandle {
    controller: Mutex<DialogueController>,
    view: watch::Receiver<SessionView>,
    epoch: Instant,
    /// Milliseconds after `epoch` of the last request that touched the session.
    touched_ms: AtomicU64,
}

/// Exclusive access to a controller. Dropping it, whether the request
/// finished or its future was cancelled, repairs any interrupted operation.
pub struct SessionGuard<'a> {
    controller: MutexGuard<'a, DialogueController>,
}

impl Deref for SessionGuard<'_> {
    type Target = DialogueController;

    fn deref(&self) -> &Self::Target {
        &self.controller
    }
}

impl DerefMut for SessionGuard<'_> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.controller
    }
}

impl Drop for SessionGuard<'_> {
    fn drop(&mut self) {
        self.controller.recover_interrupted();
    }
}

impl SessionHandle {
    fn new(controller: DialogueController) -> Self {
        let view = controller.subscribe();
        Self {
            controller: Mutex::new(controller),
            view,
            epoch: Instant::now(),
            touched_ms: AtomicU64::new(0),
        }
    }

    fn touch(&self) {
        let elapsed = self.epoch.elapsed().as_millis() as u64;
        self.touched_ms.store(elapsed, Ordering::Relaxed);
    }

    fn idle_for(&self) -> Duration {
        let touched = Duration::from_millis(self.touched_ms.load(Ordering::Relaxed));
        self.epoch.elapsed().saturating_sub(touched)
    }

    fn is_busy(&self) -> bool {
        self.controller.try_lock().is_err()
    }

    /// Exclusive access for a mutating request. A second request while one
    /// is still running is turned away instead of queued.
    pub fn acquire(&self) -> Result<SessionGuard<'_>, AppError> {
        let controller = self.controller.try_lock().map_err(|_| {
            AppError::Conflict("A request for this session is already in progress".to_string())
        })?;
        self.touch();
        Ok(SessionGuard { controller })
    }

    /// Latest published snapshot; never waits on an in-flight call.
    pub fn view(&self) -> SessionView {
        self.touch();
        self.view.borrow().clone()
    }
}

#[derive(Clone, Default)]
pub struct SessionRegistry {
    sessions: Arc<RwLock<HashMap<Uuid, Arc<SessionHandle>>>>,
}

impl SessionRegistry {
    pub async fn create(&self, services: Services) -> (Uuid, SessionView) {
        let id = Uuid::new_v4();
        let handle = Arc::new(SessionHandle::new(DialogueController::new(services)));
        let view = handle.view();
        let mut sessions = self.sessions.write().await;
        sessions.insert(id, handle);
        info!("Session {id} created ({} live)", sessions.len());
        (id, view)
    }

    pub async fn get(&self, id: Uuid) -> Result<Arc<SessionHandle>, AppError> {
        self.sessions
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or_else(|| AppError::NotFound(format!("Session {id} not found")))
    }

    pub async fn remove(&self, id: Uuid) -> bool {
        let removed = self.sessions.write().await.remove(&id).is_some();
        if removed {
            info!("Session {id} removed");
        }
        removed
    }

    /// Drops sessions untouched for longer than `ttl`. Sessions with a
    /// request in flight are kept. Returns how many were dropped.
    pub async fn sweep_idle(&self, ttl: Duration) -> usize {
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|_, handle| handle.is_busy() || handle.idle_for() <= ttl);
        let swept = before - sessions.len();
        if swept > 0 {
            info!("Swept {swept} idle sessions ({} live)", sessions.len());
        }
        swept
    }

    /// Runs `sweep_idle` every `every` for the life of the process.
    pub fn spawn_sweeper(&self, ttl: Duration, every: Duration) -> JoinHandle<()> {
        let registry = self.clone();
        tokio::spawn(async move {
            let mut ticker = interval(every);
            info!(
                "Session sweeper started (ttl {}s, every {}s)",
                ttl.as_secs(),
                every.as_secs()
            );
            loop {
                ticker.tick().await;
                let swept = registry.sweep_idle(ttl).await;
                debug!("Session sweep tick: {swept} removed");
            }
        })
    }
}
