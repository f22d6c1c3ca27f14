//! CloseRegistry — 논리적 자원 체인 하나의 close 동작 집합
//!
//! 각 동작은 레지스트리가 몇 겹의 wrapper 에 공유되든, 몇 번 또는 몇 개의
//! 스레드에서 `close()` 가 호출되든 정확히 한 번 실행된다.
//! 자식 레지스트리(flat_map 하위 시퀀스)는 부모 동작보다 먼저 닫힌다.

use crate::error::{StreamError, StreamResult};
use parking_lot::Mutex;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock, Weak};

type ActionFn = Arc<dyn Fn() -> StreamResult<()> + Send + Sync>;

/// close 시 실행할 동작. 복제본은 같은 동작으로 취급된다.
#[derive(Clone)]
pub struct CloseAction(ActionFn);

impl CloseAction {
    pub fn new<F>(action: F) -> Self
    where
        F: Fn() -> StreamResult<()> + Send + Sync + 'static,
    {
        Self(Arc::new(action))
    }

    /// 실패하지 않는 동작
    pub fn infallible<F>(action: F) -> Self
    where
        F: Fn() + Send + Sync + 'static,
    {
        Self::new(move || {
            action();
            Ok(())
        })
    }

    pub fn run(&self) -> StreamResult<()> {
        (self.0)()
    }

    pub fn same_as(&self, other: &CloseAction) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl PartialEq for CloseAction {
    fn eq(&self, other: &Self) -> bool {
        self.same_as(other)
    }
}

impl fmt::Debug for CloseAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CloseAction({:p})", Arc::as_ptr(&self.0) as *const ())
    }
}

#[derive(Default)]
struct RegistryState {
    actions: Vec<CloseAction>,
    children: Vec<Arc<CloseRegistry>>,
}

pub struct CloseRegistry {
    closed: AtomicBool,
    state: Mutex<RegistryState>,
    parent: OnceLock<Weak<CloseRegistry>>,
}

impl CloseRegistry {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            closed: AtomicBool::new(false),
            state: Mutex::new(RegistryState::default()),
            parent: OnceLock::new(),
        })
    }

    /// 동작 등록. 같은 동작의 중복 등록은 무시된다.
    ///
    /// 이미 닫힌 레지스트리에 등록하면 즉시 실행한다.
    pub fn on_close(&self, action: CloseAction) {
        let mut state = self.state.lock();
        if self.closed.load(Ordering::Acquire) {
            drop(state);
            tracing::warn!(target: crate::logging::CLOSE, "close action registered after close; running now");
            if let Err(err) = action.run() {
                tracing::warn!(target: crate::logging::CLOSE, error = %err, "late close action failed");
            }
            return;
        }
        if state.actions.iter().any(|a| a.same_as(&action)) {
            return;
        }
        state.actions.push(action);
    }

    /// 자식 레지스트리 연결. 자식은 부모 동작보다 먼저 닫힌다.
    pub fn adopt(self: &Arc<Self>, child: Arc<CloseRegistry>) -> StreamResult<()> {
        // 자식은 한 부모에만 속한다
        let _ = child.parent.set(Arc::downgrade(self));
        let mut state = self.state.lock();
        if self.closed.load(Ordering::Acquire) {
            drop(state);
            return child.close();
        }
        state.children.push(child);
        Ok(())
    }

    /// 자식 레지스트리 분리 (이미 닫힌 자식)
    pub fn detach(&self, child: &CloseRegistry) {
        self.state
            .lock()
            .children
            .retain(|c| !std::ptr::eq(Arc::as_ptr(c), child));
    }

    pub fn parent(&self) -> Option<Arc<CloseRegistry>> {
        self.parent.get().and_then(Weak::upgrade)
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    /// 자식 먼저, 그 다음 등록 순서대로 동작 실행. 두 번째 호출부터는 no-op.
    ///
    /// 첫 번째 실패를 반환하고 나머지 실패는 로그로 남긴다.
    pub fn close(&self) -> StreamResult<()> {
        if self
            .closed
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Ok(());
        }

        let RegistryState { actions, children } = std::mem::take(&mut *self.state.lock());
        tracing::trace!(
            target: crate::logging::CLOSE,
            children = children.len(),
            actions = actions.len(),
            "closing registry"
        );

        let mut first: Option<StreamError> = None;
        let mut record = |result: StreamResult<()>| {
            if let Err(err) = result {
                if first.is_none() {
                    first = Some(err);
                } else {
                    tracing::warn!(
                        target: crate::logging::CLOSE,
                        error = %err,
                        "additional close failure suppressed"
                    );
                }
            }
        };

        for child in children {
            record(child.close());
        }
        for action in actions {
            record(action.run());
        }

        if let Some(parent) = self.parent() {
            parent.detach(self);
        }

        match first {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

impl fmt::Debug for CloseRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.lock();
        f.debug_struct("CloseRegistry")
            .field("closed", &self.is_closed())
            .field("actions", &state.actions.len())
            .field("children", &state.children.len())
            .finish()
    }
}
