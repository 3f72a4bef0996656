//! Browser ticking sources. Countdowns poll on an interval, the stopwatch
//! redraws every animation frame. Both sit behind one `cancel()`.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use gloo::timers::callback::Interval;
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use web_sys::window;

use crate::timer::Cancel;

pub enum TimerHandle {
    Interval(Option<Interval>),
    FrameLoop(FrameLoop),
}

impl TimerHandle {
    pub fn interval(period_ms: u32, on_tick: impl FnMut() + 'static) -> Self {
        TimerHandle::Interval(Some(Interval::new(period_ms, on_tick)))
    }

    pub fn frame_loop(on_frame: impl FnMut(f64) + 'static) -> Self {
        TimerHandle::FrameLoop(FrameLoop::start(on_frame))
    }
}

impl Cancel for TimerHandle {
    fn cancel(&mut self) {
        match self {
            TimerHandle::Interval(interval) => {
                if let Some(interval) = interval.take() {
                    interval.cancel();
                }
            }
            TimerHandle::FrameLoop(frames) => frames.stop(),
        }
    }
}

struct FrameLoopInner {
    pending: Cell<Option<i32>>,
    stopped: Cell<bool>,
    callback: RefCell<Option<Closure<dyn FnMut(f64)>>>,
}

impl FrameLoopInner {
    fn schedule(&self) {
        let Some(win) = window() else { return };
        if let Some(cb) = self.callback.borrow().as_ref() {
            if let Ok(id) = win.request_animation_frame(cb.as_ref().unchecked_ref()) {
                self.pending.set(Some(id));
            }
        }
    }
}

/// `requestAnimationFrame` loop that re-arms itself until stopped.
pub struct FrameLoop {
    inner: Rc<FrameLoopInner>,
}

impl FrameLoop {
    pub fn start(mut on_frame: impl FnMut(f64) + 'static) -> Self {
        let inner = Rc::new(FrameLoopInner {
            pending: Cell::new(None),
            stopped: Cell::new(false),
            callback: RefCell::new(None),
        });
        let weak = Rc::downgrade(&inner);
        let cb = Closure::wrap(Box::new(move |ts: f64| {
            let Some(inner) = weak.upgrade() else { return };
            inner.pending.set(None);
            if inner.stopped.get() {
                return;
            }
            on_frame(ts);
            if !inner.stopped.get() {
                inner.schedule();
            }
        }) as Box<dyn FnMut(f64)>);
        *inner.callback.borrow_mut() = Some(cb);
        inner.schedule();
        Self { inner }
    }

    pub fn stop(&self) {
        self.inner.stopped.set(true);
        if let Some(id) = self.inner.pending.take() {
            if let Some(win) = window() {
                let _ = win.cancel_animation_frame(id);
            }
        }
    }
}

impl Drop for FrameLoop {
    fn drop(&mut self) {
        self.stop();
    }
}
