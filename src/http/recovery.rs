//! Panic recovery middleware.
//!
//! # Responsibilities
//! - Contain a panicking handler to the request that triggered it
//! - Log the fault (message, location, backtrace) and answer 500
//! - Leave the listener and every other request untouched
//!
//! # Design Decisions
//! - Wraps any `Service`, so it composes around a whole router as a layer
//! - Catches panics raised while creating the response future and while
//!   polling it
//! - The backtrace is taken by a panic hook on the panicking thread, since
//!   the stack is gone once unwinding reaches the layer

use std::any::Any;
use std::backtrace::Backtrace;
use std::cell::RefCell;
use std::panic::AssertUnwindSafe;
use std::sync::Once;
use std::task::{Context, Poll};

use axum::{
    extract::Request,
    http::{Method, StatusCode},
    response::{IntoResponse, Response},
};
use futures_util::future::{BoxFuture, FutureExt};
use tower::{Layer, Service};

use crate::observability::metrics;

struct PanicSite {
    location: Option<String>,
    backtrace: Backtrace,
}

thread_local! {
    static LAST_PANIC: RefCell<Option<PanicSite>> = const { RefCell::new(None) };
}

static PANIC_HOOK: Once = Once::new();

/// Chain a hook that records where the current thread panicked.
fn install_panic_hook() {
    PANIC_HOOK.call_once(|| {
        let previous = std::panic::take_hook();
        std::panic::set_hook(Box::new(move |info| {
            let site = PanicSite {
                location: info.location().map(|l| l.to_string()),
                backtrace: Backtrace::force_capture(),
            };
            LAST_PANIC.with(|slot| *slot.borrow_mut() = Some(site));
            previous(info);
        }));
    });
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

/// Layer that wraps services in [`Recovery`].
#[derive(Debug, Clone, Copy)]
pub struct RecoveryLayer {
    frontend: &'static str,
    print_stack: bool,
}

impl RecoveryLayer {
    pub fn new(frontend: &'static str, print_stack: bool) -> Self {
        if print_stack {
            install_panic_hook();
        }
        Self {
            frontend,
            print_stack,
        }
    }
}

impl<S> Layer<S> for RecoveryLayer {
    type Service = Recovery<S>;

    fn layer(&self, inner: S) -> Self::Service {
        Recovery {
            inner,
            frontend: self.frontend,
            print_stack: self.print_stack,
        }
    }
}

/// Service that turns a handler panic into a 500 response.
#[derive(Debug, Clone)]
pub struct Recovery<S> {
    inner: S,
    frontend: &'static str,
    print_stack: bool,
}

struct Fault {
    frontend: &'static str,
    print_stack: bool,
    method: Method,
    path: String,
}

impl Fault {
    fn recover(self, payload: Box<dyn Any + Send>) -> Response {
        let message = panic_message(payload.as_ref());
        let site = LAST_PANIC.with(|slot| slot.borrow_mut().take());
        let location = site
            .as_ref()
            .and_then(|s| s.location.clone())
            .unwrap_or_else(|| "unknown".to_string());

        if self.print_stack {
            let backtrace = site
                .map(|s| s.backtrace.to_string())
                .unwrap_or_else(|| Backtrace::force_capture().to_string());
            tracing::error!(
                frontend = self.frontend,
                method = %self.method,
                path = %self.path,
                panic = %message,
                location = %location,
                backtrace = %backtrace,
                "Recovered from handler panic"
            );
        } else {
            tracing::error!(
                frontend = self.frontend,
                method = %self.method,
                path = %self.path,
                panic = %message,
                location = %location,
                "Recovered from handler panic"
            );
        }

        metrics::record_panic_recovered(self.frontend);
        (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error").into_response()
    }
}

impl<S> Service<Request> for Recovery<S>
where
    S: Service<Request, Response = Response> + Send + 'static,
    S::Future: Send + 'static,
    S::Error: Send + 'static,
{
    type Response = Response;
    type Error = S::Error;
    type Future = BoxFuture<'static, Result<Response, S::Error>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, req: Request) -> Self::Future {
        let fault = Fault {
            frontend: self.frontend,
            print_stack: self.print_stack,
            method: req.method().clone(),
            path: req.uri().path().to_string(),
        };

        let inner = &mut self.inner;
        match std::panic::catch_unwind(AssertUnwindSafe(|| inner.call(req))) {
            Ok(future) => async move {
                match AssertUnwindSafe(future).catch_unwind().await {
                    Ok(result) => result,
                    Err(payload) => Ok(fault.recover(payload)),
                }
            }
            .boxed(),
            Err(payload) => {
                let response = fault.recover(payload);
                async move { Ok(response) }.boxed()
            }
        }
    }
}
