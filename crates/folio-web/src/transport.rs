#![forbid(unsafe_code)]

//! `fetch` transports for the counting service and the contact relay.
//!
//! # Failure Modes
//!
//! | Failure | Mapped to |
//! |---------|-----------|
//! | `fetch` rejects with `AbortError` | [`CountError::Aborted`] |
//! | `fetch` rejects otherwise | [`CountError::Transport`] |
//! | Timer fires first | [`CountError::TimedOut`], request aborted |
//! | Non-2xx or bad body | [`parse_hit_response`] error |

use std::cell::RefCell;
use std::rc::Rc;

use folio_runtime::contact::{RelayError, RelayRequest};
use folio_runtime::view_counter::{
    CountError, HitCallback, HitRequest, HitTransport, parse_hit_response,
};
use js_sys::{Promise, Reflect};
use tracing::{debug, warn};
use wasm_bindgen::closure::Closure;
use wasm_bindgen::{JsCast, JsValue};
use wasm_bindgen_futures::{JsFuture, spawn_local};
use web_sys::{AbortController, Headers, RequestInit, Response};

use crate::js_error_message;

type Slot = Rc<RefCell<Option<HitCallback>>>;

/// Completes at most once; later results are dropped.
fn finish(slot: &Slot, result: Result<u64, CountError>) {
    let callback = slot.borrow_mut().take();
    if let Some(callback) = callback {
        callback(result);
    }
}

fn classify_rejection(err: &JsValue) -> CountError {
    let name = Reflect::get(err, &JsValue::from_str("name"))
        .ok()
        .and_then(|v| v.as_string());
    if name.as_deref() == Some("AbortError") {
        CountError::Aborted
    } else {
        CountError::Transport(js_error_message(err))
    }
}

async fn fetch_count(promise: Promise) -> Result<u64, CountError> {
    let response: Response = JsFuture::from(promise)
        .await
        .map_err(|e| classify_rejection(&e))?
        .dyn_into()
        .map_err(|_| CountError::Transport("fetch did not yield a Response".into()))?;
    let status = response.status();
    let text = response
        .text()
        .map_err(|e| CountError::Transport(js_error_message(&e)))?;
    let body = JsFuture::from(text)
        .await
        .map_err(|e| classify_rejection(&e))?
        .as_string()
        .unwrap_or_default();
    parse_hit_response(status, &body)
}

/// Sends hit requests with `window.fetch`.
#[derive(Debug, Default, Clone, Copy)]
pub struct FetchHitTransport;

impl HitTransport for FetchHitTransport {
    fn send(&self, request: &HitRequest, complete: HitCallback) {
        let slot: Slot = Rc::new(RefCell::new(Some(complete)));
        let Some(window) = web_sys::window() else {
            finish(&slot, Err(CountError::Transport("no window".into())));
            return;
        };

        let controller = AbortController::new().ok();
        if let Some(controller) = controller.clone() {
            request.abort.on_abort(move || controller.abort());
        }

        // The timer is not cleared on completion; firing late is a no-op.
        let timer_slot = Rc::clone(&slot);
        let timer_controller = controller.clone();
        let on_timeout = Closure::once_into_js(move || {
            if timer_slot.borrow().is_some() {
                finish(&timer_slot, Err(CountError::TimedOut));
                if let Some(controller) = timer_controller {
                    controller.abort();
                }
            }
        });
        let timeout_ms = i32::try_from(request.timeout.as_millis()).unwrap_or(i32::MAX);
        if let Err(err) = window.set_timeout_with_callback_and_timeout_and_arguments_0(
            on_timeout.unchecked_ref(),
            timeout_ms,
        ) {
            warn!(target: "folio.counter", error = %js_error_message(&err), "could not arm hit timeout");
        }

        let init = RequestInit::new();
        init.set_method("GET");
        if let Some(controller) = &controller {
            init.set_signal(Some(&controller.signal()));
        }
        debug!(target: "folio.counter", url = %request.url, "fetch hit");
        let promise = window.fetch_with_str_and_init(&request.url, &init);
        spawn_local(async move {
            let result = fetch_count(promise).await;
            finish(&slot, result);
        });
    }
}

/// `POST` one contact submission to the relay.
pub async fn post_contact(request: &RelayRequest) -> Result<(), RelayError> {
    let transport = |e: JsValue| RelayError::Transport(Some(js_error_message(&e)));
    let window = web_sys::window().ok_or(RelayError::Transport(None))?;

    let headers = Headers::new().map_err(transport)?;
    for (name, value) in &request.headers {
        headers.set(name, value).map_err(transport)?;
    }
    let init = RequestInit::new();
    init.set_method("POST");
    init.set_headers(&headers);
    init.set_body(&JsValue::from_str(&request.body));

    let response: Response = JsFuture::from(window.fetch_with_str_and_init(&request.url, &init))
        .await
        .map_err(transport)?
        .dyn_into()
        .map_err(|_| RelayError::Transport(None))?;
    if response.ok() {
        return Ok(());
    }
    let body = match response.text() {
        Ok(text) => JsFuture::from(text)
            .await
            .ok()
            .and_then(|v| v.as_string())
            .unwrap_or_default(),
        Err(_) => String::new(),
    };
    Err(RelayError::Status {
        status: response.status(),
        body,
    })
}
