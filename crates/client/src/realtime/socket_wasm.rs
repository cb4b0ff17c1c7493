//! Browser websocket transport using `web_sys::WebSocket`.

use wasm_bindgen::prelude::*;
use web_sys::js_sys;

use super::transport::{Connector, Transport, TransportSink};

/// Connector backed by the browser's WebSocket API.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlatformConnector;

impl Connector for PlatformConnector {
    fn connect(&self, url: &str, sink: TransportSink) -> Result<Box<dyn Transport>, String> {
        let ws = web_sys::WebSocket::new(url)
            .map_err(|e| format!("failed to create WebSocket: {e:?}"))?;

        let on_open = sink.on_open.clone();
        let onopen = Closure::wrap(Box::new(move |_: web_sys::Event| {
            (*on_open)();
        }) as Box<dyn FnMut(web_sys::Event)>);
        ws.set_onopen(Some(onopen.as_ref().unchecked_ref()));
        onopen.forget();

        let on_message = sink.on_message.clone();
        let onmessage = Closure::wrap(Box::new(move |e: web_sys::MessageEvent| {
            // only text frames carry events
            if let Ok(text) = e.data().dyn_into::<js_sys::JsString>() {
                (*on_message)(String::from(text));
            }
        }) as Box<dyn FnMut(web_sys::MessageEvent)>);
        ws.set_onmessage(Some(onmessage.as_ref().unchecked_ref()));
        onmessage.forget();

        let on_close = sink.on_close.clone();
        let onclose = Closure::wrap(Box::new(move |e: web_sys::CloseEvent| {
            (*on_close)(e.code(), e.reason());
        }) as Box<dyn FnMut(web_sys::CloseEvent)>);
        ws.set_onclose(Some(onclose.as_ref().unchecked_ref()));
        onclose.forget();

        let on_error = sink.on_error.clone();
        let onerror = Closure::wrap(Box::new(move |_: web_sys::ErrorEvent| {
            (*on_error)("WebSocket error".to_string());
        }) as Box<dyn FnMut(web_sys::ErrorEvent)>);
        ws.set_onerror(Some(onerror.as_ref().unchecked_ref()));
        onerror.forget();

        Ok(Box::new(BrowserSocket { ws }))
    }
}

struct BrowserSocket {
    ws: web_sys::WebSocket,
}

impl Transport for BrowserSocket {
    fn close(&self, code: u16) {
        let _ = self.ws.close_with_code(code);
    }
}
