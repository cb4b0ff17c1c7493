//! Native websocket transport using tokio-tungstenite.
//!
//! Used by desktop shells and integration tooling. The pump task is spawned
//! on the caller's `LocalSet`, matching the crate's single-threaded model.

use std::cell::RefCell;

use futures_channel::oneshot;
use futures_util::{SinkExt, StreamExt};
use studyhall_shared::protocol::{CLOSE_ABNORMAL, CLOSE_NORMAL};
use tokio_tungstenite::tungstenite::protocol::CloseFrame;
use tokio_tungstenite::tungstenite::Message;

use super::transport::{Connector, Transport, TransportSink};
use crate::log_debug;

/// Connector backed by tokio-tungstenite.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlatformConnector;

impl Connector for PlatformConnector {
    fn connect(&self, url: &str, sink: TransportSink) -> Result<Box<dyn Transport>, String> {
        let (close_tx, close_rx) = oneshot::channel::<u16>();
        tokio::task::spawn_local(run_socket(url.to_string(), sink, close_rx));
        Ok(Box::new(NativeSocket {
            close_tx: RefCell::new(Some(close_tx)),
        }))
    }
}

struct NativeSocket {
    close_tx: RefCell<Option<oneshot::Sender<u16>>>,
}

impl Transport for NativeSocket {
    fn close(&self, code: u16) {
        if let Some(tx) = self.close_tx.borrow_mut().take() {
            let _ = tx.send(code);
        }
    }
}

async fn run_socket(url: String, sink: TransportSink, close_rx: oneshot::Receiver<u16>) {
    let (stream, _response) = match tokio_tungstenite::connect_async(&url).await {
        Ok(ok) => ok,
        Err(err) => {
            (*sink.on_error)(err.to_string());
            (*sink.on_close)(CLOSE_ABNORMAL, err.to_string());
            return;
        }
    };
    (*sink.on_open)();

    let (mut write, mut read) = stream.split();
    let mut close_rx = close_rx;
    loop {
        tokio::select! {
            requested = &mut close_rx => {
                // the transport handle was closed (or dropped) locally
                let code = requested.unwrap_or(CLOSE_NORMAL);
                let frame = CloseFrame { code: code.into(), reason: "".into() };
                let _ = write.send(Message::Close(Some(frame))).await;
                (*sink.on_close)(code, String::new());
                return;
            }
            frame = read.next() => match frame {
                Some(Ok(Message::Text(text))) => (*sink.on_message)(text.to_string()),
                Some(Ok(Message::Close(frame))) => {
                    let (code, reason) = frame
                        .map(|f| (u16::from(f.code), f.reason.to_string()))
                        .unwrap_or((CLOSE_ABNORMAL, String::new()));
                    (*sink.on_close)(code, reason);
                    return;
                }
                Some(Ok(other)) => log_debug!("ignoring non-text frame: {other:?}"),
                Some(Err(err)) => {
                    (*sink.on_error)(err.to_string());
                    (*sink.on_close)(CLOSE_ABNORMAL, err.to_string());
                    return;
                }
                None => {
                    (*sink.on_close)(CLOSE_ABNORMAL, "stream ended".to_string());
                    return;
                }
            }
        }
    }
}
