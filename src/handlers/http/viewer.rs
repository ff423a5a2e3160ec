/*
 * Logtap (C) 2025 - 2026 Logtap contributors
 *
 * This program is free software: you can redistribute it and/or modify
 * it under the terms of the GNU Affero General Public License as
 * published by the Free Software Foundation, either version 3 of the
 * License, or (at your option) any later version.
 *
 * This program is distributed in the hope that it will be useful,
 * but WITHOUT ANY WARRANTY; without even the implied warranty of
 * MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
 * GNU Affero General Public License for more details.
 *
 * You should have received a copy of the GNU Affero General Public License
 * along with this program.  If not, see <http://www.gnu.org/licenses/>.
 *
 */

use std::sync::Arc;

use actix_web::{rt, web, HttpRequest, HttpResponse};
use actix_ws::{Message, MessageStream, Session};
use futures_util::StreamExt;
use tokio::sync::mpsc;
use tracing::info;
use ulid::Ulid;

use crate::broadcast::{Broadcaster, ChannelSubscriber};
use crate::state::AppState;

// entries buffered per viewer before the hub's send starts blocking
const OUTBOUND_BUFFER: usize = 32;

pub async fn status() -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({ "status": "ok" }))
}

/// Upgrades `GET /view/ws` and registers the connection with the broadcast
/// hub.
///
/// The socket is split into two tasks: a writer draining the subscriber
/// channel into the session, and a reader answering pings and watching for
/// the close frame. When either side dies the channel closes, the hub's
/// next send fails, and the subscriber is pruned; a clean client close
/// unregisters directly.
pub async fn websocket(
    req: HttpRequest,
    stream: web::Payload,
    state: web::Data<AppState>,
) -> Result<HttpResponse, actix_web::Error> {
    let (response, session, msg_stream) = actix_ws::handle(&req, stream)?;

    let peer = req
        .peer_addr()
        .map(|addr| addr.to_string())
        .unwrap_or_else(|| "unknown".to_string());

    let (tx, rx) = mpsc::channel::<String>(OUTBOUND_BUFFER);
    let id = state
        .broadcaster
        .register(peer.clone(), Arc::new(ChannelSubscriber::new(tx)));
    info!("client connected: {peer}");

    rt::spawn(write_outbound(session.clone(), rx));
    rt::spawn(read_inbound(
        session,
        msg_stream,
        Arc::clone(&state.broadcaster),
        id,
        peer,
    ));

    Ok(response)
}

async fn write_outbound(mut session: Session, mut rx: mpsc::Receiver<String>) {
    while let Some(payload) = rx.recv().await {
        if session.text(payload).await.is_err() {
            break;
        }
    }
    let _ = session.close(None).await;
}

async fn read_inbound(
    mut session: Session,
    mut msg_stream: MessageStream,
    broadcaster: Arc<Broadcaster>,
    id: Ulid,
    peer: String,
) {
    while let Some(Ok(msg)) = msg_stream.next().await {
        match msg {
            Message::Ping(bytes) => {
                if session.pong(&bytes).await.is_err() {
                    break;
                }
            }
            Message::Close(_) => break,
            // viewers only listen
            _ => {}
        }
    }

    if broadcaster.unregister(id) {
        info!("client disconnected: {peer}");
    }
}
