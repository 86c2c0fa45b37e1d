use crate::handlers::auth::parse_claims;
use crate::state::AppState;
use akashi_common::Result;
use actix_web::{web, HttpRequest, HttpResponse};
use futures::StreamExt;
use tokio_stream::wrappers::ReceiverStream;

/// `GET /v1/subscribe` (§4.10, §6): a tenant-scoped Server-Sent Events
/// stream of `decisions`/`conflicts` notifications. The subscription is
/// dropped from the broker's map when the stream is dropped (client
/// disconnect or server shutdown).
pub async fn subscribe(state: web::Data<AppState>, req: HttpRequest) -> Result<HttpResponse> {
    let claims = parse_claims(&req)?;
    let broker = state.broker.clone();
    let (subscriber_id, receiver) = broker.subscribe(claims.org_id).await;

    let stream = ReceiverStream::new(receiver).map(move |event| {
        let data = serde_json::to_string(&event.payload).unwrap_or_else(|_| "null".to_string());
        let frame = format!("event: {}\ndata: {}\n\n", event.channel, data);
        Ok::<_, actix_web::Error>(actix_web::web::Bytes::from(frame))
    });

    // Unsubscribe is driven by drop, not by an explicit close callback:
    // wrap the stream so the guard's Drop runs when actix finishes it.
    let guarded = UnsubscribeOnDrop { broker, subscriber_id, inner: Some(stream) };

    Ok(HttpResponse::Ok()
        .content_type("text/event-stream")
        .append_header(("Cache-Control", "no-cache"))
        .streaming(guarded))
}

struct UnsubscribeOnDrop<S> {
    broker: std::sync::Arc<crate::broker::Broker>,
    subscriber_id: u64,
    inner: Option<S>,
}

impl<S> futures::Stream for UnsubscribeOnDrop<S>
where
    S: futures::Stream + Unpin,
{
    type Item = S::Item;

    fn poll_next(mut self: std::pin::Pin<&mut Self>, cx: &mut std::task::Context<'_>) -> std::task::Poll<Option<Self::Item>> {
        match &mut self.inner {
            Some(inner) => std::pin::Pin::new(inner).poll_next(cx),
            None => std::task::Poll::Ready(None),
        }
    }
}

impl<S> Drop for UnsubscribeOnDrop<S> {
    fn drop(&mut self) {
        let broker = self.broker.clone();
        let subscriber_id = self.subscriber_id;
        tokio::spawn(async move {
            broker.unsubscribe(subscriber_id).await;
        });
    }
}
