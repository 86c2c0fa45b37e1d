use crate::auth::Claims;
use actix_web::{
    body::EitherBody,
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    http::header::{HeaderName, HeaderValue},
    Error, HttpMessage,
};
use akashi_ratelimit::RateLimiter;
use futures::future::LocalBoxFuture;
use std::future::{ready, Ready};
use std::sync::Arc;

/// Wraps a `RateLimiter` keyed by `org:<org_id>:agent:<agent_id>` — falls
/// back to the remote IP for requests without verified claims (the
/// `/auth/token` endpoint itself). Fail-open: a limiter error permits the
/// request rather than blocking it (§4.12, §7).
pub struct RateLimit {
    pub limiter: Arc<dyn RateLimiter>,
    pub burst: f64,
}

impl RateLimit {
    pub fn new(limiter: Arc<dyn RateLimiter>, burst: f64) -> Self {
        Self { limiter, burst }
    }
}

impl<S, B> Transform<S, ServiceRequest> for RateLimit
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type InitError = ();
    type Transform = RateLimitService<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(RateLimitService { service, limiter: self.limiter.clone(), burst: self.burst }))
    }
}

pub struct RateLimitService<S> {
    service: S,
    limiter: Arc<dyn RateLimiter>,
    burst: f64,
}

impl<S, B> Service<ServiceRequest> for RateLimitService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let limiter = self.limiter.clone();
        let burst = self.burst;
        let key = rate_limit_key(&req);
        let http_request = req.request().clone();

        let fut = self.service.call(req);

        Box::pin(async move {
            match limiter.allow(&key).await {
                Ok(true) | Err(_) => fut.await.map(ServiceResponse::map_into_left_body),
                Ok(false) => {
                    let mut resp = actix_web::HttpResponse::TooManyRequests().finish();
                    if let Ok(v) = HeaderValue::from_str(&(burst as i64).to_string()) {
                        resp.headers_mut().insert(HeaderName::from_static("x-ratelimit-limit"), v);
                    }
                    resp.headers_mut().insert(HeaderName::from_static("retry-after"), HeaderValue::from_static("1"));
                    Ok(ServiceResponse::new(http_request, resp).map_into_right_body())
                }
            }
        })
    }
}

fn rate_limit_key(req: &ServiceRequest) -> String {
    if let Some(claims) = req.extensions().get::<Claims>() {
        return format!("org:{}:agent:{}", claims.org_id, claims.agent_row_id);
    }
    let ip = req.connection_info().realip_remote_addr().unwrap_or("unknown").to_string();
    format!("ip:{ip}")
}
