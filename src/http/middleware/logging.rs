//! Access log: one line per request.
//!
//! The line is written when [`AccessLog`] drops, so a request that unwinds
//! out of the handler is still logged, as a 500.

use std::net::SocketAddr;
use std::time::Instant;

use axum::{
    extract::{ConnectInfo, Request},
    http::{header, HeaderMap, Method, StatusCode},
    middleware::Next,
    response::Response,
};

use crate::http::middleware::panic_guard::is_upgrade;

pub async fn log_requests(req: Request, next: Next) -> Response {
    let mut line = AccessLog::new(&req);
    let response = next.run(req).await;
    line.status = response.status().as_u16();
    drop(line);
    response
}

struct AccessLog {
    start: Instant,
    status: u16,
    method: Method,
    path: String,
    query: String,
    remote_ip: String,
    host: String,
    user_agent: String,
    upgrade: bool,
}

impl AccessLog {
    fn new(req: &Request) -> Self {
        let remote_ip = req
            .extensions()
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| addr.ip().to_string())
            .unwrap_or_default();

        Self {
            start: Instant::now(),
            // Overwritten once a response exists.
            status: StatusCode::INTERNAL_SERVER_ERROR.as_u16(),
            method: req.method().clone(),
            path: req.uri().path().to_owned(),
            query: req.uri().query().unwrap_or_default().to_owned(),
            remote_ip,
            host: header_value(req.headers(), header::HOST),
            user_agent: header_value(req.headers(), header::USER_AGENT),
            upgrade: is_upgrade(req.headers()),
        }
    }
}

impl Drop for AccessLog {
    fn drop(&mut self) {
        let latency = self.start.elapsed();
        let (status, upgrade) = (self.status, self.upgrade);
        let method = &self.method;
        let (path, query) = (self.path.as_str(), self.query.as_str());
        let remote_ip = self.remote_ip.as_str();
        let (host, user_agent) = (self.host.as_str(), self.user_agent.as_str());

        macro_rules! access_log {
            ($level:ident) => {
                if upgrade {
                    tracing::$level!(
                        ?latency, status, method = %method, path, query, remote_ip, host, user_agent,
                        "websocket connection"
                    )
                } else {
                    tracing::$level!(
                        ?latency, status, method = %method, path, query, remote_ip, host, user_agent,
                        "received http request"
                    )
                }
            };
        }

        if status >= 500 {
            access_log!(error);
        } else {
            access_log!(info);
        }
    }
}

pub(crate) fn header_value(headers: &HeaderMap, name: header::HeaderName) -> String {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_owned()
}
