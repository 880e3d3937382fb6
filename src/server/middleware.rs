use std::convert::Infallible;
use std::net::SocketAddr;

use axum::extract::{ConnectInfo, FromRequestParts};
use axum::http::request::Parts;

const UNKNOWN_CLIENT: &str = "unknown";

/// Rate-limit identity of the caller: the peer IP address of the connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientId(pub String);

impl<S> FromRequestParts<S> for ClientId
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let id = parts
            .extensions
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| addr.ip().to_string())
            .unwrap_or_else(|| UNKNOWN_CLIENT.to_string());
        Ok(ClientId(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;

    async fn extract(req: Request<()>) -> ClientId {
        let (mut parts, _) = req.into_parts();
        ClientId::from_request_parts(&mut parts, &()).await.unwrap()
    }

    #[tokio::test]
    async fn test_client_id_from_peer_ip() {
        let mut req = Request::new(());
        req.extensions_mut()
            .insert(ConnectInfo(SocketAddr::from(([192, 168, 1, 7], 40123))));
        assert_eq!(extract(req).await, ClientId("192.168.1.7".into()));
    }

    #[tokio::test]
    async fn test_client_id_ignores_port() {
        let mut a = Request::new(());
        a.extensions_mut()
            .insert(ConnectInfo(SocketAddr::from(([10, 0, 0, 1], 1000))));
        let mut b = Request::new(());
        b.extensions_mut()
            .insert(ConnectInfo(SocketAddr::from(([10, 0, 0, 1], 2000))));
        assert_eq!(extract(a).await, extract(b).await);
    }

    #[tokio::test]
    async fn test_client_id_without_connect_info() {
        assert_eq!(extract(Request::new(())).await, ClientId("unknown".into()));
    }
}
