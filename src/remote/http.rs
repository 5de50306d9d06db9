//! HTTP Remote Store
//!
//! REST client for a JSON collection endpoint:
//! `GET {ep}`, `POST {ep}/{id}`, `PUT {ep}/{id}`, `DELETE {ep}/{id,id}`.

use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode};
use serde::Deserialize;

use super::{resource_url, RemoteResult, RemoteStore};
use crate::error::RemoteError;
use crate::models::Item;

/// reqwest-backed `RemoteStore`
#[derive(Debug, Clone)]
pub struct HttpStore {
    client: Client,
    endpoint: String,
}

#[derive(Deserialize)]
struct DeleteResponse {
    deleted: Vec<u32>,
}

impl HttpStore {
    /// `endpoint` must be an absolute URL, e.g. `http://localhost:3000/api/todo`
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self::with_client(Client::new(), endpoint)
    }

    pub fn with_client(client: Client, endpoint: impl Into<String>) -> Self {
        Self {
            client,
            endpoint: endpoint.into(),
        }
    }
}

fn transport(e: reqwest::Error) -> RemoteError {
    if e.is_decode() {
        RemoteError::Decode(e.to_string())
    } else {
        RemoteError::Transport(e.to_string())
    }
}

/// Map non-success statuses; 404 keeps the attempted url
async fn check(response: Response, url: &str) -> RemoteResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    if status == StatusCode::NOT_FOUND {
        return Err(RemoteError::NotFound {
            endpoint: url.to_string(),
        });
    }
    let body = response.text().await.unwrap_or_default();
    Err(RemoteError::Status {
        code: status.as_u16(),
        body,
    })
}

#[async_trait]
impl RemoteStore for HttpStore {
    fn endpoint(&self) -> &str {
        &self.endpoint
    }

    async fn fetch_all(&self) -> RemoteResult<Vec<Item>> {
        let response = self.client.get(&self.endpoint).send().await.map_err(transport)?;
        let response = check(response, &self.endpoint).await?;
        response.json().await.map_err(transport)
    }

    async fn create(&self, item: &Item) -> RemoteResult<Item> {
        let url = resource_url(&self.endpoint, &[item.id]);
        tracing::debug!(%url, "POST");
        let response = self.client.post(&url).json(item).send().await.map_err(transport)?;
        let response = check(response, &url).await?;
        response.json().await.map_err(transport)
    }

    async fn update(&self, item: &Item) -> RemoteResult<Item> {
        let url = resource_url(&self.endpoint, &[item.id]);
        tracing::debug!(%url, "PUT");
        let response = self.client.put(&url).json(item).send().await.map_err(transport)?;
        let response = check(response, &url).await?;
        response.json().await.map_err(transport)
    }

    async fn delete(&self, ids: &[u32]) -> RemoteResult<Vec<u32>> {
        let url = resource_url(&self.endpoint, ids);
        tracing::debug!(%url, "DELETE");
        let response = self.client.delete(&url).send().await.map_err(transport)?;
        let response = check(response, &url).await?;
        let body: DeleteResponse = response.json().await.map_err(transport)?;
        Ok(body.deleted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::{TcpListener, TcpStream};
    use tokio::task::JoinHandle;

    fn reply(status: &str, body: &str) -> String {
        format!(
            "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
            status,
            body.len(),
            body
        )
    }

    async fn read_request(socket: &mut TcpStream) -> String {
        let mut buf = Vec::new();
        let mut chunk = [0u8; 1024];
        loop {
            let n = socket.read(&mut chunk).await.unwrap();
            if n == 0 {
                break;
            }
            buf.extend_from_slice(&chunk[..n]);
            let text = String::from_utf8_lossy(&buf).into_owned();
            if let Some(end) = text.find("\r\n\r\n") {
                let length = text[..end]
                    .lines()
                    .filter_map(|line| line.split_once(':'))
                    .find(|(name, _)| name.eq_ignore_ascii_case("content-length"))
                    .and_then(|(_, value)| value.trim().parse::<usize>().ok())
                    .unwrap_or(0);
                if buf.len() >= end + 4 + length {
                    break;
                }
            }
        }
        String::from_utf8_lossy(&buf).into_owned()
    }

    /// Serve one canned response; the handle yields the raw request
    async fn serve_once(response: String) -> (HttpStore, JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let endpoint = format!("http://{}/api/todo", listener.local_addr().unwrap());
        let handle = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let request = read_request(&mut socket).await;
            socket.write_all(response.as_bytes()).await.unwrap();
            let _ = socket.shutdown().await;
            request
        });
        let client = Client::builder().no_proxy().build().unwrap();
        (HttpStore::with_client(client, endpoint), handle)
    }

    fn item(id: u32) -> Item {
        Item {
            id,
            sequence: 2,
            todo_text: "walk dog".to_string(),
            completed: false,
            important: true,
        }
    }

    #[tokio::test]
    async fn test_fetch_all_parses_collection() {
        let body = r#"[{"id":4,"sequence":1,"todoText":"walk dog","completed":true,"important":false}]"#;
        let (store, server) = serve_once(reply("200 OK", body)).await;

        let items = store.fetch_all().await.unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].id, 4);
        assert_eq!(items[0].todo_text, "walk dog");
        assert!(items[0].completed);

        let request = server.await.unwrap();
        assert!(request.starts_with("GET /api/todo "), "{}", request);
    }

    #[tokio::test]
    async fn test_not_found_names_the_resource() {
        let (store, server) = serve_once(reply("404 Not Found", "")).await;
        let url = format!("{}/3", store.endpoint());

        let err = store.update(&item(3)).await.unwrap_err();
        assert_eq!(err, RemoteError::NotFound { endpoint: url.clone() });
        assert_eq!(
            err.to_string(),
            format!("Request failed with status code 404 url {}", url)
        );

        let request = server.await.unwrap();
        assert!(request.starts_with("PUT /api/todo/3 "), "{}", request);
        assert!(request.contains(r#""todoText":"walk dog""#), "{}", request);
    }

    #[tokio::test]
    async fn test_error_status_keeps_body() {
        let (store, server) = serve_once(reply("500 Internal Server Error", "boom")).await;

        let err = store.create(&item(7)).await.unwrap_err();
        assert_eq!(
            err,
            RemoteError::Status {
                code: 500,
                body: "boom".to_string()
            }
        );
        assert!(server.await.unwrap().starts_with("POST /api/todo/7 "));
    }

    #[tokio::test]
    async fn test_delete_returns_deleted_ids() {
        let (store, server) = serve_once(reply("200 OK", r#"{"deleted":[1,3]}"#)).await;

        assert_eq!(store.delete(&[1, 3]).await.unwrap(), vec![1, 3]);
        assert!(server.await.unwrap().starts_with("DELETE /api/todo/1,3 "));
    }

    #[tokio::test]
    async fn test_malformed_body_is_decode_error() {
        let (store, server) = serve_once(reply("200 OK", "not json")).await;

        let err = store.fetch_all().await.unwrap_err();
        assert!(matches!(err, RemoteError::Decode(_)), "{:?}", err);
        server.await.unwrap();
    }
}
