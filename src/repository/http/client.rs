//! REST Repository
//!
//! Talks to the back-office API:
//! - `GET    /<collection>?search=&<filter>=&page=&limit=`
//! - `GET    /<collection>/stats`
//! - `POST   /<collection>`, `PUT /<collection>/:id`, `DELETE /<collection>/:id`
//! - `POST   /<collection>/bulk-delete`, `POST /<collection>/bulk-<action>`

use std::marker::PhantomData;

use async_trait::async_trait;
use percent_encoding::{utf8_percent_encode, NON_ALPHANUMERIC};
use reqwest::{Client, Response, StatusCode};
use serde::de::DeserializeOwned;

use crate::domain::{DomainError, DomainResult, StatusKind};
use crate::query::{QueryState, SearchPolicy};
use crate::repository::stats::CollectionStats;
use crate::repository::traits::{
    BulkOutcome, BulkRepository, PageResult, Repository, SearchableRepository, StatsRepository,
};

use super::wire::{
    page_from_wire, BulkRequest, BulkResponseDto, ItemEnvelope, ListEnvelope, StatsDto, WireRecord,
};

/// Page size used when `list()` walks the whole collection
pub const LIST_PAGE_LIMIT: usize = 100;

fn network(e: reqwest::Error) -> DomainError {
    DomainError::Network(e.to_string())
}

/// Map an HTTP status onto the domain taxonomy
async fn check(resp: Response) -> DomainResult<Response> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let body = resp.text().await.unwrap_or_default();
    let detail = if body.is_empty() { status.to_string() } else { format!("{}: {}", status, body) };
    Err(match status {
        StatusCode::NOT_FOUND => DomainError::NotFound(detail),
        StatusCode::CONFLICT => DomainError::Conflict(detail),
        s if s.is_client_error() => DomainError::InvalidInput(detail),
        _ => DomainError::Network(detail),
    })
}

async fn read_json<D: DeserializeOwned>(resp: Response) -> DomainResult<D> {
    check(resp)
        .await?
        .json::<D>()
        .await
        .map_err(|e| DomainError::Internal(format!("Unexpected response body: {}", e)))
}

/// Query string for a list request
pub fn query_params(query: &QueryState, policy: SearchPolicy) -> Vec<(String, String)> {
    let mut params = Vec::new();
    let term = query.search_term.trim();
    if !term.is_empty() {
        params.push(("search".to_string(), term.to_string()));
        if policy == SearchPolicy::AllTokens {
            params.push(("match".to_string(), "all".to_string()));
        }
    }
    for (key, value) in query.active_filters() {
        params.push((key.to_string(), value.to_string()));
    }
    params.push(("page".to_string(), query.page.to_string()));
    params.push(("limit".to_string(), query.page_size.to_string()));
    params
}

/// REST implementation of a record repository
pub struct HttpRepository<T> {
    client: Client,
    base_url: String,
    _marker: PhantomData<fn() -> T>,
}

impl<T: WireRecord> HttpRepository<T> {
    pub fn new(base_url: &str) -> Self {
        Self::with_client(Client::new(), base_url)
    }

    pub fn with_client(client: Client, base_url: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            _marker: PhantomData,
        }
    }

    pub fn collection_url(&self) -> String {
        format!("{}/{}", self.base_url, T::COLLECTION)
    }

    pub fn item_url(&self, id: &str) -> String {
        format!("{}/{}", self.collection_url(), utf8_percent_encode(id, NON_ALPHANUMERIC))
    }

    async fn fetch_page(&self, params: &[(String, String)]) -> DomainResult<PageResult<T>> {
        let resp = self
            .client
            .get(self.collection_url())
            .query(params)
            .send()
            .await
            .map_err(network)?;
        let envelope: ListEnvelope<T::Wire> = read_json(resp).await?;
        Ok(page_from_wire(envelope))
    }

    async fn post_bulk(&self, route: &str, ids: &[String]) -> DomainResult<BulkOutcome> {
        if ids.is_empty() {
            return Ok(BulkOutcome::default());
        }
        let resp = self
            .client
            .post(format!("{}/{}", self.collection_url(), route))
            .json(&BulkRequest { ids })
            .send()
            .await
            .map_err(network)?;
        let dto: BulkResponseDto = read_json(resp).await?;
        let outcome = dto.into_outcome(ids.len());
        log::info!("{} {}: {:?}", T::COLLECTION, route, outcome);
        Ok(outcome)
    }
}

#[async_trait]
impl<T: WireRecord> Repository<T> for HttpRepository<T> {
    async fn create(&self, entity: &T) -> DomainResult<T> {
        let resp = self
            .client
            .post(self.collection_url())
            .json(&entity.to_wire())
            .send()
            .await
            .map_err(network)?;
        let envelope: ItemEnvelope<T::Wire> = read_json(resp).await?;
        T::from_wire(envelope.into_inner())
    }

    async fn find_by_id(&self, id: &str) -> DomainResult<Option<T>> {
        let resp = self.client.get(self.item_url(id)).send().await.map_err(network)?;
        if resp.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let envelope: ItemEnvelope<T::Wire> = read_json(resp).await?;
        T::from_wire(envelope.into_inner()).map(Some)
    }

    async fn list(&self) -> DomainResult<Vec<T>> {
        let mut query = QueryState::new(LIST_PAGE_LIMIT);
        let mut items = Vec::new();
        loop {
            let page = self.fetch_page(&query_params(&query, SearchPolicy::Substring)).await?;
            let fetched = page.items.len();
            items.extend(page.items);
            if query.page >= page.total_pages || fetched == 0 {
                break;
            }
            query.page += 1;
        }
        Ok(items)
    }

    async fn update(&self, entity: &T) -> DomainResult<T> {
        let resp = self
            .client
            .put(self.item_url(entity.id()))
            .json(&entity.to_wire())
            .send()
            .await
            .map_err(network)?;
        let envelope: ItemEnvelope<T::Wire> = read_json(resp).await?;
        T::from_wire(envelope.into_inner())
    }

    async fn delete(&self, id: &str) -> DomainResult<()> {
        let resp = self.client.delete(self.item_url(id)).send().await.map_err(network)?;
        check(resp).await?;
        Ok(())
    }
}

#[async_trait]
impl<T: WireRecord> BulkRepository<T> for HttpRepository<T> {
    async fn bulk_delete(&self, ids: &[String]) -> DomainResult<BulkOutcome> {
        self.post_bulk("bulk-delete", ids).await
    }

    async fn bulk_set_status(
        &self,
        ids: &[String],
        status: T::Status,
    ) -> DomainResult<BulkOutcome> {
        self.post_bulk(&format!("bulk-{}", status.bulk_action()), ids).await
    }
}

#[async_trait]
impl<T: WireRecord> StatsRepository<T> for HttpRepository<T> {
    async fn stats(&self) -> DomainResult<CollectionStats> {
        let resp = self
            .client
            .get(format!("{}/stats", self.collection_url()))
            .send()
            .await
            .map_err(network)?;
        let dto: StatsDto = read_json(resp).await?;
        Ok(dto.into_stats::<T::Status>())
    }
}

#[async_trait]
impl<T: WireRecord> SearchableRepository<T> for HttpRepository<T> {
    async fn search(
        &self,
        query: &QueryState,
        policy: SearchPolicy,
    ) -> DomainResult<PageResult<T>> {
        self.fetch_page(&query_params(query, policy)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Subscriber, SubscriberStatus};
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;
    use tokio::task::JoinHandle;

    /// Serves the canned responses in order, one connection each, and
    /// returns what it received as "METHOD /path?query\nbody".
    async fn fixture_server(
        responses: Vec<(u16, &'static str)>,
    ) -> (String, JoinHandle<Vec<String>>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base = format!("http://{}", listener.local_addr().unwrap());

        let handle = tokio::spawn(async move {
            let mut seen = Vec::new();
            for (status, body) in responses {
                let (mut socket, _) = listener.accept().await.unwrap();
                let mut buf = Vec::new();
                let mut chunk = [0u8; 4096];
                let header_end = loop {
                    let n = socket.read(&mut chunk).await.unwrap();
                    buf.extend_from_slice(&chunk[..n]);
                    if let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
                        break pos + 4;
                    }
                };
                let head = String::from_utf8_lossy(&buf[..header_end]).to_string();
                let content_length = head
                    .lines()
                    .find_map(|l| {
                        let (k, v) = l.split_once(':')?;
                        k.eq_ignore_ascii_case("content-length")
                            .then(|| v.trim().parse::<usize>().ok())?
                    })
                    .unwrap_or(0);
                while buf.len() < header_end + content_length {
                    let n = socket.read(&mut chunk).await.unwrap();
                    buf.extend_from_slice(&chunk[..n]);
                }
                let request_line = head.lines().next().unwrap_or_default();
                let mut parts = request_line.split_whitespace();
                let method = parts.next().unwrap_or_default();
                let path = parts.next().unwrap_or_default();
                let req_body =
                    String::from_utf8_lossy(&buf[header_end..header_end + content_length]);
                seen.push(format!("{} {}\n{}", method, path, req_body));

                let reply = format!(
                    "HTTP/1.1 {} X\r\nContent-Type: application/json\r\n\
                     Content-Length: {}\r\nConnection: close\r\n\r\n{}",
                    status,
                    body.len(),
                    body
                );
                socket.write_all(reply.as_bytes()).await.unwrap();
                socket.shutdown().await.unwrap();
            }
            seen
        });

        (base, handle)
    }

    #[test]
    fn test_query_params() {
        let q = QueryState::new(25)
            .with_search("  ann lee ")
            .with_filter("status", "active")
            .with_page(3);
        let params = query_params(&q, SearchPolicy::AllTokens);
        let pairs: Vec<(&str, &str)> =
            params.iter().map(|(k, v)| (k.as_str(), v.as_str())).collect();
        assert_eq!(
            pairs,
            vec![
                ("search", "ann lee"),
                ("match", "all"),
                ("status", "active"),
                ("page", "3"),
                ("limit", "25"),
            ]
        );
    }

    #[test]
    fn test_item_url_escapes_id() {
        let repo: HttpRepository<Subscriber> = HttpRepository::new("http://api.test/admin/");
        assert_eq!(repo.collection_url(), "http://api.test/admin/subscribers");
        assert_eq!(repo.item_url("a/b 1"), "http://api.test/admin/subscribers/a%2Fb%201");
    }

    #[tokio::test]
    async fn test_list_walks_every_page() {
        let (base, server) = fixture_server(vec![
            (
                200,
                r#"{"items":[{"id":1,"email":"a@example.com","status":"active"}],
                    "pagination":{"page":1,"limit":100,"total":2,"totalPages":2}}"#,
            ),
            (
                200,
                r#"{"items":[{"id":2,"email":"b@example.com","status":"bounced"}],
                    "pagination":{"page":2,"limit":100,"total":2,"totalPages":2}}"#,
            ),
        ])
        .await;

        let repo: HttpRepository<Subscriber> = HttpRepository::new(&base);
        let items = repo.list().await.unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[1].status, SubscriberStatus::Bounced);

        let seen = server.await.unwrap();
        assert!(seen[0].starts_with("GET /subscribers?page=1&limit=100"));
        assert!(seen[1].starts_with("GET /subscribers?page=2&limit=100"));
    }

    #[tokio::test]
    async fn test_bulk_status_posts_ids() {
        let (base, server) = fixture_server(vec![(200, r#"{"updated": 2}"#)]).await;

        let repo: HttpRepository<Subscriber> = HttpRepository::new(&base);
        let ids = vec!["1".to_string(), "2".to_string(), "3".to_string()];
        let outcome = repo.bulk_set_status(&ids, SubscriberStatus::Unsubscribed).await.unwrap();
        assert_eq!(outcome, BulkOutcome { succeeded: 2, failed: 1 });

        let seen = server.await.unwrap();
        assert_eq!(seen[0], "POST /subscribers/bulk-unsubscribe\n{\"ids\":[\"1\",\"2\",\"3\"]}");
    }

    #[tokio::test]
    async fn test_server_error_is_network_failure() {
        let (base, server) = fixture_server(vec![(500, r#"{"error":"boom"}"#)]).await;

        let repo: HttpRepository<Subscriber> = HttpRepository::new(&base);
        let result = repo.bulk_delete(&["1".to_string()]).await;
        assert!(matches!(result, Err(DomainError::Network(_))));
        server.await.unwrap();
    }

    #[tokio::test]
    async fn test_find_missing_is_none() {
        let (base, server) = fixture_server(vec![(404, "")]).await;

        let repo: HttpRepository<Subscriber> = HttpRepository::new(&base);
        assert_eq!(repo.find_by_id("9").await.unwrap(), None);
        let seen = server.await.unwrap();
        assert!(seen[0].starts_with("GET /subscribers/9"));
    }

    #[tokio::test]
    async fn test_stats_are_mapped() {
        let (base, server) = fixture_server(vec![(
            200,
            r#"{"total":3,"by_status":{"active":2,"unsubscribed":1},"new_last_7_days":1}"#,
        )])
        .await;

        let repo: HttpRepository<Subscriber> = HttpRepository::new(&base);
        let stats = repo.stats().await.unwrap();
        assert_eq!(stats.total, 3);
        assert_eq!(stats.count("active"), 2);
        assert_eq!(stats.new_last_30_days, 0);
        server.await.unwrap();
    }
}
