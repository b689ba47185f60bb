//! Generic remote-list store
//!
//! One [`ListResourceStore`] backs one resource-list screen. It turns
//! "page N, sorted by X, filtered by keyword Y" into a single GET against the
//! collection URL and publishes the normalized result as [`ListState`].

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use devops_console_api::{
    ApiClient, ApiGroup, HttpUtils, Limit, ListQuery, ListResponse, ResourceScope,
};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::sync::watch;

use crate::error::CoreResult;

/// Maps one raw server record into the record shape list screens render.
///
/// `Raw` is the typed schema the response is checked against; a payload that
/// does not match fails the fetch with a parse error instead of producing
/// half-filled records.
pub trait Normalizer: Send + Sync + 'static {
    type Raw: DeserializeOwned + Send;
    type Record: Clone + Send + Sync + 'static;

    fn normalize(&self, raw: Self::Raw) -> Self::Record;
}

/// Where the latest fetch is in its lifecycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FetchStatus {
    #[default]
    Idle,
    Loading,
    Loaded,
    Failed,
}

/// Observable state of one resource list.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListState<R> {
    pub items: Vec<R>,
    /// Server-reported total, or `items.len()` when the server omits it.
    pub total: u64,
    pub page: u32,
    pub limit: Limit,
    pub order: Option<String>,
    pub reverse: bool,
    pub keyword: Option<String>,
    pub is_loading: bool,
    pub selected_row_keys: Vec<String>,
    pub status: FetchStatus,
}

impl<R> Default for ListState<R> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            total: 0,
            page: 1,
            limit: Limit::default(),
            order: None,
            reverse: false,
            keyword: None,
            is_loading: false,
            selected_row_keys: Vec::new(),
            status: FetchStatus::Idle,
        }
    }
}

impl<R> ListState<R> {
    /// Number of pages the pagination control should offer.
    pub fn page_count(&self) -> u64 {
        match self.limit {
            Limit::Paged(limit) if limit > 0 => self.total.div_ceil(u64::from(limit)).max(1),
            _ => 1,
        }
    }
}

/// Result of a fetch that reached the server successfully.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchOutcome {
    /// The response became the new state.
    Applied,
    /// A newer fetch was issued while this one was in flight; its response was dropped.
    Superseded,
}

/// Arguments of one `fetch_list` call.
///
/// The scope ends up in the request path; everything in `query` ends up in
/// the query string.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListOptions {
    pub scope: ResourceScope,
    pub query: ListQuery,
}

impl ListOptions {
    pub fn new(scope: ResourceScope) -> Self {
        Self {
            scope,
            query: ListQuery::default(),
        }
    }

    #[must_use]
    pub fn limit(mut self, limit: Limit) -> Self {
        self.query.limit = limit;
        self
    }

    #[must_use]
    pub fn page(mut self, page: u32) -> Self {
        self.query.page = page;
        self
    }

    #[must_use]
    pub fn order(mut self, field: impl Into<String>) -> Self {
        self.query.order = Some(field.into());
        self
    }

    #[must_use]
    pub fn reverse(mut self, reverse: bool) -> Self {
        self.query.reverse = reverse;
        self
    }

    #[must_use]
    pub fn keyword(mut self, keyword: impl Into<String>) -> Self {
        self.query.keyword = Some(keyword.into());
        self
    }

    #[must_use]
    pub fn label_selector(mut self, selector: impl Into<String>) -> Self {
        self.query.label_selector = Some(selector.into());
        self
    }
}

/// Clears `is_loading` if the fetch that armed it exits without applying a
/// response: an error, a parse failure, or the future being dropped.
struct LoadingGuard<'a, R> {
    state: &'a watch::Sender<ListState<R>>,
    latest: &'a AtomicU64,
    seq: u64,
    armed: bool,
}

impl<R> LoadingGuard<'_, R> {
    fn disarm(mut self) {
        self.armed = false;
    }
}

impl<R> Drop for LoadingGuard<'_, R> {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        let seq = self.seq;
        let latest = self.latest;
        self.state.send_if_modified(|state| {
            // A newer fetch owns the loading flag now.
            if latest.load(Ordering::SeqCst) != seq {
                return false;
            }
            state.is_loading = false;
            state.status = FetchStatus::Failed;
            true
        });
    }
}

/// State-and-fetch container for one resource collection.
///
/// Single writer: only `fetch_list` and `set_selected_row_keys` mutate the
/// state. Any number of readers observe it through [`subscribe`](Self::subscribe).
pub struct ListResourceStore<N: Normalizer> {
    client: Arc<dyn ApiClient>,
    group: ApiGroup,
    resource: String,
    normalizer: N,
    state: watch::Sender<ListState<N::Record>>,
    latest_seq: AtomicU64,
}

impl<N: Normalizer> ListResourceStore<N> {
    pub fn new(
        client: Arc<dyn ApiClient>,
        group: ApiGroup,
        resource: impl Into<String>,
        normalizer: N,
    ) -> Self {
        Self {
            client,
            group,
            resource: resource.into(),
            normalizer,
            state: watch::Sender::new(ListState::default()),
            latest_seq: AtomicU64::new(0),
        }
    }

    pub fn resource(&self) -> &str {
        &self.resource
    }

    pub fn collection_url(&self, scope: &ResourceScope) -> String {
        self.group.collection_url(scope, &self.resource)
    }

    /// Fetch one page and publish it.
    ///
    /// `is_loading` is published before the request goes out. Errors are
    /// returned unchanged and leave the previous items in place with
    /// `status == Failed`. When another fetch was issued after this one, the
    /// response is dropped and [`FetchOutcome::Superseded`] is returned.
    pub async fn fetch_list(&self, options: ListOptions) -> CoreResult<FetchOutcome> {
        let ListOptions { scope, query } = options;
        let url = self.collection_url(&scope);
        let params = query.to_params();

        let mut seq = 0;
        self.state.send_modify(|state| {
            seq = self.latest_seq.fetch_add(1, Ordering::SeqCst) + 1;
            state.is_loading = true;
            state.status = FetchStatus::Loading;
        });
        let guard = LoadingGuard {
            state: &self.state,
            latest: &self.latest_seq,
            seq,
            armed: true,
        };

        log::debug!("[{}] fetch #{seq}: GET {url} {params:?}", self.resource);
        let body = self.client.get(&url, &params).await?;
        let page: ListResponse<N::Raw> = HttpUtils::from_value(body)?;

        let total = page.total();
        let items: Vec<N::Record> = page
            .items
            .into_iter()
            .map(|raw| self.normalizer.normalize(raw))
            .collect();

        let applied = self.state.send_if_modified(|state| {
            if self.latest_seq.load(Ordering::SeqCst) != seq {
                return false;
            }
            *state = ListState {
                items,
                total,
                page: query.page,
                limit: query.limit,
                order: query.order,
                reverse: query.reverse,
                keyword: query.keyword,
                is_loading: false,
                selected_row_keys: Vec::new(),
                status: FetchStatus::Loaded,
            };
            true
        });
        guard.disarm();

        if applied {
            Ok(FetchOutcome::Applied)
        } else {
            log::debug!("[{}] fetch #{seq} superseded, response dropped", self.resource);
            Ok(FetchOutcome::Superseded)
        }
    }

    /// Replace the batch selection. Keys are not checked against `items`.
    pub fn set_selected_row_keys(&self, keys: Vec<String>) {
        self.state.send_modify(|state| state.selected_row_keys = keys);
    }

    pub fn subscribe(&self) -> watch::Receiver<ListState<N::Record>> {
        self.state.subscribe()
    }

    /// Snapshot of the current state.
    pub fn state(&self) -> ListState<N::Record> {
        self.state.borrow().clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{list_body, mock_client, object, server_error, MockApiClient};
    use devops_console_api::{ApiError, ObjectMeta};
    use serde::Deserialize;

    const PATH: &str = "kapis/devops.kubesphere.io/v1alpha3/devopsprojects";

    #[derive(Deserialize)]
    struct RawNamed {
        metadata: ObjectMeta,
    }

    struct NameNormalizer;

    impl Normalizer for NameNormalizer {
        type Raw = RawNamed;
        type Record = String;

        fn normalize(&self, raw: RawNamed) -> String {
            raw.metadata.name.to_uppercase()
        }
    }

    fn store(client: &Arc<MockApiClient>) -> Arc<ListResourceStore<NameNormalizer>> {
        Arc::new(ListResourceStore::new(
            client.clone(),
            ApiGroup::Devops,
            "devopsprojects",
            NameNormalizer,
        ))
    }

    fn options() -> ListOptions {
        ListOptions::new(ResourceScope::new())
    }

    #[tokio::test]
    async fn initial_state_is_idle() {
        let client = mock_client();
        let state = store(&client).state();
        assert_eq!(state, ListState::default());
        assert!(!state.is_loading);
        assert_eq!(state.status, FetchStatus::Idle);
        assert_eq!(state.page, 1);
    }

    #[tokio::test]
    async fn paged_fetch_sends_paging_and_applies_page() {
        let client = mock_client();
        client
            .respond_ok("GET", PATH, list_body(vec![object("a"), object("b")], Some(5)))
            .await;
        let store = store(&client);

        let outcome = store
            .fetch_list(options().limit(Limit::Paged(2)).page(2))
            .await
            .unwrap();
        assert_eq!(outcome, FetchOutcome::Applied);

        let request = client.last_request().await.unwrap();
        assert_eq!(request.param("paging"), Some("limit=2,page=2"));

        let state = store.state();
        assert_eq!(state.items, vec!["A".to_string(), "B".to_string()]);
        assert_eq!(state.total, 5);
        assert_eq!(state.page, 2);
        assert_eq!(state.limit, Limit::Paged(2));
        assert!(!state.is_loading);
        assert!(state.selected_row_keys.is_empty());
        assert_eq!(state.status, FetchStatus::Loaded);
        assert_eq!(state.page_count(), 3);
    }

    #[tokio::test]
    async fn unlimited_fetch_omits_paging() {
        let client = mock_client();
        client
            .respond_ok("GET", PATH, list_body(vec![object("a")], None))
            .await;
        let store = store(&client);

        store
            .fetch_list(options().limit(Limit::Unlimited))
            .await
            .unwrap();

        let request = client.last_request().await.unwrap();
        assert_eq!(request.param("paging"), None);
        assert_eq!(store.state().limit, Limit::Unlimited);
    }

    #[tokio::test]
    async fn missing_total_count_falls_back_to_item_count() {
        let client = mock_client();
        client
            .respond_ok("GET", PATH, list_body(vec![object("a")], None))
            .await;
        let store = store(&client);

        store.fetch_list(options()).await.unwrap();
        assert_eq!(store.state().total, 1);
    }

    #[tokio::test]
    async fn zero_total_count_with_items_counts_the_page() {
        let client = mock_client();
        client
            .respond_ok("GET", PATH, list_body(vec![object("a"), object("b")], Some(0)))
            .await;
        let store = store(&client);

        store
            .fetch_list(options().limit(Limit::Paged(1)))
            .await
            .unwrap();
        let state = store.state();
        assert_eq!(state.items.len(), 2);
        assert_eq!(state.total, 2);
        assert_eq!(state.page_count(), 2);
    }

    #[tokio::test]
    async fn total_never_below_returned_items() {
        let client = mock_client();
        client
            .respond_ok(
                "GET",
                PATH,
                list_body(vec![object("a"), object("b"), object("c")], Some(2)),
            )
            .await;
        let store = store(&client);

        store.fetch_list(options()).await.unwrap();
        let state = store.state();
        assert!(state.total >= state.items.len() as u64);
        assert_eq!(state.total, 3);
    }

    #[tokio::test]
    async fn keyword_sort_and_reverse_become_params() {
        let client = mock_client();
        client.respond_ok("GET", PATH, list_body(vec![], Some(0))).await;
        let store = store(&client);

        store
            .fetch_list(options().keyword("foo").order("createTime").reverse(true))
            .await
            .unwrap();
        let request = client.last_request().await.unwrap();
        assert!(request.param("conditions").unwrap().contains("foo"));
        assert_eq!(request.param("orderBy"), Some("createTime"));
        assert_eq!(request.param("reverse"), Some("true"));

        let state = store.state();
        assert_eq!(state.keyword.as_deref(), Some("foo"));
        assert_eq!(state.order.as_deref(), Some("createTime"));
        assert!(state.reverse);

        store.fetch_list(options()).await.unwrap();
        let request = client.last_request().await.unwrap();
        assert_eq!(request.param("conditions"), None);
        assert_eq!(request.param("orderBy"), None);
        assert_eq!(request.param("reverse"), None);
    }

    #[tokio::test]
    async fn scope_goes_into_path_only() {
        let client = mock_client();
        let scoped = "kapis/devops.kubesphere.io/v1alpha3/klusters/host/workspaces/ws1/devopsprojects";
        client.respond_ok("GET", scoped, list_body(vec![], None)).await;
        let store = store(&client);

        store
            .fetch_list(ListOptions::new(
                ResourceScope::new().cluster("host").workspace("ws1"),
            ))
            .await
            .unwrap();

        let request = client.last_request().await.unwrap();
        assert_eq!(request.path, scoped);
        assert!(request
            .query
            .iter()
            .all(|(_, v)| !v.contains("host") && !v.contains("ws1")));
    }

    #[tokio::test]
    async fn selection_is_replaced_then_cleared_by_next_fetch() {
        let client = mock_client();
        client
            .respond_ok("GET", PATH, list_body(vec![object("a")], None))
            .await;
        let store = store(&client);
        store.fetch_list(options()).await.unwrap();

        store.set_selected_row_keys(vec!["x".to_string(), "y".to_string()]);
        assert_eq!(store.state().selected_row_keys, ["x", "y"]);

        store.fetch_list(options()).await.unwrap();
        assert!(store.state().selected_row_keys.is_empty());
    }

    #[tokio::test]
    async fn identical_fetches_yield_identical_state() {
        let client = mock_client();
        client
            .respond_ok("GET", PATH, list_body(vec![object("a"), object("b")], Some(7)))
            .await;
        let store = store(&client);

        store.fetch_list(options().page(3)).await.unwrap();
        let first = store.state();
        store.fetch_list(options().page(3)).await.unwrap();
        assert_eq!(store.state(), first);
    }

    #[tokio::test]
    async fn loading_is_published_before_response() {
        let client = mock_client();
        client
            .respond_ok("GET", PATH, list_body(vec![object("a")], None))
            .await;
        let store = store(&client);
        let (arrived, release) = client.hold_next_request().await;

        let task = {
            let store = store.clone();
            tokio::spawn(async move { store.fetch_list(options()).await })
        };
        arrived.await.unwrap();

        let state = store.state();
        assert!(state.is_loading);
        assert_eq!(state.status, FetchStatus::Loading);

        release.send(()).unwrap();
        assert_eq!(task.await.unwrap().unwrap(), FetchOutcome::Applied);
        assert!(!store.state().is_loading);
    }

    #[tokio::test]
    async fn failed_fetch_clears_loading_and_keeps_items() {
        let client = mock_client();
        client
            .respond_ok("GET", PATH, list_body(vec![object("a")], None))
            .await;
        client.respond("GET", PATH, Err(server_error(500))).await;
        let store = store(&client);

        store.fetch_list(options()).await.unwrap();
        let err = store.fetch_list(options()).await.unwrap_err();
        assert!(matches!(
            err,
            crate::CoreError::Api(ApiError::ServerError { status: 500, .. })
        ));

        let state = store.state();
        assert!(!state.is_loading);
        assert_eq!(state.status, FetchStatus::Failed);
        assert_eq!(state.items, vec!["A".to_string()]);
    }

    #[tokio::test]
    async fn malformed_payload_is_a_parse_error() {
        let client = mock_client();
        client
            .respond_ok("GET", PATH, serde_json::json!({ "items": [{ "metadata": 3 }] }))
            .await;
        let store = store(&client);

        let err = store.fetch_list(options()).await.unwrap_err();
        assert!(matches!(err, crate::CoreError::Api(ApiError::ParseError { .. })));
        assert_eq!(store.state().status, FetchStatus::Failed);
    }

    #[tokio::test]
    async fn stale_response_is_discarded() {
        let client = mock_client();
        client
            .respond_ok("GET", PATH, list_body(vec![object("old")], None))
            .await;
        client
            .respond_ok("GET", PATH, list_body(vec![object("new")], None))
            .await;
        let store = store(&client);
        let (arrived, release) = client.hold_next_request().await;

        let slow = {
            let store = store.clone();
            tokio::spawn(async move { store.fetch_list(options().page(1)).await })
        };
        arrived.await.unwrap();

        let fast = store.fetch_list(options().page(2)).await.unwrap();
        assert_eq!(fast, FetchOutcome::Applied);

        release.send(()).unwrap();
        assert_eq!(slow.await.unwrap().unwrap(), FetchOutcome::Superseded);

        let state = store.state();
        assert_eq!(state.items, vec!["NEW".to_string()]);
        assert_eq!(state.page, 2);
        assert!(!state.is_loading);
        assert_eq!(state.status, FetchStatus::Loaded);
    }

    #[tokio::test]
    async fn stale_failure_does_not_touch_newer_fetch() {
        let client = mock_client();
        client.respond("GET", PATH, Err(server_error(502))).await;
        client
            .respond_ok("GET", PATH, list_body(vec![object("b")], None))
            .await;
        let store = store(&client);
        let (arrived, release) = client.hold_next_request().await;

        let slow = {
            let store = store.clone();
            tokio::spawn(async move { store.fetch_list(options()).await })
        };
        arrived.await.unwrap();
        store.fetch_list(options()).await.unwrap();

        release.send(()).unwrap();
        assert!(slow.await.unwrap().is_err());
        assert_eq!(store.state().status, FetchStatus::Loaded);
    }

    #[tokio::test]
    async fn dropped_fetch_clears_loading() {
        let client = mock_client();
        client.respond_ok("GET", PATH, list_body(vec![], None)).await;
        let store = store(&client);
        let (arrived, _release) = client.hold_next_request().await;

        let task = {
            let store = store.clone();
            tokio::spawn(async move { store.fetch_list(options()).await })
        };
        arrived.await.unwrap();
        assert!(store.state().is_loading);

        task.abort();
        assert!(task.await.unwrap_err().is_cancelled());

        let state = store.state();
        assert!(!state.is_loading);
        assert_eq!(state.status, FetchStatus::Failed);
    }

    #[tokio::test]
    async fn subscribers_see_each_published_state() {
        let client = mock_client();
        client
            .respond_ok("GET", PATH, list_body(vec![object("a")], None))
            .await;
        let store = store(&client);
        let mut rx = store.subscribe();
        assert!(!rx.has_changed().unwrap());

        store.fetch_list(options()).await.unwrap();
        assert!(rx.has_changed().unwrap());
        assert_eq!(rx.borrow_and_update().items, vec!["A".to_string()]);

        store.set_selected_row_keys(vec!["a".to_string()]);
        assert!(rx.has_changed().unwrap());
        assert_eq!(rx.borrow_and_update().selected_row_keys, ["a"]);
    }

    #[test]
    fn page_count_rounds_up() {
        let mut state = ListState::<String> {
            total: 21,
            ..ListState::default()
        };
        assert_eq!(state.page_count(), 3);
        state.total = 0;
        assert_eq!(state.page_count(), 1);
        state.limit = Limit::Unlimited;
        state.total = 100;
        assert_eq!(state.page_count(), 1);
    }
}
