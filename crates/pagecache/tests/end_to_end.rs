use std::time::Duration;

use pagecache::{CacheConfig, CachedFetcher, Error, Fetch, HttpFetcher};
use pagestore::{server, MemoryStore, RespStore};

struct Harness {
    http: mockito::ServerGuard,
    store: MemoryStore,
    store_url: String,
}

impl Harness {
    fn new() -> Self {
        let store = MemoryStore::new();
        let addr = server::spawn(store.clone()).unwrap();
        Self {
            http: mockito::Server::new(),
            store,
            store_url: format!("redis://{}", addr),
        }
    }

    fn pages(&self) -> CachedFetcher<RespStore, HttpFetcher> {
        self.pages_with(CacheConfig::default())
    }

    fn pages_with(&self, config: CacheConfig) -> CachedFetcher<RespStore, HttpFetcher> {
        let store = RespStore::connect(&self.store_url).unwrap();
        CachedFetcher::with_config(store, HttpFetcher::new().unwrap(), config)
    }

    fn redis(&self) -> redis::Connection {
        redis::Client::open(self.store_url.as_str())
            .unwrap()
            .get_connection()
            .unwrap()
    }
}

#[test]
fn test_first_call_populates_store() {
    let mut h = Harness::new();
    let mock = h
        .http
        .mock("GET", "/")
        .with_body("<html>example</html>")
        .expect(2)
        .create();
    let url = format!("{}/", h.http.url());

    let direct = HttpFetcher::new().unwrap().fetch(&url).unwrap();
    let mut pages = h.pages();
    let body = pages.fetch_with_cache(&url).unwrap();

    assert_eq!(body, direct);
    mock.assert();

    let mut con = h.redis();
    let count: i64 = redis::cmd("GET")
        .arg(format!("count:{}", url))
        .query(&mut con)
        .unwrap();
    assert_eq!(count, 1);

    let cached: String = redis::cmd("GET")
        .arg(format!("cached:{}", url))
        .query(&mut con)
        .unwrap();
    assert_eq!(cached, body);

    let ttl: i64 = redis::cmd("TTL")
        .arg(format!("cached:{}", url))
        .query(&mut con)
        .unwrap();
    assert!((9..=10).contains(&ttl), "ttl was {}", ttl);

    let counter_ttl: i64 = redis::cmd("TTL")
        .arg(format!("count:{}", url))
        .query(&mut con)
        .unwrap();
    assert_eq!(counter_ttl, -1);
}

#[test]
fn test_second_call_served_from_cache() {
    let mut h = Harness::new();
    let mock = h
        .http
        .mock("GET", "/slow")
        .with_body("slow page")
        .expect(1)
        .create();
    let url = format!("{}/slow", h.http.url());

    let mut pages = h.pages();
    let first = pages.fetch_with_cache(&url).unwrap();
    let second = pages.fetch_with_cache(&url).unwrap();

    assert_eq!(first, second);
    assert_eq!(pages.access_count(&url).unwrap(), 2);
    mock.assert();
}

#[test]
fn test_error_status_is_cached_like_any_body() {
    let mut h = Harness::new();
    let mock = h
        .http
        .mock("GET", "/gone")
        .with_status(500)
        .with_body("server exploded")
        .expect(1)
        .create();
    let url = format!("{}/gone", h.http.url());

    let mut pages = h.pages();
    assert_eq!(pages.fetch_with_cache(&url).unwrap(), "server exploded");
    assert_eq!(pages.fetch_with_cache(&url).unwrap(), "server exploded");
    mock.assert();
}

#[test]
fn test_expiry_triggers_refetch() {
    let mut h = Harness::new();
    let mock = h
        .http
        .mock("GET", "/page")
        .with_body("page")
        .expect(2)
        .create();
    let url = format!("{}/page", h.http.url());

    let mut pages = h.pages_with(CacheConfig::default().with_ttl(Duration::from_millis(150)));
    pages.fetch_with_cache(&url).unwrap();
    std::thread::sleep(Duration::from_millis(300));
    pages.fetch_with_cache(&url).unwrap();

    mock.assert();
    assert_eq!(pages.access_count(&url).unwrap(), 2);
}

#[test]
fn test_callers_share_the_store() {
    let mut h = Harness::new();
    let mock = h
        .http
        .mock("GET", "/shared")
        .with_body("shared")
        .expect(1)
        .create();
    let url = format!("{}/shared", h.http.url());

    let mut a = h.pages();
    let mut b = h.pages();
    a.fetch_with_cache(&url).unwrap();
    b.fetch_with_cache(&url).unwrap();

    mock.assert();
    assert_eq!(b.stats().hits, 1);
    assert_eq!(h.store.get_shared(&format!("count:{}", url)), Some(b"2".to_vec()));
}

#[test]
fn test_network_failure_counts_but_does_not_cache() {
    let h = Harness::new();
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let dead = format!("http://{}/", listener.local_addr().unwrap());
    drop(listener);

    let mut pages = h.pages();
    assert!(matches!(
        pages.fetch_with_cache(&dead),
        Err(Error::Network(_))
    ));
    assert_eq!(pages.access_count(&dead).unwrap(), 1);
    assert!(!h.store.contains(&format!("cached:{}", dead)));
}

#[test]
fn test_store_lifecycle_and_connect_failure() {
    let h = Harness::new();
    let store = RespStore::connect(&h.store_url).unwrap();
    store.close().unwrap();

    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let dead = listener.local_addr().unwrap().to_string();
    drop(listener);

    assert!(matches!(
        RespStore::connect(&dead).map_err(Error::from),
        Err(Error::Store(pagestore::Error::Redis(_)))
    ));
}
