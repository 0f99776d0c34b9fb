use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use axum::body::{to_bytes, Body};
use axum::http::{header, HeaderMap, Request, StatusCode};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::Router;
use tokio::net::TcpListener;
use tower::ServiceExt;
use url::Url;

use mulungu_portal::models::NewsEnvelope;
use mulungu_portal::service::api::{self, AppState};
use mulungu_portal::service::caching::ResponseCache;
use mulungu_portal::service::news::{fallback_news, FeedSource, NewsConfig, NewsService};

const ORIGIN: &str = "https://www.mulungu.ce.gov.br";

async fn spawn_upstream(app: Router) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

/// An address nothing is listening on.
async fn dead_addr() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    listener.local_addr().unwrap()
}

fn config_for(addr: SocketAddr) -> NewsConfig {
    NewsConfig {
        source_url: Url::parse(&format!("http://{addr}/informa.php")).unwrap(),
        site_origin: Url::parse(ORIGIN).unwrap(),
        timeout: Duration::from_secs(2),
        ..NewsConfig::default()
    }
}

fn latin1_page(html: String) -> impl IntoResponse {
    let (bytes, _, _) = encoding_rs::WINDOWS_1252.encode(&html);
    (
        [(header::CONTENT_TYPE, "text/html; charset=iso-8859-1")],
        bytes.into_owned(),
    )
}

fn cards(count: usize) -> String {
    (0..count)
        .map(|i| {
            format!(
                r#"<div class="card"><h3>Notícia {i}</h3><a href="/informa/{i}/noticia">ler</a></div>"#
            )
        })
        .collect()
}

fn assert_well_formed(envelope: &NewsEnvelope) {
    assert!(!envelope.news.is_empty(), "news list must never be empty");
    for record in &envelope.news {
        assert!(!record.title.is_empty());
        assert!(
            record.link.starts_with("http") || record.link == "#",
            "bad link {}",
            record.link
        );
        if let Some(image) = &record.image_url {
            assert!(image.starts_with("http"), "bad image {image}");
        }
    }
}

async fn get_news(router: Router) -> (StatusCode, Vec<u8>) {
    let response = router
        .oneshot(Request::builder().uri("/api/news").body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, bytes.to_vec())
}

fn fallback_body() -> Vec<u8> {
    serde_json::to_vec(&NewsEnvelope::new(fallback_news().to_vec())).unwrap()
}

#[tokio::test]
async fn scrapes_latin1_page_into_records() {
    let page = r#"<html><body>
        <div class="card">
            <img src="/fotos/vacina.jpg">
            <span class="badge">#Vacinação</span>
            <h3>Campanha de vacinação começa na segunda</h3>
            <p>Publicado há 2 dias</p>
            <a href="/informa/5/x">Leia mais</a>
        </div>
        <div class="card"><p>Bloco sem título</p><a href="/informa/6/y">?</a></div>
        <div class="blog-post">
            <h2>Edital de licitação publicado</h2>
            <span class="label">Licitações</span>
            <a href="https://other.example/x">externo</a>
        </div>
    </body></html>"#;
    let upstream = Router::new().route("/informa.php", get(move || async move { latin1_page(page.to_string()) }));
    let addr = spawn_upstream(upstream).await;

    let service = NewsService::new(config_for(addr)).unwrap();
    let news = service.scrape().await.unwrap();

    assert_eq!(news.len(), 2);
    let first = &news[0];
    assert_eq!(first.title, "Campanha de vacinação começa na segunda");
    assert_eq!(first.category, "Saúde");
    assert_eq!(first.date, "há 2 dias");
    assert_eq!(first.link, "https://www.mulungu.ce.gov.br/informa/5/x");
    assert_eq!(first.id, Some(5));
    assert_eq!(
        first.image_url.as_deref(),
        Some("https://www.mulungu.ce.gov.br/fotos/vacina.jpg")
    );

    let second = &news[1];
    assert_eq!(second.title, "Edital de licitação publicado");
    assert_eq!(second.category, "Licitações");
    assert_eq!(second.date, "Recente");
    assert_eq!(second.link, "https://other.example/x");
    assert_eq!(second.id, Some(2));
    assert_eq!(second.image_url, None);
}

#[tokio::test]
async fn nested_cards_are_read_once_with_distinct_ids() {
    let service = NewsService::new(config_for(dead_addr().await)).unwrap();
    let news = service.parse_page(
        r#"<article class="blog-post"><div class="card"><h3>Obra A</h3><a href="/informa/2/x">ler</a></div></article>
           <article class="blog-post"><div class="card"><h3>Obra B</h3></div></article>
           <div class="card"><h3>Obra C</h3></div>"#,
    );

    let titles: Vec<&str> = news.iter().map(|r| r.title.as_str()).collect();
    assert_eq!(titles, vec!["Obra A", "Obra B", "Obra C"]);
    let ids: Vec<Option<u64>> = news.iter().map(|r| r.id).collect();
    assert_eq!(ids, vec![Some(2), Some(3), Some(4)]);
}

#[tokio::test]
async fn upstream_error_serves_exact_fallback() {
    let upstream = Router::new().route(
        "/informa.php",
        get(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "boom") }),
    );
    let addr = spawn_upstream(upstream).await;
    let service = Arc::new(NewsService::new(config_for(addr)).unwrap());

    let (status, body) = get_news(api::router(AppState::new(service))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, fallback_body());
}

#[tokio::test]
async fn unreachable_upstream_is_idempotent() {
    let service = Arc::new(NewsService::new(config_for(dead_addr().await)).unwrap());
    let router = api::router(AppState::new(service));

    let (first_status, first) = get_news(router.clone()).await;
    let (second_status, second) = get_news(router).await;
    assert_eq!(first_status, StatusCode::OK);
    assert_eq!(second_status, StatusCode::OK);
    assert_eq!(first, second);
    assert_eq!(first, fallback_body());
}

#[tokio::test]
async fn slow_upstream_times_out_to_fallback() {
    let upstream = Router::new().route(
        "/informa.php",
        get(|| async {
            tokio::time::sleep(Duration::from_secs(3)).await;
            latin1_page(cards(3))
        }),
    );
    let addr = spawn_upstream(upstream).await;
    let config = NewsConfig {
        timeout: Duration::from_millis(200),
        ..config_for(addr)
    };
    let service = NewsService::new(config).unwrap();

    let feed = service.latest().await;
    assert_eq!(feed.source, FeedSource::Fallback);
    assert_eq!(feed.news, fallback_news());
}

#[tokio::test]
async fn page_without_cards_falls_back() {
    let upstream = Router::new().route(
        "/informa.php",
        get(|| async { latin1_page("<html><body><p>Em manutenção</p></body></html>".into()) }),
    );
    let addr = spawn_upstream(upstream).await;
    let service = NewsService::new(config_for(addr)).unwrap();

    let feed = service.latest().await;
    assert_eq!(feed.source, FeedSource::Fallback);
    assert_well_formed(&feed.into_envelope());
}

#[tokio::test]
async fn caps_number_of_records() {
    let upstream = Router::new().route("/informa.php", get(|| async { latin1_page(cards(20)) }));
    let addr = spawn_upstream(upstream).await;

    let service = NewsService::new(config_for(addr)).unwrap();
    let feed = service.latest().await;
    assert_eq!(feed.source, FeedSource::Live);
    assert_eq!(feed.news.len(), 6);
    assert_well_formed(&NewsEnvelope::new(feed.news));

    let five = NewsService::new(NewsConfig {
        max_items: 5,
        ..config_for(addr)
    })
    .unwrap();
    assert_eq!(five.scrape().await.unwrap().len(), 5);
}

#[tokio::test]
async fn sends_configured_user_agent() {
    let upstream = Router::new().route(
        "/informa.php",
        get(|headers: HeaderMap| async move {
            let ua = headers
                .get(header::USER_AGENT)
                .and_then(|v| v.to_str().ok())
                .unwrap_or("none")
                .to_string();
            latin1_page(format!(r#"<div class="card"><h3>{ua}</h3></div>"#))
        }),
    );
    let addr = spawn_upstream(upstream).await;
    let service = NewsService::new(NewsConfig {
        user_agent: "portal-test/1.0".into(),
        ..config_for(addr)
    })
    .unwrap();

    let news = service.scrape().await.unwrap();
    assert_eq!(news[0].title, "portal-test/1.0");
    assert_eq!(news[0].link, "#");
}

#[tokio::test]
async fn cache_keeps_live_results_only() {
    let hits = Arc::new(AtomicUsize::new(0));
    let counter = hits.clone();
    let upstream = Router::new().route(
        "/informa.php",
        get(move || {
            let counter = counter.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                latin1_page(cards(2))
            }
        }),
    );
    let addr = spawn_upstream(upstream).await;
    let service = Arc::new(NewsService::new(config_for(addr)).unwrap());
    let state = AppState::new(service).with_cache(ResponseCache::memory(), Duration::from_secs(60));
    let router = api::router(state);

    let (_, first) = get_news(router.clone()).await;
    let (_, second) = get_news(router).await;
    assert_eq!(first, second);
    assert_eq!(hits.load(Ordering::SeqCst), 1);

    let failing = Arc::new(NewsService::new(config_for(dead_addr().await)).unwrap());
    let cache = ResponseCache::memory();
    let router = api::router(AppState::new(failing).with_cache(cache.clone(), Duration::from_secs(60)));
    let (_, body) = get_news(router).await;
    assert_eq!(body, fallback_body());
    assert_eq!(cache.get("news:latest").await.unwrap(), None);
}

#[tokio::test]
async fn health_endpoint_answers() {
    let service = Arc::new(NewsService::new(config_for(dead_addr().await)).unwrap());
    let response = api::router(AppState::new(service))
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["status"], "ok");
}

/// Scrapes the real municipal page.
///
/// Requires outbound network access, so it is ignored by default. Run manually
/// with: `cargo test -- --ignored scrapes_live_portal`.
#[tokio::test]
#[ignore = "requires network access to mulungu.ce.gov.br"]
async fn scrapes_live_portal() -> Result<(), Box<dyn std::error::Error>> {
    let service = NewsService::new(NewsConfig::default())?;
    let feed = service.latest().await;
    println!(
        "{:?} feed:\n{}",
        feed.source,
        serde_json::to_string_pretty(&feed.news)?
    );
    assert_well_formed(&feed.into_envelope());
    Ok(())
}
