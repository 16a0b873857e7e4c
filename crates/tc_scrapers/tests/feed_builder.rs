use chrono::{TimeZone, Utc};
use rss::Channel;
use std::collections::HashSet;
use std::fs;
use std::sync::Once;
use std::time::Duration;
use tc_scrapers::prelude::*;
use tempfile::tempdir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

static INIT: Once = Once::new();

fn init_tracing() {
    INIT.call_once(|| {
        tracing_subscriber::fmt()
            .with_max_level(tracing::Level::DEBUG)
            .with_test_writer()
            .try_init()
            .ok();
    });
}

const LISTING: &str = r#"<!DOCTYPE html>
<html><head><title>Transformer Circuits Thread</title></head>
<body>
  <a class="paper" href="2024/scaling/index.html">
    <h3>Scaling Monosemanticity</h3>
    <div class="description">Extracting interpretable features.</div>
  </a>
  <a class="note" href="2025/update/index.html">
    <h3>Circuits   Updates &amp; Notes</h3>
  </a>
  <a class="note" href="/2024/scaling/index.html#method">
    <h3>Scaling Monosemanticity (again)</h3>
  </a>
  <a class="note" href="2023/broken/index.html">
    <h3>Broken Detail</h3>
    <div class="note-description">Listing summary survives.</div>
  </a>
</body></html>"#;

fn detail_page(date: &str, description: &str) -> String {
    format!(
        r#"<html><head>
             <meta property="article:published_time" content="{}">
             <meta name="description" content="{}">
           </head><body><p>Body</p></body></html>"#,
        date, description
    )
}

async fn mount_html(server: &MockServer, route: &str, body: impl Into<Vec<u8>>, content_type: &str) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(ResponseTemplate::new(200).set_body_raw(body.into(), content_type))
        .mount(server)
        .await;
}

async fn site() -> MockServer {
    let server = MockServer::start().await;
    mount_html(&server, "/", LISTING, "text/html; charset=utf-8").await;
    mount_html(
        &server,
        "/2024/scaling/index.html",
        detail_page("2024-05-21T00:00:00Z", "Detail summary"),
        "text/html",
    )
    .await;
    mount_html(
        &server,
        "/2025/update/index.html",
        detail_page("2025-09-10T12:00:00Z", "Monthly updates from the team"),
        "text/html",
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/2023/broken/index.html"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;
    server
}

fn config_for(server: &MockServer) -> FeedConfig {
    FeedConfig {
        request_delay: Duration::ZERO,
        timeout: Duration::from_secs(5),
        ..FeedConfig::default().with_source_url(format!("{}/", server.uri()))
    }
}

fn without_build_date(xml: &str) -> String {
    xml.lines().filter(|line| !line.contains("<lastBuildDate>")).collect::<Vec<_>>().join("\n")
}

#[tokio::test]
async fn test_builds_feed_end_to_end() {
    init_tracing();
    let server = site().await;
    let dir = tempdir().unwrap();
    let output = dir.path().join("docs").join("index.xml");

    let builder = FeedBuilder::new(config_for(&server)).unwrap();
    let summary = builder.build(&format!("{}/", server.uri()), &output).await.unwrap();
    assert_eq!(summary.items, 3);
    assert_eq!(summary.dated, 2);

    let channel = Channel::read_from(fs::read(&output).unwrap().as_slice()).unwrap();
    assert_eq!(channel.title(), "Transformer Circuits (Unofficial)");
    assert_eq!(channel.language(), Some("en"));
    assert!(channel.last_build_date().is_some());

    let items = channel.items();
    let titles: Vec<_> = items.iter().map(|i| i.title().unwrap()).collect();
    assert_eq!(titles, vec!["Circuits Updates & Notes", "Scaling Monosemanticity", "Broken Detail"]);

    // Newest first, RFC 2822 dates.
    assert_eq!(items[0].pub_date(), Some("Wed, 10 Sep 2025 12:00:00 +0000"));
    assert_eq!(items[1].pub_date(), Some("Tue, 21 May 2024 00:00:00 +0000"));

    // Listing description wins; detail description fills the gap.
    assert_eq!(items[0].description(), Some("Monthly updates from the team"));
    assert_eq!(items[1].description(), Some("Extracting interpretable features."));

    // The failed detail fetch degrades the entry instead of dropping it.
    assert_eq!(items[2].pub_date(), None);
    assert_eq!(items[2].description(), Some("Listing summary survives."));

    let links: Vec<_> = items.iter().map(|i| i.link().unwrap().to_string()).collect();
    let unique: HashSet<_> = links.iter().collect();
    assert_eq!(unique.len(), links.len());
    assert!(links.iter().all(|l| l.starts_with(&server.uri())));
}

#[tokio::test]
async fn test_rerun_is_deterministic() {
    init_tracing();
    let server = site().await;
    let dir = tempdir().unwrap();
    let first = dir.path().join("first.xml");
    let second = dir.path().join("second.xml");

    let builder = FeedBuilder::new(config_for(&server)).unwrap();
    let source = format!("{}/", server.uri());
    builder.build(&source, &first).await.unwrap();
    builder.build(&source, &second).await.unwrap();

    let first = fs::read_to_string(first).unwrap();
    let second = fs::read_to_string(second).unwrap();
    assert_eq!(without_build_date(&first), without_build_date(&second));
}

#[tokio::test]
async fn test_listing_failure_leaves_existing_feed_untouched() {
    init_tracing();
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(502))
        .mount(&server)
        .await;

    let dir = tempdir().unwrap();
    let output = dir.path().join("index.xml");
    fs::write(&output, "<rss>previous run</rss>").unwrap();

    let builder = FeedBuilder::new(config_for(&server)).unwrap();
    let err = builder.build(&format!("{}/", server.uri()), &output).await.unwrap_err();

    assert!(matches!(err, Error::Fetch { .. }));
    assert!(err.is_fatal());
    assert_eq!(fs::read_to_string(&output).unwrap(), "<rss>previous run</rss>");
    assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 1);
}

#[tokio::test]
async fn test_unparseable_listing_leaves_existing_feed_untouched() {
    init_tracing();
    let server = MockServer::start().await;
    mount_html(&server, "/", "<html><body><p>Redesigned!</p></body></html>", "text/html").await;

    let dir = tempdir().unwrap();
    let output = dir.path().join("index.xml");
    fs::write(&output, "<rss>previous run</rss>").unwrap();

    let builder = FeedBuilder::new(config_for(&server)).unwrap();
    let err = builder.build(&format!("{}/", server.uri()), &output).await.unwrap_err();

    assert!(matches!(err, Error::Parse { .. }));
    assert_eq!(fs::read_to_string(&output).unwrap(), "<rss>previous run</rss>");
}

#[tokio::test]
async fn test_legacy_charset_is_decoded() {
    init_tracing();
    let server = MockServer::start().await;
    // windows-1252 bytes, declared only in markup.
    let mut body = b"<html><head><meta charset=\"windows-1252\"></head><body>".to_vec();
    body.extend_from_slice(b"<a class=\"note\" href=\"/n.html\"><h3>Na\xefve Caf\xe9 \x96 Notes</h3></a>");
    body.extend_from_slice(b"</body></html>");
    mount_html(&server, "/", body, "text/html").await;

    let config = FeedConfig { fetch_details: false, ..config_for(&server) };
    let builder = FeedBuilder::new(config).unwrap();
    let entries = builder.collect_entries(&format!("{}/", server.uri())).await.unwrap();

    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].title, "Naïve Café – Notes");
    assert!(!entries[0].title.contains('\u{FFFD}'));
}

#[tokio::test]
async fn test_last_modified_header_dates_undated_pages() {
    init_tracing();
    let server = MockServer::start().await;
    mount_html(
        &server,
        "/",
        r#"<html><body><a class="note" href="/n.html"><h3>N</h3></a></body></html>"#,
        "text/html",
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/n.html"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_raw("<html><body><p>no meta</p></body></html>", "text/html")
                .insert_header("Last-Modified", "Mon, 02 Jun 2025 08:00:00 GMT"),
        )
        .mount(&server)
        .await;

    let builder = FeedBuilder::new(config_for(&server)).unwrap();
    let entries = builder.collect_entries(&format!("{}/", server.uri())).await.unwrap();
    assert_eq!(entries[0].published_at, Some(Utc.with_ymd_and_hms(2025, 6, 2, 8, 0, 0).unwrap()));
}
