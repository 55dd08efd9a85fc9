mod common;

use common::TestApp;
use quire::Status;

fn seed(t: &TestApp, n: usize) {
    for i in 1..=n {
        t.insert_post(&format!("Post number {i}"), &format!("post-{i}"), "filler");
    }
}

#[tokio::test]
async fn twenty_five_posts_paginate_into_three_pages() {
    let t = TestApp::new();
    seed(&t, 25);

    let first = t.get("/").await.body_text();
    assert!(first.contains("Page 1 of 3"));
    assert!(first.contains("href=\"?page=2\""));
    assert!(!first.contains("class=\"prev\""));

    let second = t.get("/?page=2").await.body_text();
    assert!(second.contains("Page 2 of 3"));
    assert!(second.contains("href=\"?page=1\""));
    assert!(second.contains("href=\"?page=3\""));

    let third = t.get("/?page=3").await.body_text();
    assert!(third.contains("Page 3 of 3"));
    assert!(!third.contains("class=\"next\""));
    assert_eq!(third.matches("<article").count(), 5);
}

#[tokio::test]
async fn newest_post_comes_first() {
    let t = TestApp::new();
    seed(&t, 3);
    let html = t.get("/").await.body_text();
    assert!(html.find("/post/post-3/").unwrap() < html.find("/post/post-1/").unwrap());
}

#[tokio::test]
async fn bad_page_numbers_fall_back() {
    let t = TestApp::new();
    seed(&t, 25);
    assert!(t.get("/?page=abc").await.body_text().contains("Page 1 of 3"));
    assert!(t.get("/?page=42").await.body_text().contains("Page 3 of 3"));
}

#[tokio::test]
async fn empty_blog_is_one_empty_page() {
    let t = TestApp::new();
    let res = t.get("/").await;
    assert_eq!(res.status_code(), Status::Ok);
    let html = res.body_text();
    assert!(html.contains("No posts found."));
    assert!(!html.contains("class=\"pagination\""));
}

#[tokio::test]
async fn search_matches_title_or_body_ignoring_case() {
    let t = TestApp::new();
    t.insert_post("Borrow checker", "borrow", "lifetimes");
    t.insert_post("Async", "async", "The BORROW of futures");
    t.insert_post("Macros", "macros", "hygiene");

    let html = t.get("/?search=borrow").await.body_text();
    assert!(html.contains("/post/borrow/"));
    assert!(html.contains("/post/async/"));
    assert!(!html.contains("/post/macros/"));

    let none = t.get("/?search=zzz").await.body_text();
    assert!(none.contains("No posts found."));
}

#[tokio::test]
async fn search_wildcards_match_literally() {
    let t = TestApp::new();
    t.insert_post("Growth 100%", "growth", "x");
    t.insert_post("Plain", "plain", "y");

    let html = t.get("/?search=%25").await.body_text();
    assert!(html.contains("/post/growth/"));
    assert!(!html.contains("/post/plain/"));
}

#[tokio::test]
async fn page_links_keep_the_search_term() {
    let t = TestApp::new();
    for i in 1..=12 {
        t.insert_post(&format!("Rust tip {i}"), &format!("tip-{i}"), "x");
    }
    t.insert_post("Other", "other", "y");

    let html = t.get("/?search=rust").await.body_text();
    assert!(html.contains("Page 1 of 2"));
    assert!(html.contains("?search=rust&amp;page=2"));
    assert!(html.contains("value=\"rust\""));
}
