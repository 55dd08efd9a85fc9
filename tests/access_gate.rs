mod common;

use common::TestApp;
use quire::Status;

#[tokio::test]
async fn anonymous_writes_are_forbidden_before_touching_the_store() {
    let t = TestApp::new();
    t.insert_post("Existing", "existing", "body");
    t.insert_tag("Rust", "rust");

    for target in ["/post/create/", "/post/existing/update/", "/post/existing/delete/"] {
        assert_eq!(t.get(target).await.status_code(), Status::Forbidden, "GET {target}");
    }
    for target in ["/tag/create/", "/tag/rust/update/", "/tag/rust/delete/"] {
        assert_eq!(t.get(target).await.status_code(), Status::Forbidden, "GET {target}");
    }

    let attempts: [(&str, &[(&str, &str)]); 6] = [
        ("/post/create/", &[("title", "New"), ("body", "b")]),
        ("/post/existing/update/", &[("title", "Changed"), ("body", "b")]),
        ("/post/existing/delete/", &[]),
        ("/tag/create/", &[("title", "Web"), ("slug", "web")]),
        ("/tag/rust/update/", &[("title", "Changed"), ("slug", "changed")]),
        ("/tag/rust/delete/", &[]),
    ];
    for (target, form) in attempts {
        let res = t.post(target, form).await;
        assert_eq!(res.status_code(), Status::Forbidden, "POST {target}");
    }

    assert_eq!(t.post_count(), 1);
    assert_eq!(t.tag_count(), 1);
    assert!(t.get("/post/existing/").await.body_text().contains("Existing"));
    assert!(t.get("/tag/rust/").await.body_text().contains("Rust"));
}

#[tokio::test]
async fn gate_refuses_even_for_missing_entities() {
    let t = TestApp::new();
    let res = t.get("/post/ghost/update/").await;
    assert_eq!(res.status_code(), Status::Forbidden);
}

#[tokio::test]
async fn forged_session_token_is_refused() {
    let t = TestApp::new();
    let res = t.post_as("not-a-session", "/tag/create/", &[("title", "Web"), ("slug", "web")]).await;
    assert_eq!(res.status_code(), Status::Forbidden);
    assert_eq!(t.tag_count(), 0);
}

#[tokio::test]
async fn reads_stay_public() {
    let t = TestApp::new();
    t.insert_post("Public", "public", "body");
    assert_eq!(t.get("/").await.status_code(), Status::Ok);
    assert_eq!(t.get("/post/public/").await.status_code(), Status::Ok);
    assert_eq!(t.get("/tags/").await.status_code(), Status::Ok);
}

#[tokio::test]
async fn unknown_route_is_a_404_page() {
    let t = TestApp::new();
    let res = t.get("/no/such/page").await;
    assert_eq!(res.status_code(), Status::NotFound);
    assert!(res.body_text().contains("Not Found"));
}
