mod common;

use common::TestApp;
use quire::Status;

#[tokio::test]
async fn liveness_is_always_ok() {
    let t = TestApp::new();
    let res = t.get("/healthz").await;
    assert_eq!(res.status_code(), Status::Ok);
    assert_eq!(res.body_text(), "ok");
}

#[tokio::test]
async fn readiness_reflects_the_store() {
    let t = TestApp::new();
    let res = t.get("/readyz").await;
    assert_eq!(res.status_code(), Status::Ok);
    assert_eq!(res.body_text(), "ready");
}

#[tokio::test]
async fn probes_reject_other_methods() {
    let t = TestApp::new();
    let res = t.post("/healthz", &[]).await;
    assert_eq!(res.status_code(), Status::MethodNotAllowed);
}
