//! Typed endpoint coverage for the gateway surfaces beyond the auth
//! lifecycle: groups, the listing reservation lifecycle, departments,
//! message deletion and the platform-admin stats/management calls, all
//! against an in-process HTTP stub.

use axum::extract::Path;
use axum::http::{HeaderMap, StatusCode};
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use serde_json::{json, Value};

use unilink_client::auth::AuthManager;
use unilink_client::config::ClientConfig;
use unilink_client::models::{CreateCollegeAdmin, CreateGroup, User};
use unilink_client::store::TokenStore;

const TOKEN: &str = "tok-1";

fn authorized(headers: &HeaderMap) -> bool {
    headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .map(|v| v == format!("Bearer {}", TOKEN))
        .unwrap_or(false)
}

fn group_json(id: u64, name: &str, is_member: bool) -> Value {
    json!({
        "id": id, "name": name, "description": "", "type": "public",
        "avatar": "", "memberCount": 3, "isMember": is_member,
        "createdAt": "2026-08-01 10:00:00"
    })
}

fn listing_json(id: u64, status: &str) -> Value {
    json!({
        "id": id, "title": "Used oscilloscope", "description": "", "price": 120.0,
        "imageUrl": "", "status": status, "sellerId": 2, "collegeId": 1
    })
}

async fn my_groups(headers: HeaderMap) -> (StatusCode, Json<Value>) {
    if !authorized(&headers) {
        return (StatusCode::UNAUTHORIZED, Json(json!({"error": "Invalid or expired token"})));
    }
    (StatusCode::OK, Json(json!({"groups": [group_json(1, "CSE Sem 4", true), group_json(2, "Robotics Club", true)]})))
}

async fn group_detail(Path(id): Path<u64>) -> Json<Value> {
    let mut detail = group_json(id, "Robotics Club", false);
    detail["members"] = json!([
        {"id": 1, "name": "Asha", "role": "admin", "joinedAt": "2026-08-01 10:00:00"},
        {"id": 2, "name": "Ben", "role": "member", "joinedAt": "2026-08-02 09:30:00"}
    ]);
    Json(detail)
}

async fn join_group(Path(_id): Path<u64>) -> Json<Value> {
    Json(json!({"message": "Joined group successfully"}))
}

async fn my_reservations() -> Json<Value> {
    Json(json!([listing_json(5, "reserved")]))
}

async fn cancel_reservation(Path(id): Path<u64>) -> Json<Value> {
    Json(json!({"message": "Reservation cancelled", "listing": listing_json(id, "available")}))
}

async fn mark_sold(Path(id): Path<u64>) -> Json<Value> {
    Json(json!({"message": "Listing marked as sold", "listing": listing_json(id, "sold")}))
}

async fn departments() -> Json<Value> {
    Json(json!({"departments": ["CSE", "ECE", "MECH"]}))
}

async fn delete_message(Path(_id): Path<u64>) -> Json<Value> {
    Json(json!({"message": "Message deleted"}))
}

async fn create_group(Json(body): Json<Value>) -> (StatusCode, Json<Value>) {
    if body["name"].as_str().unwrap_or_default().is_empty() {
        return (StatusCode::BAD_REQUEST, Json(json!({"error": "Group name is required"})));
    }
    let mut group = group_json(9, body["name"].as_str().unwrap(), false);
    group["memberCount"] = json!(0);
    (StatusCode::CREATED, Json(json!({"message": "Official group created successfully", "group": group})))
}

async fn create_college_admin(Json(body): Json<Value>) -> (StatusCode, Json<Value>) {
    if body["collegeCode"] == "NOPE" {
        return (StatusCode::NOT_FOUND, Json(json!({"error": "College not found"})));
    }
    (StatusCode::CREATED, Json(json!({"message": "College admin created successfully"})))
}

async fn platform_stats() -> Json<Value> {
    Json(json!({
        "totalColleges": 2, "totalStudents": 41, "totalListings": 7,
        "collegeStats": [
            {"collegeCode": "VIT", "collegeName": "VIT", "studentCount": 30, "listingCount": 5, "activeListings": 4},
            {"collegeCode": "SRM", "collegeName": "SRM", "studentCount": 11, "listingCount": 2, "activeListings": 2}
        ]
    }))
}

async fn spawn_stub() -> String {
    let app = Router::new()
        .route("/api/groups/my", get(my_groups))
        .route("/api/groups/{id}", get(group_detail))
        .route("/api/groups/{id}/join", post(join_group))
        .route("/api/listings/my-reservations", get(my_reservations))
        .route("/api/listings/{id}/cancel-reservation", post(cancel_reservation))
        .route("/api/listings/{id}/mark-sold", post(mark_sold))
        .route("/api/departments", get(departments))
        .route("/api/messages/{id}", delete(delete_message))
        .route("/api/college-admin/groups", post(create_group))
        .route("/api/platform-admin/college-admins", post(create_college_admin))
        .route("/api/platform-admin/stats", get(platform_stats));
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{}", addr)
}

/// Manager with a live token, seeded through the store like a reloaded tab.
async fn logged_in_manager(base: &str) -> AuthManager {
    let store = TokenStore::in_memory();
    let user: User = serde_json::from_value(json!({"id": 1, "role": "student", "name": "Asha"})).unwrap();
    store.save(TOKEN, &user);
    let mgr = AuthManager::new(ClientConfig::new(base).unwrap(), store);
    mgr.restore().await;
    mgr
}

#[tokio::test]
async fn my_groups_unwrap_the_envelope_and_carry_the_bearer() {
    let base = spawn_stub().await;
    let mgr = logged_in_manager(&base).await;
    let groups = mgr.api().my_groups().await.unwrap();
    assert_eq!(groups.len(), 2);
    assert_eq!(groups[0].name, "CSE Sem 4");
    assert!(groups[1].is_member);
}

#[tokio::test]
async fn group_detail_includes_flattened_fields_and_members() {
    let base = spawn_stub().await;
    let mgr = logged_in_manager(&base).await;
    let detail = mgr.api().group_detail(2).await.unwrap();
    assert_eq!(detail.group.id, 2);
    assert_eq!(detail.group.kind, "public");
    assert_eq!(detail.members.len(), 2);
    assert_eq!(detail.members[0].role, "admin");

    let ack = mgr.api().join_group(2).await.unwrap();
    assert_eq!(ack.message, "Joined group successfully");
}

#[tokio::test]
async fn reservation_lifecycle_returns_the_updated_listing() {
    let base = spawn_stub().await;
    let mgr = logged_in_manager(&base).await;

    let reserved = mgr.api().my_reservations().await.unwrap();
    assert_eq!(reserved.len(), 1);
    assert_eq!(reserved[0].status, "reserved");

    let listing = mgr.api().cancel_reservation(5).await.unwrap();
    assert_eq!(listing.status, "available");

    let listing = mgr.api().mark_listing_sold(5).await.unwrap();
    assert_eq!(listing.status, "sold");
}

#[tokio::test]
async fn departments_unwrap_to_a_plain_list() {
    let base = spawn_stub().await;
    let mgr = logged_in_manager(&base).await;
    let deps = mgr.api().departments().await.unwrap();
    assert_eq!(deps, ["CSE", "ECE", "MECH"]);
}

#[tokio::test]
async fn message_delete_acknowledges() {
    let base = spawn_stub().await;
    let mgr = logged_in_manager(&base).await;
    let ack = mgr.api().delete_message(12).await.unwrap();
    assert_eq!(ack.message, "Message deleted");
}

#[tokio::test]
async fn create_group_round_trips_the_created_record() {
    let base = spawn_stub().await;
    let mgr = logged_in_manager(&base).await;
    let req = CreateGroup { name: "Chess Club".into(), description: "weekly meets".into(), avatar: String::new() };
    let group = mgr.api().create_group(&req).await.unwrap();
    assert_eq!(group.name, "Chess Club");
    assert_eq!(group.member_count, 0);
}

#[tokio::test]
async fn platform_admin_surface() {
    let base = spawn_stub().await;
    let mgr = logged_in_manager(&base).await;

    let stats = mgr.api().platform_stats().await.unwrap();
    assert_eq!(stats.total_colleges, 2);
    assert_eq!(stats.college_stats.len(), 2);
    assert_eq!(stats.college_stats[1].college_name, "SRM");

    let req = CreateCollegeAdmin {
        name: "Dean".into(),
        email: "dean@srm.example".into(),
        password: "secret123".into(),
        college_code: "SRM".into(),
    };
    let ack = mgr.api().create_college_admin(&req).await.unwrap();
    assert_eq!(ack.message, "College admin created successfully");

    // server-side rejection surfaces the verbatim message as a Validation error
    let bad = CreateCollegeAdmin { college_code: "NOPE".into(), ..req };
    let err = mgr.api().create_college_admin(&bad).await.unwrap_err();
    assert_eq!(err.message(), "College not found");
    assert_eq!(err.status_code(), Some(404));
}
