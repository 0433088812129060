//! Integration tests for the resource services and the FleetDesk wiring

mod support;

use fleetdesk_domain::{TirePosition, TireStatus};
use fleetdesk_infra::ListQuery;
use serde_json::json;
use support::{fleet, session};
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, Request, ResponseTemplate};

#[tokio::test]
async fn login_then_authenticated_request() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/auth/login"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "accessToken": "access-1",
            "refreshToken": "refresh-1",
            "user": {"id": 5, "email": "jane@example.com", "name": "Jane"}
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/companies/2"))
        .and(header("Authorization", "Bearer access-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": 2, "name": "Acme"})))
        .expect(1)
        .mount(&server)
        .await;

    let (fleet, _) = fleet(&server, None);
    fleet.login("jane@example.com", "hunter2").await.expect("login");
    let company = fleet.companies.get(2).await.expect("company");

    assert_eq!(company.name, "Acme");
    assert!(company.active);

    fleet.logout().await.expect("logout");
    assert!(fleet.session().await.is_none());
}

#[tokio::test]
async fn raw_array_and_envelope_lists_normalize() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/companies"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"id": 1, "name": "Acme"},
            {"id": 2, "name": "Globex"}
        ])))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/employees"))
        .and(query_param("page", "2"))
        .and(query_param("limit", "1"))
        .and(query_param("search", "ja ne"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [{"id": 5, "name": "Jane"}],
            "total": 3,
            "page": 2,
            "limit": 1
        })))
        .mount(&server)
        .await;

    let (fleet, _) = fleet(&server, Some(session("valid", Some("refresh-1"))));

    let companies = fleet.companies.list(&ListQuery::new()).await.expect("companies");
    assert_eq!(companies.items.len(), 2);
    assert_eq!(companies.total, 2);
    assert_eq!(companies.page, 1);
    assert!(!companies.has_next());

    let employees = fleet
        .employees
        .list(&ListQuery::new().page(2).limit(1).search("ja ne"))
        .await
        .expect("employees");
    assert_eq!(employees.items[0].name, "Jane");
    assert_eq!(employees.total, 3);
    assert_eq!(employees.total_pages(), 3);
    assert!(employees.has_next());
}

#[tokio::test]
async fn nested_collections() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/companies/4/employees"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!([{"id": 5, "name": "Jane", "companyId": 4}])),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/equipment/8/tires"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [{"id": 11, "serialNumber": "MX-1001", "status": "mounted", "equipmentId": 8}],
            "meta": {"total": 1, "page": 1, "limit": 25}
        })))
        .mount(&server)
        .await;

    let (fleet, _) = fleet(&server, Some(session("valid", Some("refresh-1"))));

    let staff = fleet.employees.list_by_company(4, &ListQuery::new()).await.expect("staff");
    assert_eq!(staff.items[0].company_id, Some(4));

    let tires = fleet.tires.list_by_equipment(8, &ListQuery::new()).await.expect("tires");
    assert_eq!(tires.items[0].status, TireStatus::Mounted);
    assert_eq!(tires.limit, 25);
}

#[tokio::test]
async fn mount_patches_tire_position() {
    let server = MockServer::start().await;
    Mock::given(method("PATCH"))
        .and(path("/tires/11/position"))
        .and(body_json(json!({"equipmentId": 8, "position": {"axle": 2, "slot": "L1"}})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": 11,
            "serialNumber": "MX-1001",
            "status": "mounted",
            "equipmentId": 8,
            "position": {"axle": 2, "slot": "L1"}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let (fleet, _) = fleet(&server, Some(session("valid", Some("refresh-1"))));
    let tire = fleet
        .tires
        .mount(11, 8, TirePosition { axle: 2, slot: "L1".to_string() })
        .await
        .expect("mounted");

    assert_eq!(tire.equipment_id, Some(8));
    assert_eq!(tire.position.map(|p| p.slot).as_deref(), Some("L1"));
}

#[tokio::test]
async fn update_uses_patch() {
    let server = MockServer::start().await;
    Mock::given(method("PATCH"))
        .and(path("/equipment/3"))
        .and(body_json(json!({"plate": "ABC-1234"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": 3, "code": "TRK-003", "plate": "ABC-1234", "axleCount": 2
        })))
        .expect(1)
        .mount(&server)
        .await;

    let (fleet, _) = fleet(&server, Some(session("valid", Some("refresh-1"))));
    let equipment =
        fleet.equipment.update(3, &json!({"plate": "ABC-1234"})).await.expect("updated");

    assert_eq!(equipment.plate.as_deref(), Some("ABC-1234"));
}

#[tokio::test]
async fn document_upload_is_multipart() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/documents"))
        .respond_with(|request: &Request| {
            let content_type = request
                .headers
                .get("content-type")
                .and_then(|v| v.to_str().ok())
                .unwrap_or_default();
            let body = String::from_utf8_lossy(&request.body);

            if content_type.starts_with("multipart/form-data")
                && body.contains("filename=\"inspection.pdf\"")
                && body.contains("quarterly inspection")
            {
                ResponseTemplate::new(201).set_body_json(json!({
                    "id": 21, "fileName": "inspection.pdf", "contentType": "application/pdf", "size": 8
                }))
            } else {
                ResponseTemplate::new(400)
            }
        })
        .expect(1)
        .mount(&server)
        .await;

    let (fleet, _) = fleet(&server, Some(session("valid", Some("refresh-1"))));
    let document = fleet
        .documents
        .upload(
            "inspection.pdf",
            b"%PDF-1.7".to_vec(),
            Some("application/pdf"),
            Some("quarterly inspection"),
        )
        .await
        .expect("uploaded");

    assert_eq!(document.id, 21);
    assert_eq!(document.size, 8);
}

#[tokio::test]
async fn upload_is_replayed_after_refresh() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/documents"))
        .and(header("Authorization", "Bearer expired"))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/documents"))
        .and(header("Authorization", "Bearer fresh"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "id": 22, "fileName": "photo.jpg", "size": 3
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/auth/refresh"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"accessToken": "fresh"})))
        .expect(1)
        .mount(&server)
        .await;

    let (fleet, _) = fleet(&server, Some(session("expired", Some("refresh-1"))));
    let document = fleet
        .documents
        .upload("photo.jpg", vec![1, 2, 3], Some("image/jpeg"), None)
        .await
        .expect("uploaded after refresh");

    assert_eq!(document.file_name, "photo.jpg");
}

#[tokio::test]
async fn document_download_keeps_bytes_and_name() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/documents/21/download"))
        .and(header("Authorization", "Bearer valid"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("Content-Disposition", "attachment; filename=\"inspection.pdf\"")
                .set_body_raw(b"%PDF-1.7".to_vec(), "application/pdf"),
        )
        .mount(&server)
        .await;

    let (fleet, _) = fleet(&server, Some(session("valid", Some("refresh-1"))));
    let blob = fleet.documents.download(21).await.expect("blob");

    assert_eq!(blob.bytes, b"%PDF-1.7");
    assert_eq!(blob.content_type.as_deref(), Some("application/pdf"));
    assert_eq!(blob.file_name.as_deref(), Some("inspection.pdf"));
}

#[tokio::test]
async fn download_is_retried_after_refresh() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/documents/21/download"))
        .and(header("Authorization", "Bearer expired"))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/documents/21/download"))
        .and(header("Authorization", "Bearer fresh"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(b"abc".to_vec(), "text/plain"))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/auth/refresh"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"accessToken": "fresh"})))
        .expect(1)
        .mount(&server)
        .await;

    let (fleet, _) = fleet(&server, Some(session("expired", Some("refresh-1"))));
    let blob = fleet.documents.download(21).await.expect("blob after refresh");

    assert_eq!(blob.bytes, b"abc");
    assert_eq!(fleet.client.coordinator().refresh_count(), 1);
}
