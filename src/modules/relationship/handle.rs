use actix_web::{post, web};

use crate::{
    api::{error, success},
    modules::relationship::{
        model::{
            CreateRelationshipBody, RelationshipRequestBody, RemoveRelationshipBody,
            RequestDecisionBody, RequestResponse,
        },
        service::RelationshipService,
    },
    utils::ValidatedJson,
};

#[post("/request")]
pub async fn request_relationship(
    relationship_service: web::Data<RelationshipService>,
    body: ValidatedJson<RelationshipRequestBody>,
) -> Result<success::Success<RequestResponse>, error::Error> {
    let body = body.0;
    let request = relationship_service
        .propose_relationship(body.user_id, body.to_id, body.rel_type, false)
        .await?;

    Ok(success::Success::created(Some(request.into())).message("Request sent"))
}

#[post("/update")]
pub async fn update_relationship(
    relationship_service: web::Data<RelationshipService>,
    body: ValidatedJson<RelationshipRequestBody>,
) -> Result<success::Success<RequestResponse>, error::Error> {
    let body = body.0;
    let request = relationship_service
        .propose_relationship(body.user_id, body.to_id, body.rel_type, true)
        .await?;

    Ok(success::Success::created(Some(request.into())).message("Update request sent"))
}

#[post("/accept")]
pub async fn accept_request(
    relationship_service: web::Data<RelationshipService>,
    body: ValidatedJson<RequestDecisionBody>,
) -> Result<success::Success<()>, error::Error> {
    relationship_service.accept_request(body.0.user_id, body.0.request_id).await?;
    Ok(success::Success::ok(None).message("Request accepted"))
}

#[post("/reject")]
pub async fn reject_request(
    relationship_service: web::Data<RelationshipService>,
    body: ValidatedJson<RequestDecisionBody>,
) -> Result<success::Success<()>, error::Error> {
    relationship_service.reject_request(body.0.user_id, body.0.request_id).await?;
    Ok(success::Success::ok(None).message("Request rejected"))
}

#[post("/remove")]
pub async fn remove_relationship(
    relationship_service: web::Data<RelationshipService>,
    body: ValidatedJson<RemoveRelationshipBody>,
) -> Result<success::Success<()>, error::Error> {
    relationship_service.remove_relationship(body.0.user_id, body.0.to_id).await?;
    Ok(success::Success::ok(None).message("Relationship removed"))
}

#[post("/create")]
pub async fn create_relationship(
    relationship_service: web::Data<RelationshipService>,
    body: ValidatedJson<CreateRelationshipBody>,
) -> Result<success::Success<()>, error::Error> {
    let body = body.0;
    relationship_service.create_relationship(body.from_id, body.to_id, body.rel_type).await?;
    Ok(success::Success::created(None).message("Relationship created"))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use actix_web::{dev::ServiceResponse, http::StatusCode, test, App};
    use serde_json::{json, Value};
    use uuid::Uuid;

    use crate::{
        modules::{events::GraphEvents, relationship::route},
        test::MemoryStore,
    };

    use super::*;

    fn service(store: Arc<MemoryStore>) -> RelationshipService {
        RelationshipService::with_dependencies(store.clone(), store, GraphEvents::new())
    }

    fn post(path: &str, body: Value) -> test::TestRequest {
        test::TestRequest::post().uri(path).set_json(body)
    }

    async fn read(res: ServiceResponse) -> (StatusCode, Value) {
        let status = res.status();
        (status, test::read_body_json(res).await)
    }

    #[actix_web::test]
    async fn test_request_then_accept() {
        let store = Arc::new(MemoryStore::new());
        let (u1, u2) = (store.add_user("u1"), store.add_user("u2"));
        let app = test::init_service(
            App::new().app_data(web::Data::new(service(store.clone()))).configure(route::configure),
        )
        .await;

        let res = test::call_service(
            &app,
            post("/relationships/request", json!({"userId": u1, "toId": u2, "type": "BEST_FRIEND"})).to_request(),
        )
        .await;
        let (status, body) = read(res).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["data"]["status"], "PENDING");
        assert_eq!(body["data"]["type"], "BEST_FRIEND");
        let request_id = body["data"]["id"].as_str().unwrap().to_string();

        // the pair already has a pending request, whichever way it points
        let res = test::call_service(
            &app,
            post("/relationships/request", json!({"userId": u2, "toId": u1, "type": "CRUSH"})).to_request(),
        )
        .await;
        let (status, body) = read(res).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["kind"], "CONFLICT");

        let decision = json!({"userId": u2, "requestId": request_id});
        let res = test::call_service(&app, post("/relationships/accept", decision.clone()).to_request()).await;
        let (status, body) = read(res).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "Request accepted");
        assert_eq!(store.active_edges().len(), 1);

        let res = test::call_service(&app, post("/relationships/accept", decision).to_request()).await;
        let (status, body) = read(res).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["kind"], "NOT_FOUND");
    }

    #[actix_web::test]
    async fn test_invalid_input_is_bad_request() {
        let store = Arc::new(MemoryStore::new());
        let u1 = store.add_user("u1");
        let app = test::init_service(
            App::new().app_data(web::Data::new(service(store))).configure(route::configure),
        )
        .await;

        let res = test::call_service(
            &app,
            post("/relationships/request", json!({"userId": u1, "toId": u1, "type": "DATING"})).to_request(),
        )
        .await;
        let (status, body) = read(res).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["kind"], "INVALID_PARAMETERS");

        let res = test::call_service(
            &app,
            post("/relationships/request", json!({"userId": u1, "toId": Uuid::now_v7(), "type": "FRIENDZONE"})).to_request(),
        )
        .await;
        let (status, body) = read(res).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["kind"], "INVALID_PARAMETERS");

        let res = test::call_service(
            &app,
            post("/relationships/update", json!({"userId": u1, "toId": Uuid::now_v7(), "type": "DATING"})).to_request(),
        )
        .await;
        let (status, body) = read(res).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["kind"], "NOT_FOUND");
    }

    #[actix_web::test]
    async fn test_reject_create_and_remove() {
        let store = Arc::new(MemoryStore::new());
        let (u1, u2) = (store.add_user("u1"), store.add_user("u2"));
        let app = test::init_service(
            App::new().app_data(web::Data::new(service(store.clone()))).configure(route::configure),
        )
        .await;

        let res = test::call_service(
            &app,
            post("/relationships/request", json!({"userId": u1, "toId": u2, "type": "BEEFING"})).to_request(),
        )
        .await;
        let (_, body) = read(res).await;
        let request_id = body["data"]["id"].as_str().unwrap().to_string();

        // only the recipient can decide
        let res = test::call_service(
            &app,
            post("/relationships/reject", json!({"userId": u1, "requestId": request_id})).to_request(),
        )
        .await;
        assert_eq!(res.status(), StatusCode::NOT_FOUND);
        let res = test::call_service(
            &app,
            post("/relationships/reject", json!({"userId": u2, "requestId": request_id})).to_request(),
        )
        .await;
        assert_eq!(res.status(), StatusCode::OK);

        let res = test::call_service(
            &app,
            post("/relationships/create", json!({"fromId": u1, "toId": u2, "type": "SISTER"})).to_request(),
        )
        .await;
        assert_eq!(res.status(), StatusCode::CREATED);
        assert_eq!(store.active_edges().len(), 1);

        let res =
            test::call_service(&app, post("/relationships/remove", json!({"userId": u2, "toId": u1})).to_request()).await;
        assert_eq!(res.status(), StatusCode::OK);
        assert!(store.active_edges().is_empty());

        let res =
            test::call_service(&app, post("/relationships/remove", json!({"userId": u2, "toId": u1})).to_request()).await;
        let (status, body) = read(res).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["kind"], "NOT_FOUND");
    }
}
