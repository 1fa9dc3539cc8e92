use actix_web::{post, web};

use crate::{
    api::{error, success},
    modules::user::{
        model::{SignatureResponse, UpdateSignatureModel},
        service::UserService,
    },
    utils::ValidatedJson,
};

#[post("/signature")]
pub async fn update_signature(
    user_service: web::Data<UserService>,
    body: ValidatedJson<UpdateSignatureModel>,
) -> Result<success::Success<SignatureResponse>, error::Error> {
    let signature = user_service.update_signature(body.0.user_id, &body.0.signature).await?;
    Ok(success::Success::ok(Some(SignatureResponse { signature }))
        .message("Signature updated successfully"))
}
