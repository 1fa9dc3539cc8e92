use crate::modules::relationship::handle::*;
use actix_web::web::{scope, ServiceConfig};

pub fn configure(cfg: &mut ServiceConfig) {
    cfg.service(
        scope("/relationships")
            .service(request_relationship)
            .service(update_relationship)
            .service(accept_request)
            .service(reject_request)
            .service(remove_relationship)
            .service(create_relationship),
    );
}
