use std::sync::Arc;

use actix_web::http::StatusCode;
use actix_web::{HttpResponse, Responder, web};
use tracing::{debug, trace};

use super::error_code::ErrorCode;
use super::types::ErrorResponse;
use crate::services::{LookupChain, LookupError};

pub struct GeoIpService;

impl GeoIpService {
    /// GET /geoip/{ip}
    pub async fn lookup(
        path: web::Path<String>,
        chain: web::Data<Arc<LookupChain>>,
    ) -> impl Responder {
        let raw_ip = path.into_inner();
        trace!("Received geoip lookup for {:?}", raw_ip);

        match chain.lookup(&raw_ip).await {
            Ok(record) => HttpResponse::Ok().json(record),
            Err(err) => Self::error_response(err),
        }
    }

    fn error_response(err: LookupError) -> HttpResponse {
        let (status, code) = match &err {
            LookupError::InvalidKey(_) => (StatusCode::BAD_REQUEST, ErrorCode::InvalidKey),
            LookupError::LookupFailed(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, ErrorCode::LookupFailed)
            }
        };
        debug!("Lookup rejected with {}: {}", status.as_u16(), err);

        HttpResponse::build(status).json(ErrorResponse::new(code, err.message()))
    }
}

/// GeoIP 路由配置
pub fn geoip_routes() -> actix_web::Scope {
    web::scope("/geoip").route("/{ip}", web::get().to(GeoIpService::lookup))
}
