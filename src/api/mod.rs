mod types;

pub use types::{MessageResponse, SendOtpRequest, VerifyOtpRequest};

use actix_web::{error::InternalError, web, HttpResponse};
use log::{debug, error, info, warn};

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::JsonConfig::default().error_handler(|err, _req| {
        let response = HttpResponse::BadRequest()
            .json(MessageResponse::validation(vec![format!("body - {}", err)]));
        InternalError::from_response(err, response).into()
    }))
    .route("/send-otp", web::post().to(send_otp))
    .route("/verify-otp", web::post().to(verify_otp))
    .route("/health", web::get().to(health));
}

async fn health() -> HttpResponse {
    HttpResponse::Ok().json(MessageResponse::new("ok"))
}

// 请求验证码
pub async fn send_otp(
    body: web::Json<SendOtpRequest>,
    data: web::Data<crate::AppState>,
) -> HttpResponse {
    debug!("处理发送验证码请求");
    let errors = body.check(&data.config.allowed_email_domain);
    if !errors.is_empty() {
        warn!("发送验证码参数无效: {:?}", errors);
        return HttpResponse::BadRequest().json(MessageResponse::validation(errors));
    }

    match data.otp_manager.request_code(&body.email).await {
        Ok(()) => HttpResponse::Ok().json(MessageResponse::new("OTP sent successfully")),
        Err(e) => {
            error!("发送验证码失败 - 邮箱: {}, 错误: {}", body.email, e);
            HttpResponse::InternalServerError().json(MessageResponse::new(e.to_string()))
        }
    }
}

// 校验验证码，授予角色并绑定地址
pub async fn verify_otp(
    body: web::Json<VerifyOtpRequest>,
    data: web::Data<crate::AppState>,
) -> HttpResponse {
    debug!("处理校验验证码请求");
    let errors = body.check(&data.config.allowed_email_domain);
    if !errors.is_empty() {
        warn!("校验验证码参数无效: {:?}", errors);
        return HttpResponse::BadRequest().json(MessageResponse::validation(errors));
    }

    let address = body.address.trim();

    if !data.otp_manager.verify_code(&body.email, body.otp).await {
        return HttpResponse::BadRequest().json(MessageResponse::new("Invalid or expired OTP"));
    }

    if let Err(e) = data.role_granter.grant_role(address).await {
        error!("角色授予失败 - 邮箱: {}, 地址: {}, 错误: {}", body.email, address, e);
        return HttpResponse::InternalServerError()
            .json(MessageResponse::new("Failed to mint hat"));
    }

    match data.otp_manager.bind_account(&body.email, address).await {
        Ok(()) => {
            info!("注册完成 - 邮箱: {}, 地址: {}", body.email, address);
            HttpResponse::Ok().json(MessageResponse::new("OTP verified successfully"))
        }
        Err(e) => {
            // 角色已授予但绑定未写入，需要人工对账
            error!(
                target: "reconciliation",
                "角色已授予但账户未绑定 - 邮箱: {}, 地址: {}, 错误: {}",
                body.email,
                address,
                e
            );
            HttpResponse::InternalServerError().json(MessageResponse::new("Could not store account"))
        }
    }
}
