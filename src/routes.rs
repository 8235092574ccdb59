use crate::{
    api::{attendance, dashboard, leave, student},
    auth::{handlers, middleware::auth_middleware},
    config::Config,
};
use actix_governor::{
    Governor, GovernorConfigBuilder, PeerIpKeyExtractor, governor::middleware::NoOpMiddleware,
};
use actix_web::{middleware::from_fn, web};
use std::sync::Arc;

pub fn configure(cfg: &mut web::ServiceConfig, config: Config) {
    // Helper to build per-route limiter
    fn build_limiter(requests_per_min: u32) -> Governor<PeerIpKeyExtractor, NoOpMiddleware> {
        let per_ms = if requests_per_min == 0 {
            1
        } else {
            60_000 / requests_per_min as u64
        };
        let cfg = GovernorConfigBuilder::default()
            .per_millisecond(per_ms)
            .burst_size(requests_per_min)
            .key_extractor(PeerIpKeyExtractor)
            .finish()
            .unwrap();
        Governor::new(&cfg)
    }

    let login_limiter = Arc::new(build_limiter(config.rate_login_per_min));
    let register_limiter = Arc::new(build_limiter(config.rate_register_per_min));
    let refresh_limiter = Arc::new(build_limiter(config.rate_refresh_per_min));
    let protected_limiter = Arc::new(build_limiter(config.rate_protected_per_min));

    // Public routes
    cfg.service(
        web::scope("/auth")
            .service(
                web::resource("/login")
                    .wrap(login_limiter.clone())
                    .route(web::post().to(handlers::login)),
            )
            .service(
                web::resource("/register")
                    .wrap(register_limiter.clone())
                    .route(web::post().to(handlers::register)),
            )
            .service(
                web::resource("/refresh")
                    .wrap(refresh_limiter.clone())
                    .route(web::post().to(handlers::refresh_token)),
            )
            .service(
                web::resource("/logout")
                    .wrap(login_limiter.clone())
                    .route(web::post().to(handlers::logout)),
            ),
    );

    // Protected routes
    cfg.service(
        web::scope(&config.api_prefix)
            .wrap(from_fn(auth_middleware)) // authentication
            .wrap(protected_limiter) // rate limiting
            .service(handlers::me)
            .service(
                web::scope("/attendance")
                    // /attendance/draft (before the {record_id} matcher)
                    .service(
                        web::resource("/draft")
                            .route(web::get().to(attendance::get_draft))
                            .route(web::put().to(attendance::save_draft)),
                    )
                    // /attendance/classes
                    .service(
                        web::resource("/classes").route(web::get().to(attendance::my_classes)),
                    )
                    // /attendance/class/{class_id}
                    .service(
                        web::resource("/class/{class_id}")
                            .route(web::get().to(attendance::attendance_by_class)),
                    )
                    // /attendance
                    .service(
                        web::resource("").route(web::post().to(attendance::mark_attendance)),
                    )
                    // /attendance/{record_id}
                    .service(
                        web::resource("/{record_id}")
                            .route(web::put().to(attendance::update_attendance)),
                    ),
            )
            .service(
                web::scope("/leave")
                    // /leave
                    .service(
                        web::resource("")
                            .route(web::get().to(leave::my_leaves))
                            .route(web::post().to(leave::apply_leave)),
                    )
                    // /leave/balance
                    .service(web::resource("/balance").route(web::get().to(leave::get_balance)))
                    // /leave/{id}/cancel
                    .service(
                        web::resource("/{id}/cancel").route(web::put().to(leave::cancel_leave)),
                    )
                    // /leave/{id}/decide
                    .service(
                        web::resource("/{id}/decide").route(web::put().to(leave::decide_leave)),
                    ),
            )
            .service(
                web::scope("/dashboard")
                    .service(web::resource("/summary").route(web::get().to(dashboard::summary))),
            )
            .service(
                web::scope("/students")
                    // /students
                    .service(
                        web::resource("")
                            .route(web::post().to(student::create_student))
                            .route(web::get().to(student::list_students)),
                    )
                    // /students/{id}
                    .service(
                        web::resource("/{id}")
                            .route(web::get().to(student::get_student))
                            .route(web::put().to(student::update_student)),
                    ),
            ),
    );
}
