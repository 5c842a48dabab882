use crate::{
    api::{
        attendance, employee, epf, invoice,
        leave::{self, LeaveTier},
        machine, supervisor, upload, work_query,
    },
    auth::{handlers, middleware::auth_middleware},
    config::Config,
};
use actix_governor::{
    Governor, GovernorConfigBuilder, PeerIpKeyExtractor, governor::middleware::NoOpMiddleware,
};
use actix_web::{Scope, middleware::from_fn, web};
use std::sync::Arc;

/// One scope per leave tier; the handlers read the tier out of scope data.
fn leave_scope(path: &str, tier: LeaveTier) -> Scope {
    web::scope(path)
        .app_data(web::Data::new(tier))
        .service(
            web::resource("")
                .route(web::get().to(leave::leave_list))
                .route(web::post().to(leave::create_leave)),
        )
        .service(web::resource("/stats").route(web::get().to(leave::leave_stats)))
        .service(web::resource("/{id}").route(web::get().to(leave::get_leave)))
        .service(web::resource("/{id}/approve").route(web::put().to(leave::approve_leave)))
        .service(web::resource("/{id}/reject").route(web::put().to(leave::reject_leave)))
        .service(web::resource("/{id}/cancel").route(web::put().to(leave::cancel_leave)))
}

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
            .wrap(from_fn(auth_middleware))
            .wrap(protected_limiter)
            .service(
                web::scope("/employees")
                    .service(
                        web::resource("")
                            .route(web::post().to(employee::create_employee))
                            .route(web::get().to(employee::list_employees)),
                    )
                    .service(
                        web::resource("/{id}")
                            .route(web::put().to(employee::update_employee))
                            .route(web::get().to(employee::get_employee))
                            .route(web::delete().to(employee::delete_employee)),
                    )
                    .service(
                        web::resource("/{id}/photo")
                            .route(web::put().to(employee::set_employee_photo)),
                    ),
            )
            .service(leave_scope("/leaves", LeaveTier::Employee))
            .service(leave_scope("/manager-leaves", LeaveTier::Manager))
            .service(leave_scope("/admin-leaves", LeaveTier::Admin))
            .service(
                web::scope("/attendance")
                    .service(web::resource("").route(web::get().to(attendance::attendance_list)))
                    .service(
                        web::resource("/check-in").route(web::post().to(attendance::check_in)),
                    )
                    .service(
                        web::resource("/check-out").route(web::post().to(attendance::check_out)),
                    )
                    .service(
                        web::resource("/summary")
                            .route(web::get().to(attendance::attendance_summary)),
                    ),
            )
            .service(
                web::scope("/invoices")
                    .service(
                        web::resource("")
                            .route(web::post().to(invoice::create_invoice))
                            .route(web::get().to(invoice::list_invoices)),
                    )
                    .service(
                        web::resource("/{id}")
                            .route(web::get().to(invoice::get_invoice))
                            .route(web::put().to(invoice::update_invoice))
                            .route(web::delete().to(invoice::delete_invoice)),
                    )
                    .service(web::resource("/{id}/send").route(web::put().to(invoice::send_invoice)))
                    .service(web::resource("/{id}/pay").route(web::put().to(invoice::pay_invoice))),
            )
            .service(
                web::scope("/epf")
                    .service(
                        web::resource("")
                            .route(web::post().to(epf::create_epf))
                            .route(web::get().to(epf::list_epf)),
                    )
                    .service(
                        web::resource("/{id}")
                            .route(web::get().to(epf::get_epf))
                            .route(web::put().to(epf::update_epf))
                            .route(web::delete().to(epf::delete_epf)),
                    ),
            )
            .service(
                web::scope("/machines")
                    .service(
                        web::resource("")
                            .route(web::post().to(machine::create_machine))
                            .route(web::get().to(machine::list_machines)),
                    )
                    .service(
                        web::resource("/{id}")
                            .route(web::get().to(machine::get_machine))
                            .route(web::put().to(machine::update_machine))
                            .route(web::delete().to(machine::delete_machine)),
                    )
                    .service(
                        web::resource("/{id}/assign").route(web::put().to(machine::assign_machine)),
                    )
                    .service(
                        web::resource("/{id}/status")
                            .route(web::put().to(machine::set_machine_status)),
                    ),
            )
            .service(
                web::scope("/work-queries")
                    .service(
                        web::resource("")
                            .route(web::post().to(work_query::create_work_query))
                            .route(web::get().to(work_query::list_work_queries)),
                    )
                    .service(
                        web::resource("/{id}")
                            .route(web::get().to(work_query::get_work_query))
                            .route(web::delete().to(work_query::delete_work_query)),
                    )
                    .service(
                        web::resource("/{id}/status")
                            .route(web::put().to(work_query::set_work_query_status)),
                    ),
            )
            .service(
                web::scope("/supervisors")
                    .service(
                        web::resource("")
                            .route(web::post().to(supervisor::create_supervisor))
                            .route(web::get().to(supervisor::list_supervisors)),
                    )
                    .service(
                        web::resource("/{id}")
                            .route(web::get().to(supervisor::get_supervisor))
                            .route(web::put().to(supervisor::update_supervisor))
                            .route(web::delete().to(supervisor::delete_supervisor)),
                    ),
            )
            .service(web::scope("/uploads").service(
                web::resource("").route(web::post().to(upload::upload_file)),
            )),
    );
}
