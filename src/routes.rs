use crate::{
    api::{
        allowance, appraisal, ctc, department, employee, fixed_allowance, helpdesk, holiday,
        leave, ltc, message, notification, salary, travel_expenditure, user,
    },
    auth::middleware::auth_middleware,
};
use actix_governor::{
    Governor, GovernorConfigBuilder, PeerIpKeyExtractor, governor::middleware::NoOpMiddleware,
};
use actix_web::{middleware::from_fn, web};
use anyhow::{Result, anyhow};
use std::sync::Arc;

pub type Limiter = Arc<Governor<PeerIpKeyExtractor, NoOpMiddleware>>;

/// Per-IP limiter allowing `requests_per_min` with an equal burst.
pub fn build_limiter(requests_per_min: u32) -> Result<Limiter> {
    let requests_per_min = requests_per_min.max(1);
    let per_ms = (60_000 / u64::from(requests_per_min)).max(1);
    let cfg = GovernorConfigBuilder::default()
        .per_millisecond(per_ms)
        .burst_size(requests_per_min)
        .key_extractor(PeerIpKeyExtractor)
        .finish()
        .ok_or_else(|| anyhow!("Invalid rate limit of {requests_per_min} requests per minute"))?;
    Ok(Arc::new(Governor::new(&cfg)))
}

pub fn configure(cfg: &mut web::ServiceConfig, api_prefix: &str, limiter: Limiter) {
    cfg.service(
        web::scope(api_prefix)
            // authentication
            .wrap(from_fn(auth_middleware))
            // rate limiting
            .wrap(limiter)
            .service(
                web::scope("/users")
                    .service(
                        web::resource("")
                            .route(web::get().to(user::list_users))
                            .route(web::post().to(user::create_user)),
                    )
                    .service(
                        web::resource("/{id}")
                            .route(web::get().to(user::get_user))
                            .route(web::put().to(user::update_user))
                            .route(web::delete().to(user::delete_user)),
                    ),
            )
            .service(
                web::scope("/departments")
                    .service(
                        web::resource("")
                            .route(web::get().to(department::list_departments))
                            .route(web::post().to(department::create_department)),
                    )
                    .service(
                        web::resource("/{id}")
                            .route(web::get().to(department::get_department))
                            .route(web::put().to(department::update_department))
                            .route(web::delete().to(department::delete_department)),
                    ),
            )
            .service(
                web::scope("/employees")
                    .service(
                        web::resource("")
                            .route(web::get().to(employee::list_employees))
                            .route(web::post().to(employee::create_employee)),
                    )
                    .service(
                        web::resource("/{id}")
                            .route(web::get().to(employee::get_employee))
                            .route(web::put().to(employee::update_employee))
                            .route(web::delete().to(employee::delete_employee)),
                    ),
            )
            .service(
                web::scope("/leaves")
                    .service(
                        web::resource("")
                            .route(web::get().to(leave::list_leaves))
                            .route(web::post().to(leave::create_leave)),
                    )
                    // before /{id}
                    .service(
                        web::resource("/compute-days").route(web::post().to(leave::compute_days)),
                    )
                    .service(
                        web::resource("/{id}")
                            .route(web::get().to(leave::get_leave))
                            .route(web::put().to(leave::update_leave))
                            .route(web::delete().to(leave::delete_leave)),
                    )
                    .service(
                        web::resource("/{id}/approve").route(web::post().to(leave::approve_leave)),
                    )
                    .service(
                        web::resource("/{id}/reject").route(web::post().to(leave::reject_leave)),
                    ),
            )
            .service(
                web::scope("/salaries")
                    .service(
                        web::resource("")
                            .route(web::get().to(salary::list_salaries))
                            .route(web::post().to(salary::create_salary)),
                    )
                    .service(
                        web::resource("/{id}")
                            .route(web::get().to(salary::get_salary))
                            .route(web::put().to(salary::update_salary))
                            .route(web::delete().to(salary::delete_salary)),
                    ),
            )
            .service(
                web::scope("/allowances")
                    .service(
                        web::resource("")
                            .route(web::get().to(allowance::list_allowances))
                            .route(web::post().to(allowance::create_allowance)),
                    )
                    .service(
                        web::resource("/{id}")
                            .route(web::get().to(allowance::get_allowance))
                            .route(web::put().to(allowance::update_allowance))
                            .route(web::delete().to(allowance::delete_allowance)),
                    )
                    .service(
                        web::resource("/{id}/approve")
                            .route(web::post().to(allowance::approve_allowance)),
                    )
                    .service(
                        web::resource("/{id}/reject")
                            .route(web::post().to(allowance::reject_allowance)),
                    ),
            )
            .service(
                web::scope("/fixed-allowances")
                    .service(
                        web::resource("")
                            .route(web::get().to(fixed_allowance::list_fixed_allowances))
                            .route(web::post().to(fixed_allowance::create_fixed_allowance)),
                    )
                    .service(
                        web::resource("/{id}")
                            .route(web::get().to(fixed_allowance::get_fixed_allowance))
                            .route(web::put().to(fixed_allowance::update_fixed_allowance))
                            .route(web::delete().to(fixed_allowance::delete_fixed_allowance)),
                    )
                    .service(
                        web::resource("/{id}/approve")
                            .route(web::post().to(fixed_allowance::approve_fixed_allowance)),
                    )
                    .service(
                        web::resource("/{id}/reject")
                            .route(web::post().to(fixed_allowance::reject_fixed_allowance)),
                    ),
            )
            .service(
                web::scope("/appraisals")
                    .service(
                        web::resource("")
                            .route(web::get().to(appraisal::list_appraisals))
                            .route(web::post().to(appraisal::create_appraisal)),
                    )
                    .service(
                        web::resource("/{id}")
                            .route(web::get().to(appraisal::get_appraisal))
                            .route(web::put().to(appraisal::update_appraisal))
                            .route(web::delete().to(appraisal::delete_appraisal)),
                    )
                    .service(
                        web::resource("/{id}/submit")
                            .route(web::post().to(appraisal::submit_appraisal)),
                    )
                    .service(
                        web::resource("/{id}/review")
                            .route(web::post().to(appraisal::review_appraisal)),
                    ),
            )
            .service(
                web::scope("/helpdesk")
                    .service(
                        web::resource("")
                            .route(web::get().to(helpdesk::list_tickets))
                            .route(web::post().to(helpdesk::create_ticket)),
                    )
                    .service(
                        web::resource("/{id}")
                            .route(web::get().to(helpdesk::get_ticket))
                            .route(web::delete().to(helpdesk::delete_ticket)),
                    )
                    .service(
                        web::resource("/{id}/reply").route(web::post().to(helpdesk::reply_ticket)),
                    )
                    .service(
                        web::resource("/{id}/resolve")
                            .route(web::post().to(helpdesk::resolve_ticket)),
                    ),
            )
            .service(
                web::scope("/messages")
                    .service(web::resource("").route(web::post().to(message::send_message)))
                    // before /{id}
                    .service(web::resource("/inbox").route(web::get().to(message::inbox)))
                    .service(web::resource("/sent").route(web::get().to(message::sent)))
                    .service(
                        web::resource("/{id}")
                            .route(web::get().to(message::get_message))
                            .route(web::delete().to(message::delete_message)),
                    )
                    .service(
                        web::resource("/{id}/reply").route(web::post().to(message::reply_message)),
                    )
                    .service(web::resource("/{id}/read").route(web::post().to(message::mark_read))),
            )
            .service(
                web::scope("/notifications")
                    .service(
                        web::resource("").route(web::get().to(notification::list_notifications)),
                    )
                    // before /{id}
                    .service(
                        web::resource("/read-all")
                            .route(web::post().to(notification::mark_all_read)),
                    )
                    .service(
                        web::resource("/{id}")
                            .route(web::delete().to(notification::delete_notification)),
                    )
                    .service(
                        web::resource("/{id}/read").route(web::post().to(notification::mark_read)),
                    ),
            )
            .service(
                web::scope("/holidays")
                    .service(
                        web::resource("")
                            .route(web::get().to(holiday::list_holidays))
                            .route(web::post().to(holiday::create_holiday)),
                    )
                    .service(
                        web::resource("/{id}")
                            .route(web::get().to(holiday::get_holiday))
                            .route(web::put().to(holiday::update_holiday))
                            .route(web::delete().to(holiday::delete_holiday)),
                    ),
            )
            .service(
                web::scope("/ltc")
                    .service(
                        web::resource("")
                            .route(web::get().to(ltc::list_ltc))
                            .route(web::post().to(ltc::create_ltc)),
                    )
                    .service(
                        web::resource("/{id}")
                            .route(web::get().to(ltc::get_ltc))
                            .route(web::put().to(ltc::update_ltc))
                            .route(web::delete().to(ltc::delete_ltc)),
                    )
                    .service(web::resource("/{id}/approve").route(web::post().to(ltc::approve_ltc)))
                    .service(web::resource("/{id}/reject").route(web::post().to(ltc::reject_ltc))),
            )
            .service(
                web::scope("/travel-expenditures")
                    .service(
                        web::resource("")
                            .route(web::get().to(travel_expenditure::list_travel_expenditures))
                            .route(web::post().to(travel_expenditure::create_travel_expenditure)),
                    )
                    .service(
                        web::resource("/{id}")
                            .route(web::get().to(travel_expenditure::get_travel_expenditure))
                            .route(web::put().to(travel_expenditure::update_travel_expenditure))
                            .route(
                                web::delete().to(travel_expenditure::delete_travel_expenditure),
                            ),
                    )
                    .service(
                        web::resource("/{id}/approve")
                            .route(web::post().to(travel_expenditure::approve_travel_expenditure)),
                    )
                    .service(
                        web::resource("/{id}/reject")
                            .route(web::post().to(travel_expenditure::reject_travel_expenditure)),
                    ),
            )
            .service(web::resource("/ctc").route(web::get().to(ctc::ctc_report))),
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn limiter_accepts_extreme_rates() {
        assert!(build_limiter(0).is_ok());
        assert!(build_limiter(1).is_ok());
        assert!(build_limiter(120_000).is_ok());
    }
}
