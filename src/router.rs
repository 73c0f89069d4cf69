use axum::{
    Router,
    routing::{get, post, put},
};

use crate::repository::{TimerRecords, Transactions};
use crate::{AppState, auth, dashboard, file_api, timer_records, transactions};

/// Every route of the service. Session and CORS layers are added by the caller.
pub fn api_router() -> Router<AppState> {
    Router::new()
        .route("/", get(auth::root))
        .route("/login", get(auth::login_page))
        .route("/register", get(auth::register_page))
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
        .route("/auth/me", get(auth::me))
        .route("/auth/logout", post(auth::logout))
        .route("/workspace", get(dashboard::get_workspace))
        .route("/workspace/tab", put(dashboard::set_tab))
        .route("/timer/start", post(dashboard::start_timer))
        .route("/timer/pause", post(dashboard::pause_timer))
        .route("/timer/finish", post(dashboard::finish_timer))
        .route("/dialog", post(dashboard::open_dialog))
        .route("/dialog/input", put(dashboard::update_dialog_input))
        .route("/dialog/confirm", post(dashboard::confirm_dialog))
        .route("/dialog/cancel", post(dashboard::cancel_dialog))
        .route("/summary", get(dashboard::get_summary))
        .route("/backup", get(dashboard::get_backup))
        .route(
            "/timer-records",
            get(timer_records::get_timer_records).post(timer_records::create_timer_record),
        )
        .route(
            "/timer-records/{id}",
            put(timer_records::update_timer_record).delete(timer_records::delete_timer_record),
        )
        .route(
            "/transactions",
            get(transactions::get_transactions).post(transactions::create_transaction),
        )
        .route(
            "/transactions/{id}",
            put(transactions::update_transaction).delete(transactions::delete_transaction),
        )
        .route(
            "/api/timer-records",
            get(file_api::list::<TimerRecords>)
                .post(file_api::create::<TimerRecords>)
                .put(file_api::update::<TimerRecords>)
                .delete(file_api::delete::<TimerRecords>),
        )
        .route(
            "/api/transactions",
            get(file_api::list::<Transactions>)
                .post(file_api::create::<Transactions>)
                .put(file_api::update::<Transactions>)
                .delete(file_api::delete::<Transactions>),
        )
}
