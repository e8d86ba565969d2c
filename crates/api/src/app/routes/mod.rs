use axum::{routing::post, Router};

pub mod attendance;
pub mod batches;
pub mod courses;
pub mod dashboard;
pub mod enrollments;
pub mod invoices;
pub mod jobs;
pub mod payments;
pub mod reports;
pub mod students;
pub mod system;

/// Router for every endpoint that runs with a request context.
pub fn router() -> Router {
    Router::new()
        .nest("/dashboard", dashboard::router())
        .nest("/students", students::router())
        .nest("/courses", courses::router())
        .nest("/batches", batches::router())
        .nest("/enrollments", enrollments::router())
        .nest("/invoices", invoices::router())
        .nest("/payments", payments::router())
        .route("/modes-of-payment", post(payments::create_mode_of_payment))
        .nest("/attendance", attendance::router())
        .nest("/jobs", jobs::router())
        .nest("/reports", reports::router())
}
