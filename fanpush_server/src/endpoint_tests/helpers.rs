use actix_web::{http::StatusCode, test, test::TestRequest, web::ServiceConfig, App};
use log::debug;

use crate::server::query_config;

/// Sends a GET request for `path` to an app set up by `configure`, and returns the status and body of the response.
pub async fn get_request<F>(path: &str, configure: F) -> Result<(StatusCode, String), String>
where F: FnOnce(&mut ServiceConfig) {
    let req = TestRequest::get().uri(path).to_request();
    let app = App::new().app_data(query_config()).configure(configure);
    let service = test::init_service(app).await;
    debug!("Making request to {path}");
    let res = test::try_call_service(&service, req).await.map_err(|e| e.to_string())?;
    let status = res.status();
    let body = test::read_body(res).await;
    Ok((status, String::from_utf8_lossy(&body).into_owned()))
}

pub fn json(body: &str) -> serde_json::Value {
    serde_json::from_str(body).expect("Response body was not JSON")
}
