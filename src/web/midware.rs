use std::sync::Arc;

use axum::{
    http::{Method, Uri},
    response::{IntoResponse, Response},
    Json,
};
use uuid::Uuid;

use crate::web::{log, Error, REQUEST_ID_HEADER};

/// Turns a `web::Error` stashed in the response extensions into the client-facing error body,
/// and logs every request.
pub async fn response_mapper(req_method: Method, uri: Uri, resp: Response) -> Response {
    let request_id = resp.headers().get(REQUEST_ID_HEADER).cloned();
    let uuid = request_id
        .as_ref()
        .and_then(|hv| hv.to_str().ok())
        .and_then(|hv| Uuid::parse_str(hv).ok())
        .unwrap_or_else(Uuid::new_v4);

    let web_error = resp.extensions().get::<Arc<Error>>().map(Arc::as_ref);
    let client_status_and_error = web_error.map(Error::status_code_and_client_error);

    let err_resp = client_status_and_error.as_ref().map(|(status, cl_err)| {
        let mut err_resp = (*status, Json(cl_err.body())).into_response();
        // The new response has to keep the propagated request id.
        if let Some(request_id) = request_id.clone() {
            err_resp.headers_mut().insert(REQUEST_ID_HEADER, request_id);
        }
        err_resp
    });

    if let (Some(er), Some((status, _))) = (web_error, &client_status_and_error) {
        if status.is_server_error() {
            tracing::error!("SERVER ERROR: {er} ID: {uuid}");
        }
    }

    log::log_request(
        uuid,
        req_method,
        uri,
        resp.status(),
        web_error,
        client_status_and_error,
    );

    err_resp.unwrap_or(resp)
}
