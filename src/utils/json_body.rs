use actix_web::{FromRequest, HttpRequest, dev::Payload, web::Bytes};
use futures::future::LocalBoxFuture;
use serde::de::DeserializeOwned;

use crate::error::ApiError;

/// JSON body that may be left out entirely.
///
/// An empty (or all-whitespace) body yields `T::default()`. Anything else
/// must parse as `T`, otherwise the request fails with 400.
#[derive(Debug)]
pub struct OptionalJson<T>(pub T);

impl<T> OptionalJson<T> {
    pub fn into_inner(self) -> T {
        self.0
    }
}

pub fn parse_optional<T: DeserializeOwned + Default>(body: &[u8]) -> Result<T, ApiError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(T::default());
    }
    serde_json::from_slice(body)
        .map_err(|e| ApiError::bad_request(format!("Invalid JSON body: {e}")))
}

impl<T: DeserializeOwned + Default + 'static> FromRequest for OptionalJson<T> {
    type Error = actix_web::Error;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, payload: &mut Payload) -> Self::Future {
        let bytes = Bytes::from_request(req, payload);
        Box::pin(async move {
            let bytes = bytes.await?;
            Ok(OptionalJson(parse_optional(&bytes)?))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::approval::DecisionRequest;
    use actix_web::{App, HttpResponse, http::StatusCode, test, web};
    use serde_json::json;

    async fn echo(body: OptionalJson<DecisionRequest>) -> HttpResponse {
        HttpResponse::Ok().json(json!({ "remarks": body.into_inner().remarks }))
    }

    macro_rules! app {
        () => {
            test::init_service(App::new().route("/decide", web::post().to(echo))).await
        };
    }

    #[actix_web::test]
    async fn missing_body_uses_defaults() {
        let app = app!();
        let req = test::TestRequest::post().uri("/decide").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);

        let body: serde_json::Value = test::read_body_json(resp).await;
        assert_eq!(body["remarks"], serde_json::Value::Null);
    }

    #[actix_web::test]
    async fn well_formed_body_is_read() {
        let app = app!();
        let req = test::TestRequest::post()
            .uri("/decide")
            .set_json(json!({ "remarks": "Looks fine" }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);

        let body: serde_json::Value = test::read_body_json(resp).await;
        assert_eq!(body["remarks"], "Looks fine");
    }

    #[actix_web::test]
    async fn malformed_body_is_a_bad_request() {
        let app = app!();
        for payload in [r#"{"remarks": 5}"#, "not json", r#"{"remarks": "#] {
            let req = test::TestRequest::post()
                .uri("/decide")
                .insert_header(("Content-Type", "application/json"))
                .set_payload(payload)
                .to_request();
            let resp = test::call_service(&app, req).await;
            assert_eq!(resp.status(), StatusCode::BAD_REQUEST, "{payload}");

            let body: serde_json::Value = test::read_body_json(resp).await;
            assert!(
                body["message"]
                    .as_str()
                    .is_some_and(|m| m.starts_with("Invalid JSON body"))
            );
        }
    }

    #[::core::prelude::v1::test]
    fn whitespace_only_counts_as_empty() {
        let request: DecisionRequest = parse_optional(b"  \n").unwrap();
        assert!(request.remarks.is_none());
    }
}
