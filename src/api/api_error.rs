use crate::error::Error;
use axum::http::header::WWW_AUTHENTICATE;
use axum::http::{HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};

// dyndns v3 protocol return codes. Clients parse these, they must not change.
pub(crate) const BADAUTH: &str = "badauth";
pub(crate) const NOTFQDN: &str = "notfqdn";
pub(crate) const BADREQUEST: &str = "badrequest";
pub(crate) const DNSERR: &str = "dnserr";

const BASIC_REALM: &str = r#"Basic realm="Restricted""#;

pub(crate) struct APIError(anyhow::Error);

impl APIError {
    fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self.0.downcast_ref::<Error>() {
            Some(Error::MissingCredentials | Error::AuthFailed { .. }) => {
                (StatusCode::UNAUTHORIZED, BADAUTH)
            }
            Some(Error::HostForbidden { .. }) => (StatusCode::FORBIDDEN, BADAUTH),
            Some(Error::NotFqdn) => (StatusCode::BAD_REQUEST, NOTFQDN),
            Some(
                Error::MissingAddress | Error::InvalidAddress(_) | Error::NoSpecifiedAddress(_),
            ) => (StatusCode::BAD_REQUEST, BADREQUEST),
            Some(Error::NoZoneFound(_) | Error::ZoneListing(_)) => (StatusCode::BAD_REQUEST, DNSERR),
            _ => (StatusCode::INTERNAL_SERVER_ERROR, DNSERR),
        }
    }
}

impl IntoResponse for APIError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();
        let any_err = self.0;
        if status.is_server_error() {
            tracing::error!(%status, "{any_err}");
        } else {
            tracing::warn!(%status, "{any_err}");
        }

        let mut response = (status, code).into_response();
        if status == StatusCode::UNAUTHORIZED {
            response
                .headers_mut()
                .insert(WWW_AUTHENTICATE, HeaderValue::from_static(BASIC_REALM));
        }
        response
    }
}

impl<E> From<E> for APIError
where
    E: Into<anyhow::Error>,
{
    fn from(err: E) -> Self {
        Self(err.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::AuthFailure;

    fn status_and_code(err: Error) -> (StatusCode, &'static str) {
        APIError::from(err).status_and_code()
    }

    #[test]
    fn auth_failures_are_generic() {
        for reason in [
            AuthFailure::UnknownUser,
            AuthFailure::WrongPassword,
            AuthFailure::Verification("bad hash".into()),
        ] {
            let err = Error::AuthFailed {
                username: "alice".into(),
                reason,
            };
            assert_eq!(status_and_code(err), (StatusCode::UNAUTHORIZED, BADAUTH));
        }
        assert_eq!(
            status_and_code(Error::MissingCredentials),
            (StatusCode::UNAUTHORIZED, BADAUTH)
        );
    }

    #[test]
    fn maps_error_taxonomy_to_wire_codes() {
        let forbidden = Error::HostForbidden {
            username: "alice".into(),
            hostname: "other.example.com".into(),
        };
        assert_eq!(status_and_code(forbidden), (StatusCode::FORBIDDEN, BADAUTH));
        assert_eq!(status_and_code(Error::NotFqdn), (StatusCode::BAD_REQUEST, NOTFQDN));
        assert_eq!(
            status_and_code(Error::InvalidAddress("x".into())),
            (StatusCode::BAD_REQUEST, BADREQUEST)
        );
        assert_eq!(
            status_and_code(Error::NoZoneFound("h".into())),
            (StatusCode::BAD_REQUEST, DNSERR)
        );
        assert_eq!(
            status_and_code(Error::ZoneListing(Box::new(Error::provider("p", "down")))),
            (StatusCode::BAD_REQUEST, DNSERR)
        );
        assert_eq!(
            status_and_code(Error::provider("p", "down")),
            (StatusCode::INTERNAL_SERVER_ERROR, DNSERR)
        );
    }

    #[test]
    fn unauthorized_carries_basic_challenge() {
        let response = APIError::from(Error::MissingCredentials).into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(response.headers()[WWW_AUTHENTICATE], BASIC_REALM);

        let response = APIError::from(Error::NotFqdn).into_response();
        assert!(response.headers().get(WWW_AUTHENTICATE).is_none());
    }
}
