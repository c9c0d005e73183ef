//! JSON body parsing for POST, PUT and PATCH requests.

use bytes::Bytes;
use http::StatusCode;
use http_body_util::BodyExt;
use hyper::body::Body;
use serde_json::{Map, Value};

use crate::error::{BoxError, Error};
use crate::request::Request;
use crate::response::Response;

/// Reads the whole body and attaches it to `req` as JSON.
///
/// An empty body decodes to `{}`. Invalid JSON finalizes `res` with
/// `400 Invalid JSON` and returns [`Error::BadRequest`]; a failed read
/// returns [`Error::Transport`] and leaves `res` untouched.
pub(crate) async fn parse<B>(req: &mut Request, res: &Response, body: B) -> Result<(), Error>
where
    B: Body<Data = Bytes>,
    B::Error: Into<BoxError>,
{
    let raw = body
        .collect()
        .await
        .map_err(|e| Error::Transport(e.into()))?
        .to_bytes();

    match decode(&raw) {
        Ok(value) => {
            req.set_body(raw, value);
            Ok(())
        }
        Err(e) => {
            res.status(StatusCode::BAD_REQUEST).send("Invalid JSON")?;
            Err(Error::BadRequest(e))
        }
    }
}

fn decode(raw: &[u8]) -> Result<Value, serde_json::Error> {
    if raw.is_empty() {
        return Ok(Value::Object(Map::new()));
    }
    serde_json::from_slice(raw)
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::{HeaderMap, Uri};
    use http_body_util::{Full, StreamBody};
    use hyper::body::Frame;
    use serde_json::json;

    use crate::method::Method;

    fn post() -> Request {
        Request::new(Method::Post, Uri::from_static("/data"), HeaderMap::new())
    }

    #[tokio::test]
    async fn empty_body_is_empty_object() {
        let mut req = post();
        let res = Response::new();
        parse(&mut req, &res, Full::new(Bytes::new())).await.unwrap();
        assert_eq!(req.body(), Some(&json!({})));
        assert!(!res.is_sent());
    }

    #[tokio::test]
    async fn decodes_json() {
        let mut req = post();
        let res = Response::new();
        parse(&mut req, &res, Full::new(Bytes::from_static(br#"{"name":"alice","tags":[1,2]}"#)))
            .await
            .unwrap();
        assert_eq!(req.body(), Some(&json!({ "name": "alice", "tags": [1, 2] })));
    }

    #[tokio::test]
    async fn accumulates_chunks() {
        let chunks = ["{\"na", "me\":", "\"bob\"}"]
            .map(|c| Ok::<_, std::io::Error>(Frame::data(Bytes::from_static(c.as_bytes()))));
        let body = StreamBody::new(futures_util::stream::iter(chunks));

        let mut req = post();
        let res = Response::new();
        parse(&mut req, &res, body).await.unwrap();
        assert_eq!(req.body(), Some(&json!({ "name": "bob" })));
    }

    #[tokio::test]
    async fn invalid_json_finalizes_400() {
        let mut req = post();
        let res = Response::new();
        let err = parse(&mut req, &res, Full::new(Bytes::from_static(b"{not json")))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::BadRequest(_)));
        assert!(res.is_sent());
        assert_eq!(res.status_code(), StatusCode::BAD_REQUEST);
        assert!(req.body().is_none());
    }

    #[tokio::test]
    async fn read_failure_is_transport_error() {
        let chunks = vec![
            Ok(Frame::data(Bytes::from_static(b"{"))),
            Err(std::io::Error::from(std::io::ErrorKind::ConnectionReset)),
        ];
        let body = StreamBody::new(futures_util::stream::iter(chunks));

        let mut req = post();
        let res = Response::new();
        let err = parse(&mut req, &res, body).await.unwrap_err();
        assert!(matches!(err, Error::Transport(_)));
        assert!(!res.is_sent());
    }
}
