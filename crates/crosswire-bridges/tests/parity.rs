//! Cross-bridge conformance: every enabled bridge must present the same
//! status, normalized header view and body bytes for the same exchange.

use crosswire_core::{comparable_headers, Bridge, Courier, MatchExpression, RequestDescriptor};
use httpmock::{Method::GET, MockServer};
use std::sync::Arc;

fn enabled_bridges() -> Vec<Arc<dyn Bridge>> {
    let mut bridges: Vec<Arc<dyn Bridge>> = Vec::new();
    #[cfg(feature = "reqwest")]
    bridges.push(Arc::new(crosswire_bridges::ReqwestBridge::new().unwrap()));
    #[cfg(feature = "ureq")]
    bridges.push(Arc::new(crosswire_bridges::UreqBridge::new()));
    #[cfg(feature = "hyper")]
    bridges.push(Arc::new(crosswire_bridges::HyperBridge::new()));
    bridges
}

#[tokio::test]
async fn bridges_agree_on_the_same_exchange() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/conformance");
        then.status(200)
            .header("content-type", "application/json")
            .header("x-custom", "alpha")
            .body(r#"{"count": 3, "name": "widget"}"#);
    });

    let mut observed = Vec::new();
    for bridge in enabled_bridges() {
        let name = bridge.name();
        let courier = Courier::new(bridge);
        let request = RequestDescriptor::get(server.url("/conformance")).build().unwrap();
        let response = courier.send(request).await.unwrap();
        let body = response.body_bytes().await.unwrap().clone();
        observed.push((name, response.status(), comparable_headers(response.headers()), body));
    }

    assert!(observed.len() >= 2, "parity needs at least two enabled bridges");
    let (_, status, headers, body) = &observed[0];
    for (name, other_status, other_headers, other_body) in &observed[1..] {
        assert_eq!(other_status, status, "status differs for bridge {name}");
        assert_eq!(other_headers, headers, "header view differs for bridge {name}");
        assert_eq!(other_body, body, "body differs for bridge {name}");
    }
}

#[tokio::test]
async fn idempotent_read_executes_the_request_once() {
    let server = MockServer::start();

    for bridge in enabled_bridges() {
        let name = bridge.name();
        let path = format!("/once/{name}");
        let mock = server.mock(|when, then| {
            when.method(GET).path(&path);
            then.status(200)
                .header("content-type", "application/json")
                .body(r#"{"count": 3}"#);
        });

        let courier = Courier::new(bridge);
        let request = RequestDescriptor::get(server.url(&path)).build().unwrap();
        let response = courier.send(request).await.unwrap();

        let expressions = vec![
            MatchExpression::body_contains("count"),
            MatchExpression::json_path("$.count").unwrap().decimal_equals(3.0),
            MatchExpression::json_path("$.missing").unwrap().absent(),
        ];
        let results = courier.assert_all(&response, &expressions).await;
        for result in &results {
            assert!(result.passed(), "bridge {name}: {result}");
        }

        mock.assert_hits(1);
    }
}

#[tokio::test]
async fn error_statuses_are_plain_responses_everywhere() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/teapot");
        then.status(418).body("short and stout");
    });

    for bridge in enabled_bridges() {
        let name = bridge.name();
        let courier = Courier::new(bridge);
        let request = RequestDescriptor::get(server.url("/teapot")).build().unwrap();
        let response = courier.send(request).await.unwrap();
        assert_eq!(response.status().as_u16(), 418, "bridge {name}");
        assert_eq!(response.body_text().await.unwrap(), "short and stout", "bridge {name}");
    }
}
